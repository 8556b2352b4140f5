use serde::{Deserialize, Serialize};

use super::super::v3::MetadataConfiguration;

/// Zarr V2 codec metadata: an `id` with the remaining fields as its configuration.
///
/// For example:
/// ```json
/// {
///     "id": "zstd",
///     "level": 5
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct MetadataV2 {
    id: String,
    #[serde(flatten)]
    configuration: MetadataConfiguration,
}

impl MetadataV2 {
    /// Create new codec metadata from an `id` and a `configuration`.
    #[must_use]
    pub fn new(id: &str, configuration: MetadataConfiguration) -> Self {
        Self {
            id: id.to_string(),
            configuration,
        }
    }

    /// Return the "id" key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the configuration, which includes all fields excluding the "id".
    #[must_use]
    pub fn configuration(&self) -> &MetadataConfiguration {
        &self.configuration
    }
}
