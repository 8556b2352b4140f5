use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The identifier for the `chunk-manifest-json` storage transformer.
pub const IDENTIFIER: &str = "chunk-manifest-json";

/// Configuration parameters for the `chunk-manifest-json` storage transformer.
///
/// The manifest is a JSON document stored alongside the array metadata which maps chunk coordinates to byte ranges in other files.
/// Relative paths in the manifest are resolved against `base_directory`, if it is set.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ChunkManifestJsonConfiguration {
    /// The store key of the manifest, relative to the array path.
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// The directory that relative paths in the manifest are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
}

impl Default for ChunkManifestJsonConfiguration {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            base_directory: None,
        }
    }
}

fn default_manifest() -> String {
    "manifest.json".to_string()
}
