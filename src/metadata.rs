//! Zarr array metadata for both the V2 and V3 dialects, and conversion between them.
//!
//! Arrays are opened from either dialect, but operate on [`ArrayMetadataV3`] internally.
//! Zarr V2 metadata is converted with [`array_metadata_v2_to_v3`], and converted back with [`array_metadata_v3_to_v2`] when a Zarr V2 array is created.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub mod v2;
pub mod v3;

mod v2_to_v3;
mod v3_to_v2;

pub use v2::ArrayMetadataV2;
pub use v2_to_v3::{array_metadata_v2_to_v3, ArrayMetadataV2ToV3ConversionError};
pub use v3::ArrayMetadataV3;
pub use v3_to_v2::{array_metadata_v3_to_v2, ArrayMetadataV2ConversionError};

/// Zarr array metadata (V2 or V3).
#[derive(Deserialize, Serialize, Clone, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ArrayMetadata {
    /// Zarr V3 metadata.
    V3(ArrayMetadataV3),
    /// Zarr V2 metadata.
    V2(ArrayMetadataV2),
}

impl ArrayMetadata {
    /// Convert the metadata to [`ArrayMetadataV3`].
    ///
    /// # Errors
    /// Returns [`ArrayMetadataV2ToV3ConversionError`] if Zarr V2 metadata cannot be represented as Zarr V3 metadata.
    pub fn to_v3(&self) -> Result<ArrayMetadataV3, ArrayMetadataV2ToV3ConversionError> {
        match self {
            Self::V3(metadata) => Ok(metadata.clone()),
            Self::V2(metadata) => array_metadata_v2_to_v3(metadata),
        }
    }

    /// Returns the user defined attributes.
    #[must_use]
    pub fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        match self {
            Self::V3(metadata) => &metadata.attributes,
            Self::V2(metadata) => &metadata.attributes,
        }
    }
}
