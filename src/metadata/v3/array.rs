use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::{deserialize_present, FillValueMetadataV3, MetadataV3};
use crate::array::ArrayShape;

/// Zarr V3 array metadata (`zarr.json`).
///
/// An example `JSON` document for a Zarr V3 array:
/// ```json
/// {
///     "zarr_format": 3,
///     "node_type": "array",
///     "shape": [10000, 1000],
///     "data_type": "float64",
///     "chunk_grid": {
///         "name": "regular",
///         "configuration": {
///             "chunk_shape": [1000, 100]
///         }
///     },
///     "chunk_key_encoding": {
///         "name": "default",
///         "configuration": {
///             "separator": "/"
///         }
///     },
///     "codecs": [
///         { "name": "bytes", "configuration": { "endian": "little" } },
///         { "name": "gzip", "configuration": { "level": 1 } }
///     ],
///     "fill_value": "NaN",
///     "attributes": {
///         "foo": 42
///     }
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV3 {
    /// The version of the storage specification. Must be `3`.
    pub zarr_format: monostate::MustBe!(3u64),
    /// The type of hierarchy node element. Must be `array`.
    pub node_type: monostate::MustBe!("array"),
    /// The length of each dimension of the array.
    pub shape: ArrayShape,
    /// The data type of the array.
    pub data_type: MetadataV3,
    /// The chunk grid of the array.
    pub chunk_grid: MetadataV3,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    pub chunk_key_encoding: MetadataV3,
    /// The element value of uninitialised portions of the array.
    ///
    /// [`None`] if the field is absent, in which case the data type default applies.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub fill_value: Option<FillValueMetadataV3>,
    /// The codecs used for encoding and decoding chunks.
    pub codecs: Vec<MetadataV3>,
    /// Optional user defined attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// An optional list of storage transformers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_transformers: Vec<MetadataV3>,
    /// An optional list of dimension names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<Option<String>>>,
}

impl ArrayMetadataV3 {
    /// Create new array metadata with no attributes, storage transformers, or dimension names.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: MetadataV3,
        chunk_grid: MetadataV3,
        chunk_key_encoding: MetadataV3,
        fill_value: FillValueMetadataV3,
        codecs: Vec<MetadataV3>,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(3u64),
            node_type: monostate::MustBe!("array"),
            shape,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value: Some(fill_value),
            codecs,
            attributes: serde_json::Map::default(),
            storage_transformers: vec![],
            dimension_names: None,
        }
    }

    /// Set the user defined attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the storage transformers.
    #[must_use]
    pub fn with_storage_transformers(mut self, storage_transformers: Vec<MetadataV3>) -> Self {
        self.storage_transformers = storage_transformers;
        self
    }

    /// Set the dimension names.
    #[must_use]
    pub fn with_dimension_names(mut self, dimension_names: Option<Vec<Option<String>>>) -> Self {
        self.dimension_names = dimension_names;
        self
    }
}
