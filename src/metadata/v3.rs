//! Zarr V3 metadata.
//!
//! Array metadata is stored in a `zarr.json` document. Extension points (data types, chunk grids, chunk key encodings, codecs, storage transformers) are [`MetadataV3`]: a name with an optional configuration.

/// Zarr V3 array metadata.
pub mod array;

/// Zarr V3 codec configurations.
///
/// Each module holds the identifier and the configuration of one codec.
pub mod codec {
    /// `bitround` codec metadata.
    pub mod bitround;
    /// `blosc` codec metadata.
    pub mod blosc;
    /// `bytes` codec metadata.
    pub mod bytes;
    /// `bz2` codec metadata.
    pub mod bz2;
    /// `crc32c` codec metadata.
    pub mod crc32c;
    /// `fletcher32` codec metadata.
    pub mod fletcher32;
    /// `gzip` codec metadata.
    pub mod gzip;
    /// `pcodec` codec metadata.
    pub mod pcodec;
    /// `shuffle` codec metadata.
    pub mod shuffle;
    /// `transpose` codec metadata.
    pub mod transpose;
    /// `vlen_v2` codec metadata.
    pub mod vlen_v2;
    /// `zfp` codec metadata.
    pub mod zfp;
    /// `zstd` codec metadata.
    pub mod zstd;
}

/// Zarr V3 chunk grid metadata.
pub mod chunk_grid {
    /// `regular` chunk grid metadata.
    pub mod regular;
}

/// Zarr V3 chunk key encoding metadata.
pub mod chunk_key_encoding {
    /// `default` chunk key encoding metadata.
    pub mod default;
    /// `v2` chunk key encoding metadata.
    pub mod v2;
}

/// Zarr V3 storage transformer metadata.
pub mod storage_transformer {
    /// `chunk-manifest-json` storage transformer metadata.
    pub mod chunk_manifest_json;
}

pub mod data_type;

mod fill_value;
pub use fill_value::FillValueMetadataV3;
pub(crate) use fill_value::deserialize_present;

pub use array::ArrayMetadataV3;

pub use crate::array::chunk_key_encoding::ChunkKeySeparator;

mod metadata;
pub use metadata::{ConfigurationInvalidError, MetadataConfiguration, MetadataV3};
