//! Zarr codecs.
//!
//! Array chunks are encoded using a sequence of codecs, each of which specifies a bidirectional transform (an encode transform and a decode transform).
//! A codec can map an array to an array, an array to bytes, or bytes to bytes.
//!
//! A [`CodecChain`] represents a codec sequence consisting of any number of array to array and bytes to bytes codecs, and one array to bytes codec.
//!
//! Codecs are registered as [`CodecPlugin`]s and resolved by name through [`codec_registry`].
//! An unregistered name is an explicit [`PluginCreateError::Unsupported`] error.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#chunk-encoding>.

pub mod array_to_array;
pub mod array_to_bytes;
pub mod bytes_to_bytes;

// Array to array
#[cfg(feature = "bitround")]
pub use array_to_array::bitround::BitroundCodec;
#[cfg(feature = "transpose")]
pub use array_to_array::transpose::TransposeCodec;

// Array to bytes
#[cfg(feature = "pcodec")]
pub use array_to_bytes::pcodec::PcodecCodec;
pub use array_to_bytes::{bytes::BytesCodec, codec_chain::CodecChain, vlen_v2::VlenV2Codec};
#[cfg(feature = "zfp")]
pub use array_to_bytes::{zfp::ZfpCodec, zfpy::ZfpyCodec};

// Bytes to bytes
#[cfg(feature = "blosc")]
pub use bytes_to_bytes::blosc::BloscCodec;
#[cfg(feature = "bz2")]
pub use bytes_to_bytes::bz2::Bz2Codec;
#[cfg(feature = "crc32c")]
pub use bytes_to_bytes::crc32c::Crc32cCodec;
#[cfg(feature = "fletcher32")]
pub use bytes_to_bytes::fletcher32::Fletcher32Codec;
#[cfg(feature = "gzip")]
pub use bytes_to_bytes::gzip::GzipCodec;
pub use bytes_to_bytes::shuffle::ShuffleCodec;
#[cfg(feature = "zstd")]
pub use bytes_to_bytes::zstd::ZstdCodec;

use std::{collections::BTreeMap, sync::LazyLock};

use thiserror::Error;

use crate::{
    array_subset::IncompatibleArraySubsetAndShapeError,
    byte_range::InvalidByteRangeError,
    metadata::v3::MetadataV3,
    plugin::{Plugin, PluginCreateError},
    storage::StorageError,
};

use super::{ArrayBytes, BytesRepresentation, ChunkRepresentation, DataType, RawBytes};

/// A codec plugin.
pub type CodecPlugin = Plugin<Codec>;
inventory::collect!(CodecPlugin);

static CODEC_REGISTRY: LazyLock<BTreeMap<&'static str, &'static CodecPlugin>> =
    LazyLock::new(|| {
        inventory::iter::<CodecPlugin>
            .into_iter()
            .map(|plugin| (plugin.identifier(), plugin))
            .collect()
    });

/// Returns the process-wide codec registry, mapping codec identifiers to codec plugins.
///
/// The registry is populated from the codecs enabled at compile time on first use and is read-only thereafter.
#[must_use]
pub fn codec_registry() -> &'static BTreeMap<&'static str, &'static CodecPlugin> {
    &CODEC_REGISTRY
}

/// A generic array to array, array to bytes, or bytes to bytes codec.
#[derive(Debug)]
pub enum Codec {
    /// An array to array codec.
    ArrayToArray(Box<dyn ArrayToArrayCodecTraits>),
    /// An array to bytes codec.
    ArrayToBytes(Box<dyn ArrayToBytesCodecTraits>),
    /// A bytes to bytes codec.
    BytesToBytes(Box<dyn BytesToBytesCodecTraits>),
}

impl Codec {
    /// Create a codec from metadata.
    ///
    /// The name is matched against the identifier of each registered codec, then against their aliases.
    ///
    /// # Errors
    /// Returns [`PluginCreateError`] if the metadata is invalid or not associated with a registered codec plugin.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, PluginCreateError> {
        let registry = codec_registry();
        let plugin = registry.get(metadata.name()).copied().or_else(|| {
            registry
                .values()
                .copied()
                .find(|plugin| plugin.match_name(metadata.name()))
        });
        match plugin {
            Some(plugin) => plugin.create(metadata),
            None => Err(PluginCreateError::unsupported(metadata.name(), "codec")),
        }
    }
}

/// Codec traits.
pub trait CodecTraits: Send + Sync {
    /// Create metadata.
    ///
    /// A hidden codec will return [`None`], since it will not have any associated metadata.
    fn create_metadata(&self) -> Option<MetadataV3>;
}

/// Traits for array to array codecs.
pub trait ArrayToArrayCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Returns the encoded representation of a chunk given its decoded representation.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the decoded representation is not supported by this codec.
    fn compute_encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError>;

    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `bytes` is incompatible with `decoded_representation`.
    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToArrayCodecTraits);

/// Traits for array to bytes codecs.
pub trait ArrayToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Returns the size of the encoded representation given a size of the decoded representation.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the decoded representation is not supported by this codec.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;

    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `bytes` is incompatible with `decoded_representation`.
    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToBytesCodecTraits);

/// Traits for bytes to bytes codecs.
pub trait BytesToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Returns the size of the encoded representation given a size of the decoded representation.
    fn compute_encoded_size(&self, decoded_representation: &BytesRepresentation)
        -> BytesRepresentation;

    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError>;
}

dyn_clone::clone_trait_object!(BytesToBytesCodecTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid byte range was requested.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// An invalid array subset was requested.
    #[error(transparent)]
    InvalidArraySubsetError(IncompatibleArraySubsetAndShapeError),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// The element offsets of variable length bytes are invalid.
    #[error("the element offsets of variable length array bytes are invalid")]
    InvalidVariableSizedArrayOffsets,
    /// Fixed length array bytes were expected.
    #[error("expected fixed length array bytes")]
    ExpectedFixedLengthBytes,
    /// Variable length array bytes were expected.
    #[error("expected variable length array bytes")]
    ExpectedVariableLengthBytes,
    /// A checksum is invalid.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Unsupported data type.
    #[error("unsupported data type {0} for codec {1}")]
    UnsupportedDataType(DataType, String),
    /// Other.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_registry_contents() {
        let registry = codec_registry();
        for identifier in ["bytes", "vlen_v2", "shuffle"] {
            assert!(registry.contains_key(identifier), "{identifier}");
        }
        #[cfg(feature = "gzip")]
        assert!(registry.contains_key("gzip"));
        #[cfg(feature = "crc32c")]
        assert!(registry.contains_key("crc32c"));
        #[cfg(feature = "blosc")]
        assert!(registry.contains_key("blosc"));
        #[cfg(feature = "bz2")]
        assert!(registry.contains_key("bz2"));
        #[cfg(feature = "fletcher32")]
        assert!(registry.contains_key("fletcher32"));
        #[cfg(feature = "pcodec")]
        assert!(registry.contains_key("pcodec"));
        #[cfg(feature = "zfp")]
        assert!(registry.contains_key("zfp") && registry.contains_key("numcodecs.zfpy"));
        assert!(!registry.contains_key("lzma"));
    }

    #[test]
    fn codec_from_metadata_aliases() {
        let codec = Codec::from_metadata(&MetadataV3::new("vlen-utf8")).unwrap();
        assert!(matches!(codec, Codec::ArrayToBytes(_)));
        let metadata: MetadataV3 = serde_json::from_str(
            r#"{"name": "numcodecs.shuffle", "configuration": {"elementsize": 4}}"#,
        )
        .unwrap();
        let codec = Codec::from_metadata(&metadata).unwrap();
        assert!(matches!(codec, Codec::BytesToBytes(_)));
    }

    #[test]
    fn codec_from_metadata_unsupported() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "lzma", "configuration": {"preset": 6}}"#)
                .unwrap();
        assert!(matches!(
            Codec::from_metadata(&metadata),
            Err(PluginCreateError::Unsupported { .. })
        ));
    }

    #[test]
    fn codec_from_metadata_invalid_configuration() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "bytes", "configuration": {"endian": 5}}"#).unwrap();
        assert!(matches!(
            Codec::from_metadata(&metadata),
            Err(PluginCreateError::MetadataInvalid(_))
        ));
    }
}
