use zstd::zstd_safe::CParameter;

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    metadata::v3::MetadataV3,
};

use super::{ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel, IDENTIFIER};

/// A `zstd` codec implementation.
#[derive(Clone, Debug)]
pub struct ZstdCodec {
    compression: ZstdCompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub const fn new(compression: ZstdCompressionLevel, checksum: bool) -> Self {
        Self {
            compression,
            checksum,
        }
    }

    /// Create a new `zstd` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        let ZstdCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.level, configuration.checksum)
    }
}

impl CodecTraits for ZstdCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        let configuration = ZstdCodecConfigurationV1::new(self.compression, self.checksum);
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl BytesToBytesCodecTraits for ZstdCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .and_then(|size| usize::try_from(size).ok())
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // zstd compressBound plus the optional 4 byte content checksum
                BytesRepresentation::BoundedSize(
                    (zstd::zstd_safe::compress_bound(size) + 4) as u64,
                )
            })
    }

    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError> {
        let mut compressor = zstd::bulk::Compressor::new(self.compression.as_i32())?;
        compressor.set_parameter(CParameter::ChecksumFlag(self.checksum))?;
        Ok(compressor.compress(&decoded_value)?.into())
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        Ok(zstd::decode_all(&*encoded_value)?.into())
    }
}
