use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    config::global_config,
    metadata::v3::MetadataV3,
};

use super::{Crc32cCodecConfiguration, Crc32cCodecConfigurationV1, CHECKSUM_SIZE, IDENTIFIER};

/// A `crc32c` checksum codec implementation.
#[derive(Clone, Debug, Default)]
pub struct Crc32cCodec;

impl Crc32cCodec {
    /// Create a new `crc32c` checksum codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Create a new `crc32c` checksum codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(_configuration: &Crc32cCodecConfiguration) -> Self {
        Self {}
    }
}

impl CodecTraits for Crc32cCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &Crc32cCodecConfigurationV1 {})
            .ok()
    }
}

impl BytesToBytesCodecTraits for Crc32cCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation {
            BytesRepresentation::FixedSize(size) => {
                BytesRepresentation::FixedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::BoundedSize(size) => {
                BytesRepresentation::BoundedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::UnboundedSize => BytesRepresentation::UnboundedSize,
        }
    }

    fn encode<'a>(&self, decoded_value: RawBytes<'a>) -> Result<RawBytes<'a>, CodecError> {
        let checksum = crc32c::crc32c(&decoded_value).to_le_bytes();
        let mut encoded_value = decoded_value.into_owned();
        encoded_value.reserve_exact(CHECKSUM_SIZE);
        encoded_value.extend_from_slice(&checksum);
        Ok(encoded_value.into())
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        if encoded_value.len() < CHECKSUM_SIZE {
            return Err(CodecError::from(
                "crc32c checksum decoder expects at least a 32 bit input",
            ));
        }
        let decoded_size = encoded_value.len() - CHECKSUM_SIZE;
        if global_config().validate_checksums() {
            let checksum = crc32c::crc32c(&encoded_value[..decoded_size]).to_le_bytes();
            if checksum != encoded_value[decoded_size..] {
                return Err(CodecError::InvalidChecksum);
            }
        }
        let decoded_value = match encoded_value {
            RawBytes::Borrowed(bytes) => RawBytes::Borrowed(&bytes[..decoded_size]),
            RawBytes::Owned(mut bytes) => {
                bytes.truncate(decoded_size);
                RawBytes::Owned(bytes)
            }
        };
        Ok(decoded_value)
    }
}
