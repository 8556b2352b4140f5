use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecTraits},
        BytesRepresentation, RawBytes,
    },
    config::global_config,
    metadata::v3::MetadataV3,
};

use super::{
    Fletcher32CodecConfiguration, Fletcher32CodecConfigurationV1, CHECKSUM_SIZE, IDENTIFIER,
};

/// A `fletcher32` checksum codec implementation.
#[derive(Clone, Debug, Default)]
pub struct Fletcher32Codec;

impl Fletcher32Codec {
    /// Create a new `fletcher32` checksum codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Create a new `fletcher32` checksum codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(_configuration: &Fletcher32CodecConfiguration) -> Self {
        Self {}
    }
}

/// HDF5 Fletcher-32 over big endian 16-bit words.
///
/// Sums are reduced every 360 words so that neither overflows.
/// A trailing odd byte is the high byte of a final word.
fn h5_checksum_fletcher32(data: &[u8]) -> u32 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;

    let words = data.chunks_exact(2);
    let remainder = words.remainder();
    for block in words.collect::<Vec<_>>().chunks(360) {
        for word in block {
            sum1 += u32::from(u16::from_be_bytes([word[0], word[1]]));
            sum2 += sum1;
        }
        sum1 = (sum1 & 0xffff) + (sum1 >> 16);
        sum2 = (sum2 & 0xffff) + (sum2 >> 16);
    }

    if let [last] = remainder {
        sum1 += u32::from(*last) << 8;
        sum2 += sum1;
        sum1 = (sum1 & 0xffff) + (sum1 >> 16);
        sum2 = (sum2 & 0xffff) + (sum2 >> 16);
    }

    // Reduce to 16 bits
    sum1 = (sum1 & 0xffff) + (sum1 >> 16);
    sum2 = (sum2 & 0xffff) + (sum2 >> 16);

    (sum2 << 16) | sum1
}

impl CodecTraits for Fletcher32Codec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &Fletcher32CodecConfigurationV1 {},
        )
        .ok()
    }
}

impl BytesToBytesCodecTraits for Fletcher32Codec {
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
        let checksum = h5_checksum_fletcher32(&decoded_value).to_le_bytes();
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
                "fletcher32 decoder expects a 32 bit input",
            ));
        }
        let decoded_size = encoded_value.len() - CHECKSUM_SIZE;
        if global_config().validate_checksums() {
            let checksum = h5_checksum_fletcher32(&encoded_value[..decoded_size]).to_le_bytes();
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
