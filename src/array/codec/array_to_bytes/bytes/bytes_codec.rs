use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecError, CodecTraits},
        ArrayBytes, BytesRepresentation, ChunkRepresentation, DataType, RawBytes,
    },
    metadata::v3::MetadataV3,
};

use super::{
    reverse_endianness, swap_unit_size, BytesCodecConfiguration, BytesCodecConfigurationV1,
    Endianness, IDENTIFIER,
};

/// A `bytes` codec implementation.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::new(Some(Endianness::native()))
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional only for data types with single byte elements.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        let BytesCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.endian)
    }

    /// Returns the configured endianness.
    #[must_use]
    pub const fn endian(&self) -> Option<Endianness> {
        self.endian
    }

    /// Returns the size of the unit swapped when changing the endianness of `data_type`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `data_type` is variable sized, or if `endian` is unset and `data_type` has multi-byte elements.
    fn swap_unit_size(&self, data_type: &DataType) -> Result<usize, CodecError> {
        let unit_size = swap_unit_size(data_type).ok_or_else(|| {
            CodecError::UnsupportedDataType(data_type.clone(), IDENTIFIER.to_string())
        })?;
        if self.endian.is_none() && unit_size > 1 {
            return Err(CodecError::Other(format!(
                "the endian configuration of the bytes codec is required for data type {data_type}"
            )));
        }
        Ok(unit_size)
    }

    /// Check the size of `value` and convert it between native endian and the target endianness.
    fn do_encode_or_decode<'a>(
        &self,
        mut value: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        let unit_size = self.swap_unit_size(decoded_representation.data_type())?;
        let expected_size = decoded_representation.fixed_size().ok_or_else(|| {
            CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER.to_string(),
            )
        })?;
        if value.len() as u64 != expected_size {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                expected_size,
            ));
        }
        if let Some(endian) = self.endian {
            if !endian.is_native() {
                reverse_endianness(value.to_mut(), unit_size);
            }
        }
        Ok(value)
    }
}

impl CodecTraits for BytesCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        let configuration = BytesCodecConfigurationV1::new(self.endian);
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl ArrayToBytesCodecTraits for BytesCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.swap_unit_size(decoded_representation.data_type())?;
        decoded_representation
            .fixed_size()
            .map(BytesRepresentation::FixedSize)
            .ok_or_else(|| {
                CodecError::UnsupportedDataType(
                    decoded_representation.data_type().clone(),
                    IDENTIFIER.to_string(),
                )
            })
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        let bytes = bytes.into_fixed()?;
        self.do_encode_or_decode(bytes, decoded_representation)
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let bytes = self.do_encode_or_decode(bytes, decoded_representation)?;
        Ok(ArrayBytes::new_flen(bytes))
    }
}
