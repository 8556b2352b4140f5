use crate::{
    array::{
        codec::{ArrayToArrayCodecTraits, CodecError, CodecTraits},
        ArrayBytes, ChunkRepresentation, DataTypeSize,
    },
    metadata::v3::MetadataV3,
};

use super::{round_bytes, BitroundCodecConfiguration, BitroundCodecConfigurationV1, IDENTIFIER};

/// A `bitround` codec implementation.
#[derive(Clone, Debug, Default)]
pub struct BitroundCodec {
    keepbits: u32,
}

impl BitroundCodec {
    /// Create a new `bitround` codec.
    ///
    /// `keepbits` is the number of bits to round to in the floating point mantissa, or from the most significant set bit of an integer.
    #[must_use]
    pub const fn new(keepbits: u32) -> Self {
        Self { keepbits }
    }

    /// Create a new `bitround` codec from a configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BitroundCodecConfiguration) -> Self {
        let BitroundCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.keepbits)
    }
}

impl CodecTraits for BitroundCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &BitroundCodecConfigurationV1::new(self.keepbits),
        )
        .ok()
    }
}

impl ArrayToArrayCodecTraits for BitroundCodec {
    fn compute_encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        match decoded_representation.data_type().size() {
            DataTypeSize::Fixed(_) => Ok(decoded_representation.clone()),
            DataTypeSize::Variable => Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER.to_string(),
            )),
        }
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        self.compute_encoded_representation(decoded_representation)?;
        bytes.validate(
            decoded_representation.num_elements(),
            decoded_representation.data_type().size(),
        )?;
        let mut bytes = bytes.into_fixed()?;
        round_bytes(bytes.to_mut(), decoded_representation.data_type(), self.keepbits);
        Ok(ArrayBytes::Fixed(bytes))
    }

    fn decode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        _decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        Ok(bytes)
    }
}
