use std::num::NonZeroU64;

use crate::{
    array::{
        codec::{ArrayToArrayCodecTraits, CodecError, CodecTraits},
        ArrayBytes, ChunkRepresentation, DataTypeSize,
    },
    metadata::v3::MetadataV3,
};

use super::{
    inverse_permutation, permute, transpose_fixed, transpose_variable,
    TransposeCodecConfiguration, TransposeCodecConfigurationV1, TransposeOrder, IDENTIFIER,
};

/// A `transpose` codec implementation.
#[derive(Clone, Debug)]
pub struct TransposeCodec {
    order: TransposeOrder,
}

impl TransposeCodec {
    /// Create a new `transpose` codec.
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }

    /// Create a new `transpose` codec from a configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &TransposeCodecConfiguration) -> Self {
        let TransposeCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.order.clone())
    }

    fn permutation(&self, dimensionality: usize) -> Result<Vec<usize>, CodecError> {
        self.order
            .permutation(dimensionality)
            .map_err(|err| CodecError::Other(err.to_string()))
    }

    fn apply<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        permutation: &[usize],
        shape: &[u64],
        representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let data_type_size = representation.data_type().size();
        bytes.validate(representation.num_elements(), data_type_size)?;
        match (bytes, data_type_size) {
            (ArrayBytes::Fixed(bytes), DataTypeSize::Fixed(size)) => Ok(ArrayBytes::new_flen(
                transpose_fixed(permutation, shape, size, &bytes)?,
            )),
            (ArrayBytes::Variable(bytes, offsets), DataTypeSize::Variable) => {
                transpose_variable(permutation, shape, &bytes, &offsets)
            }
            (_, DataTypeSize::Fixed(_)) => Err(CodecError::ExpectedFixedLengthBytes),
            (_, DataTypeSize::Variable) => Err(CodecError::ExpectedVariableLengthBytes),
        }
    }
}

impl CodecTraits for TransposeCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &TransposeCodecConfigurationV1::new(self.order.clone()),
        )
        .ok()
    }
}

impl ArrayToArrayCodecTraits for TransposeCodec {
    fn compute_encoded_representation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        let permutation = self.permutation(decoded_representation.dimensionality())?;
        let shape: Vec<NonZeroU64> = permute(decoded_representation.shape(), &permutation);
        Ok(decoded_representation.with_shape(shape))
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let permutation = self.permutation(decoded_representation.dimensionality())?;
        self.apply(
            bytes,
            &permutation,
            &decoded_representation.shape_u64(),
            decoded_representation,
        )
    }

    fn decode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let permutation = self.permutation(decoded_representation.dimensionality())?;
        let encoded_shape = permute(&decoded_representation.shape_u64(), &permutation);
        self.apply(
            bytes,
            &inverse_permutation(&permutation),
            &encoded_shape,
            decoded_representation,
        )
    }
}
