use pco::{standalone::guarantee::file_size, ChunkConfig, DeltaSpec, ModeSpec, PagingSpec};

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecError, CodecTraits},
        ArrayBytes, BytesRepresentation, ChunkRepresentation, DataType, RawBytes,
    },
    metadata::v3::MetadataV3,
};

use super::{
    PcodecCodecConfiguration, PcodecCodecConfigurationV1, PcodecDeltaSpecConfiguration,
    PcodecModeSpecConfiguration, PcodecPagingSpecConfiguration, IDENTIFIER,
};

/// A `pcodec` codec implementation.
#[derive(Clone, Debug)]
pub struct PcodecCodec {
    configuration: PcodecCodecConfigurationV1,
    chunk_config: ChunkConfig,
}

fn configuration_to_chunk_config(configuration: &PcodecCodecConfigurationV1) -> ChunkConfig {
    let mode_spec = match configuration.mode_spec {
        PcodecModeSpecConfiguration::Auto => ModeSpec::Auto,
        PcodecModeSpecConfiguration::Classic => ModeSpec::Classic,
    };
    let delta_spec = match configuration.delta_spec {
        PcodecDeltaSpecConfiguration::Auto => DeltaSpec::Auto,
        PcodecDeltaSpecConfiguration::None => DeltaSpec::None,
        PcodecDeltaSpecConfiguration::TryConsecutive => DeltaSpec::TryConsecutive(
            configuration
                .delta_encoding_order
                .map_or(0, |order| order.as_usize()),
        ),
        PcodecDeltaSpecConfiguration::TryLookback => DeltaSpec::TryLookback,
    };
    let paging_spec = match configuration.paging_spec {
        PcodecPagingSpecConfiguration::EqualPagesUpTo => {
            PagingSpec::EqualPagesUpTo(configuration.equal_pages_up_to)
        }
    };
    ChunkConfig::default()
        .with_compression_level(configuration.level.as_usize())
        .with_mode_spec(mode_spec)
        .with_delta_spec(delta_spec)
        .with_paging_spec(paging_spec)
}

impl PcodecCodec {
    /// Create a new `pcodec` codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &PcodecCodecConfiguration) -> Self {
        let PcodecCodecConfiguration::V1(configuration) = configuration;
        Self {
            configuration: configuration.clone(),
            chunk_config: configuration_to_chunk_config(configuration),
        }
    }
}

impl CodecTraits for PcodecCodec {
    fn create_metadata(&self) -> Option<MetadataV3> {
        MetadataV3::new_with_serializable_configuration(IDENTIFIER, &self.configuration).ok()
    }
}

/// Dispatch `$op` on the element type of a `pcodec` supported data type.
macro_rules! pcodec_dispatch {
    ($data_type:expr, $op:ident) => {
        match $data_type {
            DataType::UInt16 => $op!(u16),
            DataType::Int16 => $op!(i16),
            DataType::UInt32 => $op!(u32),
            DataType::Int32 => $op!(i32),
            DataType::UInt64 => $op!(u64),
            DataType::Int64
            | DataType::NumpyDateTime64 { .. }
            | DataType::NumpyTimeDelta64 { .. } => $op!(i64),
            DataType::Float16 => $op!(half::f16),
            DataType::Float32 => $op!(f32),
            DataType::Float64 => $op!(f64),
            data_type => Err(CodecError::UnsupportedDataType(
                data_type.clone(),
                IDENTIFIER.to_string(),
            )),
        }
    };
}

impl ArrayToBytesCodecTraits for PcodecCodec {
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let num_elements = usize::try_from(decoded_representation.num_elements())
            .map_err(|_| CodecError::from("the number of chunk elements exceeds usize::MAX"))?;
        let paging_spec = &self.chunk_config.paging_spec;
        macro_rules! pcodec_file_size {
            ($t:ty) => {
                file_size::<$t>(num_elements, paging_spec)
                    .map_err(|err| CodecError::Other(err.to_string()))
            };
        }
        let size = pcodec_dispatch!(decoded_representation.data_type(), pcodec_file_size)?;
        Ok(BytesRepresentation::BoundedSize(size as u64))
    }

    fn encode<'a>(
        &self,
        bytes: ArrayBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<RawBytes<'a>, CodecError> {
        let data_type = decoded_representation.data_type();
        bytes.validate(decoded_representation.num_elements(), data_type.size())?;
        let bytes = bytes.into_fixed()?;
        macro_rules! pcodec_encode {
            ($t:ty) => {
                pco::standalone::simple_compress(
                    &bytemuck::pod_collect_to_vec::<u8, $t>(&bytes),
                    &self.chunk_config,
                )
                .map_err(|err| CodecError::Other(err.to_string()))
            };
        }
        let encoded = pcodec_dispatch!(data_type, pcodec_encode)?;
        Ok(encoded.into())
    }

    fn decode<'a>(
        &self,
        bytes: RawBytes<'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'a>, CodecError> {
        let data_type = decoded_representation.data_type();
        macro_rules! pcodec_decode {
            ($t:ty) => {
                pco::standalone::simple_decompress::<$t>(&bytes)
                    .map(|elements| bytemuck::cast_slice::<$t, u8>(&elements).to_vec())
                    .map_err(|err| CodecError::Other(err.to_string()))
            };
        }
        let decoded = ArrayBytes::new_flen(pcodec_dispatch!(data_type, pcodec_decode)?);
        decoded.validate(decoded_representation.num_elements(), data_type.size())?;
        Ok(decoded)
    }
}
