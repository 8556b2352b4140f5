use thiserror::Error;

use crate::{
    array::{DataType, IncompatibleFillValueError, IncompatibleFillValueMetadataError},
    metadata::{
        v2::{
            array::data_type_to_metadata_v2,
            codec::{blosc::codec_blosc_v3_to_v2_numcodecs, zfpy::codec_zfp_v3_to_v2_numcodecs},
            ArrayMetadataV2, ArrayMetadataV2Order, FillValueMetadataV2, MetadataV2,
        },
        v3::{
            chunk_grid::regular::{self, RegularChunkGridConfiguration},
            chunk_key_encoding::v2::{self as v2_key_encoding, V2ChunkKeyEncodingConfiguration},
            codec::{
                bitround,
                blosc::{self, BloscCodecConfiguration},
                bytes::{self, BytesCodecConfigurationV1},
                bz2, crc32c, fletcher32, pcodec, shuffle,
                transpose::{self, TransposeCodecConfigurationV1},
                vlen_v2,
                zfp::{self, ZfpCodecConfiguration},
            },
            ArrayMetadataV3, ConfigurationInvalidError, FillValueMetadataV3, MetadataV3,
        },
    },
};

use super::v2_to_v3::ARRAY_DIMENSIONS;

/// An error converting Zarr V3 array metadata to V2.
#[derive(Debug, Error)]
pub enum ArrayMetadataV2ConversionError {
    /// The data type is not supported.
    #[error("data type {_0} is not supported")]
    UnsupportedDataType(String),
    /// The chunk grid is not supported.
    #[error("chunk grid {_0} is not supported, it must be regular")]
    UnsupportedChunkGrid(String),
    /// The chunk key encoding is not supported.
    #[error("chunk key encoding {_0} is not supported, it must be v2")]
    UnsupportedChunkKeyEncoding(String),
    /// The codec chain cannot be represented with an order, filters and a compressor.
    #[error("codec {_0} is not supported at position {_1} of the codec chain")]
    UnsupportedCodec(String, usize),
    /// Storage transformers are not supported.
    #[error("storage transformers are not supported")]
    UnsupportedStorageTransformers,
    /// An invalid configuration.
    #[error(transparent)]
    ConfigurationInvalid(#[from] ConfigurationInvalidError),
    /// An invalid fill value.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// An invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
}

/// Convert Zarr V3 array metadata to V2.
///
/// Only codec chains with a Zarr V2 equivalent can be converted:
///  - an optional leading `transpose` reversing the dimensions (`order: "F"`),
///  - any number of `bitround` codecs (filters),
///  - a `bytes` codec (the byte order of `dtype`) or a `vlen_v2` codec (`|O` with a `vlen-utf8` filter),
///  - `fletcher32` codecs followed by another bytes to bytes codec (filters), and
///  - at most one bytes to bytes codec (the `compressor`).
///
/// The `pcodec` codec and the `zfp` codec with `write_header` enabled are array to bytes codecs that become the `compressor` instead.
///
/// Dimension names are stored in the `_ARRAY_DIMENSIONS` attribute.
///
/// # Errors
/// Returns an [`ArrayMetadataV2ConversionError`] if the metadata has no Zarr V2 equivalent.
pub fn array_metadata_v3_to_v2(
    array_metadata_v3: &ArrayMetadataV3,
) -> Result<ArrayMetadataV2, ArrayMetadataV2ConversionError> {
    let data_type = DataType::from_metadata(&array_metadata_v3.data_type).map_err(|_| {
        ArrayMetadataV2ConversionError::UnsupportedDataType(
            array_metadata_v3.data_type.to_string(),
        )
    })?;
    if !array_metadata_v3.storage_transformers.is_empty() {
        return Err(ArrayMetadataV2ConversionError::UnsupportedStorageTransformers);
    }

    if array_metadata_v3.chunk_grid.name() != regular::IDENTIFIER {
        return Err(ArrayMetadataV2ConversionError::UnsupportedChunkGrid(
            array_metadata_v3.chunk_grid.to_string(),
        ));
    }
    let chunk_grid: RegularChunkGridConfiguration = array_metadata_v3.chunk_grid.to_configuration()?;

    if array_metadata_v3.chunk_key_encoding.name() != v2_key_encoding::IDENTIFIER {
        return Err(ArrayMetadataV2ConversionError::UnsupportedChunkKeyEncoding(
            array_metadata_v3.chunk_key_encoding.to_string(),
        ));
    }
    let chunk_key_encoding: V2ChunkKeyEncodingConfiguration =
        array_metadata_v3.chunk_key_encoding.to_configuration()?;

    let fill_value = data_type.resolve_fill_value(array_metadata_v3.fill_value.as_ref())?;
    let fill_value = fill_value_v3_to_v2(&data_type, &data_type.metadata_fill_value(&fill_value)?);

    let dimensionality = array_metadata_v3.shape.len();
    let mut order = ArrayMetadataV2Order::C;
    let mut filters = vec![];
    let mut endianness = None;
    let mut has_array_to_bytes = false;
    let mut compressor = None;
    for (position, codec) in array_metadata_v3.codecs.iter().enumerate() {
        let unsupported =
            || ArrayMetadataV2ConversionError::UnsupportedCodec(codec.name().to_string(), position);
        match codec.name() {
            transpose::IDENTIFIER if position == 0 => {
                let configuration: TransposeCodecConfigurationV1 = codec.to_configuration()?;
                if configuration.order.is_reversal(dimensionality) {
                    order = ArrayMetadataV2Order::F;
                } else if configuration.order.permutation(dimensionality).ok()
                    != Some((0..dimensionality).collect())
                {
                    return Err(unsupported());
                }
            }
            bitround::IDENTIFIER if !has_array_to_bytes => {
                filters.push(MetadataV2::new(
                    bitround::IDENTIFIER,
                    codec.configuration().cloned().unwrap_or_default(),
                ));
            }
            bytes::IDENTIFIER if !has_array_to_bytes => {
                let configuration: BytesCodecConfigurationV1 = codec.to_configuration()?;
                endianness = configuration.endian;
                has_array_to_bytes = true;
            }
            vlen_v2::IDENTIFIER | vlen_v2::IDENTIFIER_VLEN_UTF8 if !has_array_to_bytes => {
                filters.push(MetadataV2::new(
                    vlen_v2::IDENTIFIER_VLEN_UTF8,
                    serde_json::Map::default(),
                ));
                has_array_to_bytes = true;
            }
            pcodec::IDENTIFIER | pcodec::IDENTIFIER_NUMCODECS if !has_array_to_bytes => {
                compressor = Some(MetadataV2::new(
                    pcodec::IDENTIFIER,
                    codec.configuration().cloned().unwrap_or_default(),
                ));
                has_array_to_bytes = true;
            }
            zfp::IDENTIFIER if !has_array_to_bytes => {
                let configuration: ZfpCodecConfiguration = codec.to_configuration()?;
                let zfpy = codec_zfp_v3_to_v2_numcodecs(&configuration).ok_or_else(unsupported)?;
                compressor = Some(metadata_v2("zfpy", &zfpy));
                has_array_to_bytes = true;
            }
            "numcodecs.zfpy" if !has_array_to_bytes => {
                compressor = Some(MetadataV2::new(
                    "zfpy",
                    codec.configuration().cloned().unwrap_or_default(),
                ));
                has_array_to_bytes = true;
            }
            fletcher32::IDENTIFIER | fletcher32::IDENTIFIER_NUMCODECS
                if has_array_to_bytes
                    && compressor.is_none()
                    && position + 1 < array_metadata_v3.codecs.len() =>
            {
                filters.push(MetadataV2::new(
                    fletcher32::IDENTIFIER,
                    serde_json::Map::default(),
                ));
            }
            name if has_array_to_bytes && compressor.is_none() => {
                compressor = Some(match name {
                    blosc::IDENTIFIER => {
                        let configuration: BloscCodecConfiguration = codec.to_configuration()?;
                        metadata_v2(
                            blosc::IDENTIFIER,
                            &codec_blosc_v3_to_v2_numcodecs(&configuration),
                        )
                    }
                    crc32c::IDENTIFIER => {
                        let mut configuration = serde_json::Map::default();
                        configuration.insert("location".to_string(), "end".into());
                        MetadataV2::new(crc32c::IDENTIFIER, configuration)
                    }
                    _ => {
                        let id = match name {
                            shuffle::IDENTIFIER_NUMCODECS => shuffle::IDENTIFIER,
                            bz2::IDENTIFIER_NUMCODECS => bz2::IDENTIFIER,
                            fletcher32::IDENTIFIER_NUMCODECS => fletcher32::IDENTIFIER,
                            name => name,
                        };
                        MetadataV2::new(id, codec.configuration().cloned().unwrap_or_default())
                    }
                });
            }
            _ => return Err(unsupported()),
        }
    }

    let mut attributes = array_metadata_v3.attributes.clone();
    if let Some(dimension_names) = &array_metadata_v3.dimension_names {
        if !attributes.contains_key(ARRAY_DIMENSIONS) {
            attributes.insert(
                ARRAY_DIMENSIONS.to_string(),
                serde_json::Value::from(
                    dimension_names
                        .iter()
                        .map(|name| name.clone().map_or(serde_json::Value::Null, Into::into))
                        .collect::<Vec<_>>(),
                ),
            );
        }
    }

    Ok(ArrayMetadataV2::new(
        array_metadata_v3.shape.clone(),
        chunk_grid.chunk_shape,
        data_type_to_metadata_v2(&data_type, endianness),
        fill_value,
        compressor,
    )
    .with_order(order)
    .with_filters(if filters.is_empty() { None } else { Some(filters) })
    .with_dimension_separator(chunk_key_encoding.separator)
    .with_attributes(attributes))
}

/// Zarr V2 codec metadata with a serializable `configuration`.
fn metadata_v2<T: serde::Serialize>(id: &str, configuration: &T) -> MetadataV2 {
    let configuration = match serde_json::to_value(configuration) {
        Ok(serde_json::Value::Object(configuration)) => configuration,
        _ => serde_json::Map::default(),
    };
    MetadataV2::new(id, configuration)
}

/// Convert a Zarr V3 fill value to V2.
fn fill_value_v3_to_v2(data_type: &DataType, fill_value: &FillValueMetadataV3) -> FillValueMetadataV2 {
    match fill_value {
        FillValueMetadataV3::Null => FillValueMetadataV2::Null,
        FillValueMetadataV3::Bool(bool) => FillValueMetadataV2::Bool(*bool),
        FillValueMetadataV3::UInt(uint) => FillValueMetadataV2::Number((*uint).into()),
        FillValueMetadataV3::Int(int) => FillValueMetadataV2::Number((*int).into()),
        FillValueMetadataV3::Float(float) => serde_json::Number::from_f64(*float)
            .map_or(FillValueMetadataV2::NaN, FillValueMetadataV2::Number),
        FillValueMetadataV3::String(string) => match (data_type, string.as_str()) {
            (_, "NaN") if data_type.is_float() => FillValueMetadataV2::NaN,
            (_, "Infinity") if data_type.is_float() => FillValueMetadataV2::Infinity,
            (_, "-Infinity") if data_type.is_float() => FillValueMetadataV2::NegInfinity,
            (DataType::NumpyDateTime64 { .. } | DataType::NumpyTimeDelta64 { .. }, "NaT") => {
                FillValueMetadataV2::Number(i64::MIN.into())
            }
            _ => FillValueMetadataV2::String(string.clone()),
        },
    }
}
