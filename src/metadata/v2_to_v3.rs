use thiserror::Error;

use crate::{
    array::DataType,
    config::global_config,
    metadata::{
        v2::{
            array::{data_type_metadata_v2_to_data_type, DataTypeMetadataV2UnsupportedDataTypeError},
            codec::{
                blosc::{codec_blosc_v2_numcodecs_to_v3, BloscCodecConfigurationNumcodecs},
                zfpy::{self, codec_zfpy_v2_numcodecs_to_v3, ZfpyCodecConfigurationNumcodecs},
            },
            ArrayMetadataV2, ArrayMetadataV2Order, FillValueMetadataV2, MetadataV2,
        },
        v3::{
            chunk_grid::regular::{self, RegularChunkGridConfiguration},
            chunk_key_encoding::v2::{self as v2_key_encoding, V2ChunkKeyEncodingConfiguration},
            codec::{
                blosc,
                bytes::{self, BytesCodecConfigurationV1},
                crc32c, fletcher32, pcodec, shuffle,
                transpose::{self, TransposeCodecConfigurationV1, TransposeOrder},
                vlen_v2::{self, VlenV2CodecConfigurationV1},
                zfp,
            },
            ArrayMetadataV3, FillValueMetadataV3, MetadataV3,
        },
    },
};

/// An error converting Zarr V2 array metadata to V3.
#[derive(Debug, Error)]
pub enum ArrayMetadataV2ToV3ConversionError {
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] DataTypeMetadataV2UnsupportedDataTypeError),
    /// An unsupported fill value.
    #[error("unsupported fill value {_1:?} for data type {_0}")]
    UnsupportedFillValue(String, FillValueMetadataV2),
    /// Serialization/deserialization error.
    #[error("JSON serialization or deserialization error: {_0}")]
    SerdeError(#[from] serde_json::Error),
    /// A codec with no Zarr V3 equivalent.
    #[error("{_0}")]
    Other(String),
}

/// The attribute used by `xarray` to store dimension names in Zarr V2 arrays.
pub(crate) const ARRAY_DIMENSIONS: &str = "_ARRAY_DIMENSIONS";

/// Convert Zarr V2 array metadata to V3.
///
/// The codec chain is built from the legacy fields:
///  - `order: "F"` becomes a leading `transpose` codec reversing the dimensions,
///  - `vlen-utf8` filters become the `vlen_v2` array to bytes codec, a `fletcher32` filter is a bytes to bytes codec, other filters are array to array codecs,
///  - a `zfpy` compressor becomes the `zfp` array to bytes codec with `write_header` enabled, a `pcodec` compressor is an array to bytes codec,
///  - otherwise a `bytes` codec with the byte order of `dtype` serialises the chunk, and
///  - any other `compressor` becomes a bytes to bytes codec, with `blosc` and `crc32c` configurations converted from their `numcodecs` form.
///
/// Chunk keys use the `v2` chunk key encoding with the declared `dimension_separator`.
///
/// # Errors
/// Returns a [`ArrayMetadataV2ToV3ConversionError`] if the metadata is invalid or is not compatible with Zarr V3 metadata.
pub fn array_metadata_v2_to_v3(
    array_metadata_v2: &ArrayMetadataV2,
) -> Result<ArrayMetadataV3, ArrayMetadataV2ToV3ConversionError> {
    let (data_type, endianness) = data_type_metadata_v2_to_data_type(&array_metadata_v2.dtype)?;
    let fill_value = fill_value_v2_to_v3(&data_type, &array_metadata_v2.fill_value)?;

    let chunk_grid = MetadataV3::new_with_serializable_configuration(
        regular::IDENTIFIER,
        &RegularChunkGridConfiguration {
            chunk_shape: array_metadata_v2.chunks.clone(),
        },
    )?;
    let chunk_key_encoding = MetadataV3::new_with_serializable_configuration(
        v2_key_encoding::IDENTIFIER,
        &V2ChunkKeyEncodingConfiguration {
            separator: array_metadata_v2.dimension_separator,
        },
    )?;

    let mut codecs: Vec<MetadataV3> = vec![];

    // Array to array codecs
    if array_metadata_v2.order == ArrayMetadataV2Order::F {
        codecs.push(MetadataV3::new_with_serializable_configuration(
            transpose::IDENTIFIER,
            &TransposeCodecConfigurationV1::new(TransposeOrder::F),
        )?);
    }

    // Filters (array to array, array to bytes or bytes to bytes codecs)
    let mut has_array_to_bytes = false;
    let mut bytes_to_bytes_filters = vec![];
    for filter in array_metadata_v2.filters.iter().flatten() {
        match filter.id() {
            vlen_v2::IDENTIFIER_VLEN_UTF8 | "vlen-bytes" => {
                has_array_to_bytes = true;
                codecs.push(MetadataV3::new_with_serializable_configuration(
                    vlen_v2::IDENTIFIER,
                    &VlenV2CodecConfigurationV1 {},
                )?);
            }
            fletcher32::IDENTIFIER => {
                bytes_to_bytes_filters.push(MetadataV3::new(fletcher32::IDENTIFIER));
            }
            id => codecs.push(MetadataV3::new_with_configuration(
                id,
                filter.configuration().clone(),
            )),
        }
    }

    // Compressors that serialise the array
    let mut compressor = array_metadata_v2.compressor.as_ref();
    match compressor.map(MetadataV2::id) {
        Some(zfpy::IDENTIFIER) if !has_array_to_bytes => {
            if array_metadata_v2.order == ArrayMetadataV2Order::F {
                return Err(ArrayMetadataV2ToV3ConversionError::Other(
                    "the zfpy compressor is not supported with order F".to_string(),
                ));
            }
            let zfpy: ZfpyCodecConfigurationNumcodecs = compressor_configuration(compressor)?;
            let configuration = codec_zfpy_v2_numcodecs_to_v3(&zfpy)
                .map_err(|err| ArrayMetadataV2ToV3ConversionError::Other(err.to_string()))?;
            codecs.push(MetadataV3::new_with_serializable_configuration(
                zfp::IDENTIFIER,
                &configuration,
            )?);
            has_array_to_bytes = true;
            compressor = None;
        }
        Some(pcodec::IDENTIFIER) if !has_array_to_bytes => {
            codecs.push(MetadataV3::new_with_configuration(
                pcodec::IDENTIFIER,
                compressor_configuration(compressor)?,
            ));
            has_array_to_bytes = true;
            compressor = None;
        }
        _ => {}
    }

    // Array to bytes codec
    if !has_array_to_bytes {
        codecs.push(MetadataV3::new_with_serializable_configuration(
            bytes::IDENTIFIER,
            &BytesCodecConfigurationV1 { endian: endianness },
        )?);
    }

    codecs.extend(bytes_to_bytes_filters);

    // Compressor (bytes to bytes codec)
    if let Some(compressor) = compressor {
        let codec = match compressor.id() {
            blosc::IDENTIFIER => {
                let blosc: BloscCodecConfigurationNumcodecs =
                    compressor_configuration(Some(compressor))?;
                let element_size = data_type.fixed_size().unwrap_or(1);
                MetadataV3::new_with_serializable_configuration(
                    blosc::IDENTIFIER,
                    &codec_blosc_v2_numcodecs_to_v3(&blosc, element_size),
                )?
            }
            crc32c::IDENTIFIER => {
                let mut configuration = compressor.configuration().clone();
                // numcodecs places the checksum at the start by default
                match configuration.remove("location") {
                    Some(serde_json::Value::String(location)) if location == "end" => {}
                    location => {
                        return Err(ArrayMetadataV2ToV3ConversionError::Other(format!(
                            "the crc32c compressor location {} is not supported, it must be \"end\"",
                            location.unwrap_or(serde_json::Value::String("start".to_string()))
                        )));
                    }
                }
                MetadataV3::new_with_configuration(crc32c::IDENTIFIER, configuration)
            }
            shuffle::IDENTIFIER_NUMCODECS => MetadataV3::new_with_configuration(
                shuffle::IDENTIFIER,
                compressor.configuration().clone(),
            ),
            id => MetadataV3::new_with_configuration(id, compressor.configuration().clone()),
        };
        codecs.push(codec);
    }

    let dimension_names = array_metadata_v2
        .attributes
        .get(ARRAY_DIMENSIONS)
        .and_then(|names| serde_json::from_value::<Vec<Option<String>>>(names.clone()).ok())
        .filter(|names| names.len() == array_metadata_v2.shape.len());

    Ok(ArrayMetadataV3::new(
        array_metadata_v2.shape.clone(),
        data_type.metadata(),
        chunk_grid,
        chunk_key_encoding,
        fill_value,
        codecs,
    )
    .with_attributes(array_metadata_v2.attributes.clone())
    .with_dimension_names(dimension_names))
}

/// Deserialize the configuration of a `numcodecs` compressor.
fn compressor_configuration<T: serde::de::DeserializeOwned>(
    compressor: Option<&MetadataV2>,
) -> Result<T, ArrayMetadataV2ToV3ConversionError> {
    let configuration = compressor
        .map(|compressor| compressor.configuration().clone())
        .unwrap_or_default();
    Ok(serde_json::from_value(serde_json::Value::Object(configuration))?)
}

/// Convert a Zarr V2 fill value to V3, applying the legacy coercion rules for `data_type`.
fn fill_value_v2_to_v3(
    data_type: &DataType,
    fill_value: &FillValueMetadataV2,
) -> Result<FillValueMetadataV3, ArrayMetadataV2ToV3ConversionError> {
    Ok(match (data_type, fill_value) {
        (
            DataType::String
            | DataType::FixedLengthUtf32(_)
            | DataType::NumpyDateTime64 { .. }
            | DataType::NumpyTimeDelta64 { .. },
            FillValueMetadataV2::Null,
        ) => FillValueMetadataV3::Null,
        (DataType::Bool, FillValueMetadataV2::Null) => {
            log::warn!("Zarr V2 fill value null coerced to false for data type {data_type}");
            FillValueMetadataV3::Bool(false)
        }
        (_, FillValueMetadataV2::Null) => {
            log::warn!("Zarr V2 fill value null coerced to 0 for data type {data_type}");
            FillValueMetadataV3::UInt(0)
        }
        (DataType::Bool, FillValueMetadataV2::Number(number)) => match number.as_u64() {
            Some(0) => FillValueMetadataV3::Bool(false),
            Some(1) => FillValueMetadataV3::Bool(true),
            _ => {
                return Err(ArrayMetadataV2ToV3ConversionError::UnsupportedFillValue(
                    data_type.to_string(),
                    fill_value.clone(),
                ))
            }
        },
        (DataType::String | DataType::FixedLengthUtf32(_), FillValueMetadataV2::Number(number))
            if global_config().coerce_numeric_string_fill_value() =>
        {
            FillValueMetadataV3::String(number.to_string())
        }
        (_, FillValueMetadataV2::Number(number)) => serde_json::from_value(number.clone().into())?,
        (_, FillValueMetadataV2::NaN) => FillValueMetadataV3::from("NaN"),
        (_, FillValueMetadataV2::Infinity) => FillValueMetadataV3::from("Infinity"),
        (_, FillValueMetadataV2::NegInfinity) => FillValueMetadataV3::from("-Infinity"),
        (_, FillValueMetadataV2::Bool(bool)) => FillValueMetadataV3::Bool(*bool),
        (_, FillValueMetadataV2::String(string)) => FillValueMetadataV3::String(string.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_v2(json: &str) -> ArrayMetadataV2 {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn array_metadata_v2_to_v3_codecs() {
        let metadata = metadata_v2(
            r#"{
                "zarr_format": 2,
                "shape": [10, 20],
                "chunks": [5, 5],
                "dtype": ">f4",
                "compressor": {"id": "gzip", "level": 1},
                "fill_value": "NaN",
                "order": "F",
                "filters": [{"id": "bitround", "keepbits": 8}],
                "dimension_separator": "/"
            }"#,
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        let names: Vec<&str> = metadata.codecs.iter().map(MetadataV3::name).collect();
        assert_eq!(names, vec!["transpose", "bitround", "bytes", "gzip"]);
        assert_eq!(
            metadata.codecs[2].configuration().unwrap()["endian"],
            "big"
        );
        assert_eq!(metadata.chunk_key_encoding.name(), "v2");
        assert_eq!(
            metadata.chunk_key_encoding.configuration().unwrap()["separator"],
            "/"
        );
        assert_eq!(metadata.fill_value, Some(FillValueMetadataV3::from("NaN")));
    }

    #[test]
    fn array_metadata_v2_to_v3_strings() {
        let metadata = metadata_v2(
            r#"{
                "zarr_format": 2,
                "shape": [5],
                "chunks": [2],
                "dtype": "|O",
                "compressor": null,
                "fill_value": null,
                "order": "C",
                "filters": [{"id": "vlen-utf8"}]
            }"#,
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        let names: Vec<&str> = metadata.codecs.iter().map(MetadataV3::name).collect();
        assert_eq!(names, vec!["vlen_v2"]);
        assert_eq!(metadata.data_type.name(), "string");
        assert_eq!(metadata.fill_value, Some(FillValueMetadataV3::Null));
    }

    #[test]
    fn array_metadata_v2_to_v3_null_fill_value() {
        let json = r#"{
            "zarr_format": 2,
            "shape": [4],
            "chunks": [2],
            "dtype": "|b1",
            "compressor": null,
            "fill_value": null,
            "order": "C",
            "filters": null
        }"#;
        let metadata = array_metadata_v2_to_v3(&metadata_v2(json)).unwrap();
        assert_eq!(metadata.fill_value, Some(FillValueMetadataV3::Bool(false)));

        let metadata =
            array_metadata_v2_to_v3(&metadata_v2(&json.replace(r#""fill_value": null"#, r#""fill_value": 1"#)))
                .unwrap();
        assert_eq!(metadata.fill_value, Some(FillValueMetadataV3::Bool(true)));

        assert!(array_metadata_v2_to_v3(&metadata_v2(
            &json.replace(r#""fill_value": null"#, r#""fill_value": 2"#)
        ))
        .is_err());

        let metadata = array_metadata_v2_to_v3(&metadata_v2(&json.replace("|b1", "<i8"))).unwrap();
        assert_eq!(metadata.fill_value, Some(FillValueMetadataV3::UInt(0)));
    }

    #[test]
    fn array_metadata_v2_to_v3_dimension_names() {
        let mut metadata = metadata_v2(
            r#"{
                "zarr_format": 2,
                "shape": [4, 4],
                "chunks": [2, 2],
                "dtype": "<u2",
                "compressor": {"id": "shuffle", "elementsize": 2},
                "fill_value": 0,
                "order": "C",
                "filters": null
            }"#,
        );
        metadata.attributes.insert(
            ARRAY_DIMENSIONS.to_string(),
            serde_json::json!(["y", "x"]),
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        assert_eq!(
            metadata.dimension_names,
            Some(vec![Some("y".to_string()), Some("x".to_string())])
        );
        assert_eq!(metadata.codecs[1].name(), "shuffle");
    }

    fn float32_with_compressor(compressor: &str, order: &str) -> ArrayMetadataV2 {
        metadata_v2(&format!(
            r#"{{
                "zarr_format": 2,
                "shape": [10, 10],
                "chunks": [5, 5],
                "dtype": "<f4",
                "compressor": {compressor},
                "fill_value": 0.0,
                "order": "{order}",
                "filters": null
            }}"#
        ))
    }

    fn codec_names(metadata: &ArrayMetadataV3) -> Vec<&str> {
        metadata.codecs.iter().map(MetadataV3::name).collect()
    }

    #[test]
    fn array_metadata_v2_to_v3_blosc() {
        let metadata = float32_with_compressor(
            r#"{"id": "blosc", "cname": "zstd", "clevel": 1, "shuffle": 2, "blocksize": 0}"#,
            "F",
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        assert_eq!(codec_names(&metadata), vec!["transpose", "bytes", "blosc"]);
        assert_eq!(
            serde_json::to_value(metadata.codecs[2].configuration().unwrap()).unwrap(),
            serde_json::json!({
                "cname": "zstd",
                "clevel": 1,
                "shuffle": "bitshuffle",
                "typesize": 4,
                "blocksize": 0
            })
        );
    }

    #[test]
    fn array_metadata_v2_to_v3_array_to_bytes_compressors() {
        let metadata = float32_with_compressor(
            r#"{"id": "zfpy", "mode": 4, "tolerance": 0.01, "rate": -1, "precision": -1}"#,
            "C",
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        assert_eq!(codec_names(&metadata), vec!["zfp"]);
        let configuration = metadata.codecs[0].configuration().unwrap();
        assert_eq!(configuration["mode"], "fixed_accuracy");
        assert_eq!(configuration["tolerance"], 0.01);
        assert_eq!(configuration["write_header"], true);

        let metadata = float32_with_compressor(r#"{"id": "zfpy", "mode": 5}"#, "F");
        assert!(matches!(
            array_metadata_v2_to_v3(&metadata),
            Err(ArrayMetadataV2ToV3ConversionError::Other(_))
        ));

        let metadata = float32_with_compressor(
            r#"{"id": "pcodec", "level": 8, "mode_spec": "auto", "delta_spec": "auto", "paging_spec": "equal_pages_up_to", "delta_encoding_order": null, "equal_pages_up_to": 262144}"#,
            "C",
        );
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        assert_eq!(codec_names(&metadata), vec!["pcodec"]);
        assert_eq!(metadata.codecs[0].configuration().unwrap()["level"], 8);
    }

    #[test]
    fn array_metadata_v2_to_v3_checksums() {
        let metadata = array_metadata_v2_to_v3(&float32_with_compressor(
            r#"{"id": "bz2", "level": 9}"#,
            "C",
        ))
        .unwrap();
        assert_eq!(codec_names(&metadata), vec!["bytes", "bz2"]);

        let mut metadata = float32_with_compressor(r#"{"id": "gzip", "level": 5}"#, "C");
        metadata.filters = Some(vec![MetadataV2::new("fletcher32", serde_json::Map::default())]);
        let metadata = array_metadata_v2_to_v3(&metadata).unwrap();
        assert_eq!(codec_names(&metadata), vec!["bytes", "fletcher32", "gzip"]);

        let metadata = array_metadata_v2_to_v3(&float32_with_compressor(
            r#"{"id": "fletcher32"}"#,
            "C",
        ))
        .unwrap();
        assert_eq!(codec_names(&metadata), vec!["bytes", "fletcher32"]);
    }

    #[test]
    fn array_metadata_v2_to_v3_crc32c_location() {
        let metadata = array_metadata_v2_to_v3(&float32_with_compressor(
            r#"{"id": "crc32c", "location": "end"}"#,
            "C",
        ))
        .unwrap();
        assert_eq!(codec_names(&metadata), vec!["bytes", "crc32c"]);
        assert!(metadata.codecs[1].configuration_is_none_or_empty());

        for compressor in [r#"{"id": "crc32c", "location": "start"}"#, r#"{"id": "crc32c"}"#] {
            assert!(matches!(
                array_metadata_v2_to_v3(&float32_with_compressor(compressor, "C")),
                Err(ArrayMetadataV2ToV3ConversionError::Other(_))
            ));
        }
    }

    #[test]
    fn array_metadata_v2_to_v3_unsupported_dtype() {
        let metadata = metadata_v2(
            r#"{
                "zarr_format": 2,
                "shape": [4],
                "chunks": [2],
                "dtype": "<c16",
                "compressor": null,
                "fill_value": 0,
                "order": "C",
                "filters": null
            }"#,
        );
        assert!(matches!(
            array_metadata_v2_to_v3(&metadata),
            Err(ArrayMetadataV2ToV3ConversionError::UnsupportedDataType(_))
        ));
    }
}
