use std::num::NonZeroU32;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    array::{ArrayShape, ChunkShape, DataType},
    metadata::v3::{codec::bytes::Endianness, data_type::NumpyTimeUnit, ChunkKeySeparator},
};

use super::MetadataV2;

/// Zarr V2 array metadata (`.zarray`).
///
/// An example `JSON` document for a Zarr V2 array:
/// ```json
/// {
///     "chunks": [
///         1000,
///         1000
///     ],
///     "compressor": {
///         "id": "zstd",
///         "level": 5
///     },
///     "dtype": "<f8",
///     "fill_value": "NaN",
///     "filters": null,
///     "order": "C",
///     "shape": [
///         10000,
///         10000
///     ],
///     "zarr_format": 2
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV2 {
    /// The version of the storage specification. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// The length of each dimension of the array.
    pub shape: ArrayShape,
    /// The length of each dimension of a chunk of the array.
    pub chunks: ChunkShape,
    /// The data type of the array, as a numpy type string (e.g. `"<f8"`).
    pub dtype: String,
    /// The primary compression codec, or null if no compressor is to be used.
    pub compressor: Option<MetadataV2>,
    /// The default value to use for uninitialized portions of the array, or null if no fill value is to be used.
    pub fill_value: FillValueMetadataV2,
    /// Either "C" or "F", defining the layout of bytes within each chunk of the array.
    pub order: ArrayMetadataV2Order,
    /// Codec configurations applied before the compressor, or null if there are none.
    #[serde(default)]
    pub filters: Option<Vec<MetadataV2>>,
    /// The separator placed between the dimensions of a chunk key. Defaults to `.`.
    #[serde(default = "chunk_key_separator_default_zarr_v2")]
    pub dimension_separator: ChunkKeySeparator,
    /// User defined attributes, stored in the separate `.zattrs` document.
    #[serde(skip)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

const fn chunk_key_separator_default_zarr_v2() -> ChunkKeySeparator {
    ChunkKeySeparator::Dot
}

impl ArrayMetadataV2 {
    /// Create new Zarr V2 array metadata with `C` order, `.` separated chunk keys, and no filters or attributes.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunks: ChunkShape,
        dtype: String,
        fill_value: FillValueMetadataV2,
        compressor: Option<MetadataV2>,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
            shape,
            chunks,
            dtype,
            compressor,
            fill_value,
            order: ArrayMetadataV2Order::C,
            filters: None,
            dimension_separator: ChunkKeySeparator::Dot,
            attributes: serde_json::Map::default(),
        }
    }

    /// Set the filters.
    #[must_use]
    pub fn with_filters(mut self, filters: Option<Vec<MetadataV2>>) -> Self {
        self.filters = filters;
        self
    }

    /// Set the order.
    #[must_use]
    pub fn with_order(mut self, order: ArrayMetadataV2Order) -> Self {
        self.order = order;
        self
    }

    /// Set the dimension separator.
    #[must_use]
    pub fn with_dimension_separator(mut self, dimension_separator: ChunkKeySeparator) -> Self {
        self.dimension_separator = dimension_separator;
        self
    }

    /// Set the user defined attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// The layout of bytes within each chunk of the array.
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub enum ArrayMetadataV2Order {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// A Zarr V2 fill value.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadataV2 {
    /// No fill value.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
    /// A boolean.
    Bool(bool),
    /// A string.
    String(String),
}

impl<'de> Deserialize<'de> for FillValueMetadataV2 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataV2Type {
            Bool(bool),
            Number(serde_json::Number),
            String(String),
            Null,
        }
        Ok(match FillValueMetadataV2Type::deserialize(d)? {
            FillValueMetadataV2Type::String(string) => match string.as_str() {
                "NaN" => Self::NaN,
                "Infinity" => Self::Infinity,
                "-Infinity" => Self::NegInfinity,
                _ => Self::String(string),
            },
            FillValueMetadataV2Type::Number(number) => Self::Number(number),
            FillValueMetadataV2Type::Bool(bool) => Self::Bool(bool),
            FillValueMetadataV2Type::Null => Self::Null,
        })
    }
}

impl Serialize for FillValueMetadataV2 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
            Self::Bool(bool) => serializer.serialize_bool(*bool),
            Self::String(string) => serializer.serialize_str(string),
        }
    }
}

/// An unsupported Zarr V2 data type error.
#[derive(Clone, Debug, Error)]
#[error("V2 data type {_0:?} is not supported")]
pub struct DataTypeMetadataV2UnsupportedDataTypeError(String);

impl DataTypeMetadataV2UnsupportedDataTypeError {
    /// Create a new unsupported Zarr V2 data type error.
    #[must_use]
    pub fn new(dtype: String) -> Self {
        Self(dtype)
    }
}

/// Parse a Zarr V2 (numpy) data type string into a [`DataType`] and its byte order.
///
/// The byte order is [`None`] for single-byte and variable-length types (prefix `|`).
///
/// # Errors
/// Returns [`DataTypeMetadataV2UnsupportedDataTypeError`] if the data type is not supported.
pub fn data_type_metadata_v2_to_data_type(
    dtype: &str,
) -> Result<(DataType, Option<Endianness>), DataTypeMetadataV2UnsupportedDataTypeError> {
    let unsupported = || DataTypeMetadataV2UnsupportedDataTypeError(dtype.to_string());
    let (endianness, kind) = match dtype.split_at_checked(1) {
        Some(("<", kind)) => (Some(Endianness::Little), kind),
        Some((">", kind)) => (Some(Endianness::Big), kind),
        Some(("|", kind)) => (None, kind),
        _ => return Err(unsupported()),
    };
    let data_type = match kind {
        "b1" => DataType::Bool,
        "i1" => DataType::Int8,
        "i2" => DataType::Int16,
        "i4" => DataType::Int32,
        "i8" => DataType::Int64,
        "u1" => DataType::UInt8,
        "u2" => DataType::UInt16,
        "u4" => DataType::UInt32,
        "u8" => DataType::UInt64,
        "f2" => DataType::Float16,
        "f4" => DataType::Float32,
        "f8" => DataType::Float64,
        "O" => DataType::String,
        _ => {
            if let Some(length) = kind.strip_prefix('U') {
                let length = length.parse::<u32>().map_err(|_| unsupported())?;
                DataType::FixedLengthUtf32(length)
            } else if let Some(unit) = kind.strip_prefix("M8") {
                let (unit, scale_factor) = parse_time_unit(unit).ok_or_else(unsupported)?;
                DataType::NumpyDateTime64 { unit, scale_factor }
            } else if let Some(unit) = kind.strip_prefix("m8") {
                let (unit, scale_factor) = parse_time_unit(unit).ok_or_else(unsupported)?;
                DataType::NumpyTimeDelta64 { unit, scale_factor }
            } else {
                return Err(unsupported());
            }
        }
    };
    let endianness = match data_type.fixed_size() {
        Some(1) | None => None,
        Some(_) => endianness,
    };
    Ok((data_type, endianness))
}

/// Parse a numpy time unit such as `""`, `"[s]"` or `"[10ms]"`.
fn parse_time_unit(unit: &str) -> Option<(NumpyTimeUnit, NonZeroU32)> {
    if unit.is_empty() {
        return Some((NumpyTimeUnit::Generic, NonZeroU32::MIN));
    }
    let unit = unit.strip_prefix('[')?.strip_suffix(']')?;
    let split = unit
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unit.len());
    let (scale_factor, unit) = unit.split_at(split);
    let scale_factor = if scale_factor.is_empty() {
        NonZeroU32::MIN
    } else {
        scale_factor.parse().ok()?
    };
    Some((unit.parse().ok()?, scale_factor))
}

/// Convert a [`DataType`] to a Zarr V2 (numpy) data type string.
///
/// `endianness` applies to multi-byte types only, and defaults to little endian.
/// A [`DataType::String`] is represented as a python object (`|O`).
#[must_use]
pub fn data_type_to_metadata_v2(data_type: &DataType, endianness: Option<Endianness>) -> String {
    let prefix = match (data_type.fixed_size(), endianness) {
        (Some(1) | None, _) => '|',
        (Some(_), Some(Endianness::Big)) => '>',
        (Some(_), _) => '<',
    };
    let time_unit = |unit: &NumpyTimeUnit, scale_factor: &NonZeroU32| match (unit, scale_factor.get()) {
        (NumpyTimeUnit::Generic, _) => String::new(),
        (unit, 1) => format!("[{unit}]"),
        (unit, scale_factor) => format!("[{scale_factor}{unit}]"),
    };
    let kind = match data_type {
        DataType::Bool => "b1".to_string(),
        DataType::Int8 => "i1".to_string(),
        DataType::Int16 => "i2".to_string(),
        DataType::Int32 => "i4".to_string(),
        DataType::Int64 => "i8".to_string(),
        DataType::UInt8 => "u1".to_string(),
        DataType::UInt16 => "u2".to_string(),
        DataType::UInt32 => "u4".to_string(),
        DataType::UInt64 => "u8".to_string(),
        DataType::Float16 => "f2".to_string(),
        DataType::Float32 => "f4".to_string(),
        DataType::Float64 => "f8".to_string(),
        DataType::String => "O".to_string(),
        DataType::FixedLengthUtf32(length) => format!("U{length}"),
        DataType::NumpyDateTime64 { unit, scale_factor } => {
            format!("M8{}", time_unit(unit, scale_factor))
        }
        DataType::NumpyTimeDelta64 { unit, scale_factor } => {
            format!("m8{}", time_unit(unit, scale_factor))
        }
    };
    format!("{prefix}{kind}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_metadata_v2_parse() {
        let json = r#"{
            "chunks": [2, 2],
            "compressor": {"id": "zstd", "level": 1},
            "dtype": "<i4",
            "fill_value": null,
            "filters": null,
            "order": "C",
            "shape": [4, 4],
            "zarr_format": 2
        }"#;
        let metadata: ArrayMetadataV2 = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.shape, vec![4, 4]);
        assert_eq!(metadata.dimension_separator, ChunkKeySeparator::Dot);
        assert_eq!(metadata.fill_value, FillValueMetadataV2::Null);
        assert_eq!(metadata.compressor.as_ref().unwrap().id(), "zstd");
        assert!(serde_json::from_str::<ArrayMetadataV2>(&json.replace(r#""zarr_format": 2"#, r#""zarr_format": 3"#)).is_err());
    }

    #[test]
    fn fill_value_metadata_v2() {
        let parse = |json: &str| serde_json::from_str::<FillValueMetadataV2>(json).unwrap();
        assert_eq!(parse(r#""NaN""#), FillValueMetadataV2::NaN);
        assert_eq!(parse(r#""-Infinity""#), FillValueMetadataV2::NegInfinity);
        assert_eq!(parse(r#""abc""#), FillValueMetadataV2::String("abc".to_string()));
        assert_eq!(parse("true"), FillValueMetadataV2::Bool(true));
        assert_eq!(parse("0"), FillValueMetadataV2::Number(0.into()));
        assert_eq!(parse("null"), FillValueMetadataV2::Null);
        assert_eq!(
            serde_json::to_string(&FillValueMetadataV2::Infinity).unwrap(),
            r#""Infinity""#
        );
    }

    #[test]
    fn data_type_v2() {
        assert_eq!(
            data_type_metadata_v2_to_data_type("<i4").unwrap(),
            (DataType::Int32, Some(Endianness::Little))
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type(">f8").unwrap(),
            (DataType::Float64, Some(Endianness::Big))
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type("|b1").unwrap(),
            (DataType::Bool, None)
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type("|O").unwrap(),
            (DataType::String, None)
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type("<U5").unwrap(),
            (DataType::FixedLengthUtf32(5), Some(Endianness::Little))
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type("<M8[10s]").unwrap().0,
            DataType::NumpyDateTime64 {
                unit: NumpyTimeUnit::Second,
                scale_factor: NonZeroU32::new(10).unwrap()
            }
        );
        assert_eq!(
            data_type_metadata_v2_to_data_type("<m8").unwrap().0,
            DataType::NumpyTimeDelta64 {
                unit: NumpyTimeUnit::Generic,
                scale_factor: NonZeroU32::MIN
            }
        );
        assert!(data_type_metadata_v2_to_data_type("<c8").is_err());
        assert!(data_type_metadata_v2_to_data_type("i4").is_err());
        assert!(data_type_metadata_v2_to_data_type("<M8[parsec]").is_err());
    }

    #[test]
    fn data_type_v2_round_trip_strings() {
        for dtype in ["|b1", ">i2", "<u8", "<f2", "|O", "<U3", "<M8[ns]", ">m8[10ms]", "<M8"] {
            let (data_type, endianness) = data_type_metadata_v2_to_data_type(dtype).unwrap();
            assert_eq!(data_type_to_metadata_v2(&data_type, endianness), dtype);
        }
    }
}
