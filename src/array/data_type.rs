//! Data types.
//!
//! [`DataType`] is a closed set: the Zarr V3 core types, variable-length strings, fixed-length UTF-32 strings, and the numpy datetime/timedelta types.
//! Each data type knows its metadata, its element size, its default fill value, and how to interpret fill value metadata.

use std::num::NonZeroU32;

use half::f16;
use thiserror::Error;

use crate::metadata::v3::{
    data_type::{
        FixedLengthUtf32DataTypeConfigurationV1, NumpyTimeDataTypeConfigurationV1, NumpyTimeUnit,
        FIXED_LENGTH_UTF32, NUMPY_DATETIME64, NUMPY_TIMEDELTA64,
    },
    FillValueMetadataV3, MetadataConfiguration, MetadataV3,
};

use super::FillValue;

/// The not-a-time value of the numpy datetime and timedelta data types.
pub const NAT: i64 = i64::MIN;

/// A data type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[rustfmt::skip]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float16` IEEE 754 half-precision floating point: sign bit, 5 bits exponent, 10 bits mantissa.
    Float16,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    Float64,
    /// `string` A variable-length UTF-8 string.
    String,
    /// `fixed_length_utf32` A string of a fixed number of UTF-32 code points, zero padded.
    FixedLengthUtf32(u32),
    /// `numpy.datetime64` A signed 64-bit count of `scale_factor * unit` since the unix epoch.
    NumpyDateTime64 {
        /// The time unit.
        unit: NumpyTimeUnit,
        /// The number of units per increment.
        scale_factor: NonZeroU32,
    },
    /// `numpy.timedelta64` A signed 64-bit count of `scale_factor * unit`.
    NumpyTimeDelta64 {
        /// The time unit.
        unit: NumpyTimeUnit,
        /// The number of units per increment.
        scale_factor: NonZeroU32,
    },
}

/// The size of a data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataTypeSize {
    /// Fixed size (in bytes).
    Fixed(usize),
    /// Variable sized.
    Variable,
}

/// An unknown data type error.
#[derive(Debug, Error)]
#[error("unknown data type {_0}")]
pub struct UnknownDataTypeError(String);

/// A fill value metadata incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadataV3);

impl IncompatibleFillValueMetadataError {
    /// Create a new fill value metadata incompatibility error.
    #[must_use]
    pub fn new(data_type_name: String, fill_value_metadata: FillValueMetadataV3) -> Self {
        Self(data_type_name, fill_value_metadata)
    }
}

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new fill value incompatibility error.
    #[must_use]
    pub const fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FixedLengthUtf32(length) => write!(f, "{FIXED_LENGTH_UTF32}[{length}]"),
            Self::NumpyDateTime64 { unit, scale_factor }
            | Self::NumpyTimeDelta64 { unit, scale_factor } => {
                write!(f, "{}[{scale_factor}{unit}]", self.name())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

macro_rules! fill_value_int {
    ($fill_value:expr, $t:ty) => {
        match $fill_value {
            FillValueMetadataV3::UInt(uint) => <$t>::try_from(*uint).ok(),
            FillValueMetadataV3::Int(int) => <$t>::try_from(*int).ok(),
            _ => None,
        }
        .map(FillValue::from)
    };
}

macro_rules! fill_value_float {
    ($fill_value:expr, $t:ty, $bits:ty, $from_f64:expr) => {
        match $fill_value {
            FillValueMetadataV3::String(string) => match string.as_str() {
                "NaN" => Some(<$t>::NAN),
                "Infinity" => Some(<$t>::INFINITY),
                "-Infinity" => Some(<$t>::NEG_INFINITY),
                hex => hex
                    .strip_prefix("0x")
                    .filter(|hex| hex.len() == 2 * std::mem::size_of::<$bits>())
                    .and_then(|hex| <$bits>::from_str_radix(hex, 16).ok())
                    .map(<$t>::from_bits),
            },
            fill_value => fill_value.as_f64().map($from_f64),
        }
        .map(FillValue::from)
    };
}

macro_rules! metadata_fill_value_float {
    ($bytes:expr, $t:ty) => {{
        let value = <$t>::from_ne_bytes($bytes.try_into().ok()?);
        if value.is_nan() {
            if value.to_bits() == <$t>::NAN.to_bits() {
                FillValueMetadataV3::from("NaN")
            } else {
                FillValueMetadataV3::String(format!(
                    "0x{:0width$x}",
                    value.to_bits(),
                    width = 2 * std::mem::size_of::<$t>()
                ))
            }
        } else if value.is_infinite() {
            FillValueMetadataV3::from(if value.is_sign_positive() {
                "Infinity"
            } else {
                "-Infinity"
            })
        } else {
            FillValueMetadataV3::Float(f64::from(value))
        }
    }};
}

/// Metadata for a signed integer, preferring the unsigned representation for non-negative values.
fn metadata_fill_value_int(value: i64) -> FillValueMetadataV3 {
    u64::try_from(value).map_or(FillValueMetadataV3::Int(value), FillValueMetadataV3::UInt)
}

impl DataType {
    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::FixedLengthUtf32(_) => FIXED_LENGTH_UTF32,
            Self::NumpyDateTime64 { .. } => NUMPY_DATETIME64,
            Self::NumpyTimeDelta64 { .. } => NUMPY_TIMEDELTA64,
        }
    }

    /// Returns the metadata.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        let mut configuration = MetadataConfiguration::new();
        match self {
            Self::FixedLengthUtf32(length) => {
                configuration.insert("length_bytes".to_string(), (length * 4).into());
            }
            Self::NumpyDateTime64 { unit, scale_factor }
            | Self::NumpyTimeDelta64 { unit, scale_factor } => {
                configuration.insert("unit".to_string(), unit.to_string().into());
                configuration.insert("scale_factor".to_string(), scale_factor.get().into());
            }
            _ => return MetadataV3::new(self.name()),
        }
        MetadataV3::new_with_configuration(self.name(), configuration)
    }

    /// Returns the [`DataTypeSize`].
    #[must_use]
    pub const fn size(&self) -> DataTypeSize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => DataTypeSize::Fixed(1),
            Self::Int16 | Self::UInt16 | Self::Float16 => DataTypeSize::Fixed(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => DataTypeSize::Fixed(4),
            Self::Int64
            | Self::UInt64
            | Self::Float64
            | Self::NumpyDateTime64 { .. }
            | Self::NumpyTimeDelta64 { .. } => DataTypeSize::Fixed(8),
            Self::FixedLengthUtf32(length) => DataTypeSize::Fixed(*length as usize * 4),
            Self::String => DataTypeSize::Variable,
        }
    }

    /// Returns the size in bytes of a fixed-size data type, otherwise returns [`None`].
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match self.size() {
            DataTypeSize::Fixed(size) => Some(size),
            DataTypeSize::Variable => None,
        }
    }

    /// Returns true if the data type is a floating point type.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Create a data type from metadata.
    ///
    /// # Errors
    /// Returns [`UnknownDataTypeError`] if the name is unknown or the configuration is invalid.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, UnknownDataTypeError> {
        let unknown = || UnknownDataTypeError(metadata.to_string());
        let data_type = match metadata.name() {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float16" => Self::Float16,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "string" => Self::String,
            FIXED_LENGTH_UTF32 => {
                let configuration: FixedLengthUtf32DataTypeConfigurationV1 =
                    metadata.to_configuration().map_err(|_| unknown())?;
                if configuration.length_bytes % 4 != 0 {
                    return Err(unknown());
                }
                return Ok(Self::FixedLengthUtf32(configuration.length_bytes / 4));
            }
            NUMPY_DATETIME64 | NUMPY_TIMEDELTA64 => {
                let NumpyTimeDataTypeConfigurationV1 { unit, scale_factor } =
                    metadata.to_configuration().map_err(|_| unknown())?;
                return Ok(if metadata.name() == NUMPY_DATETIME64 {
                    Self::NumpyDateTime64 { unit, scale_factor }
                } else {
                    Self::NumpyTimeDelta64 { unit, scale_factor }
                });
            }
            _ => return Err(unknown()),
        };
        if metadata.configuration_is_none_or_empty() {
            Ok(data_type)
        } else {
            Err(unknown())
        }
    }

    /// Returns the default fill value.
    ///
    /// This is `false` for booleans, zero for numbers, an empty string for strings, and `NaT` for datetimes and timedeltas.
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        match self {
            Self::NumpyDateTime64 { .. } | Self::NumpyTimeDelta64 { .. } => FillValue::from(NAT),
            Self::String => FillValue::from(""),
            Self::Bool
            | Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::UInt8
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64
            | Self::Float16
            | Self::Float32
            | Self::Float64
            | Self::FixedLengthUtf32(_) => FillValue::new(vec![0; self.fixed_size().unwrap_or(0)]),
        }
    }

    /// Create a fill value from metadata.
    ///
    /// A null fill value is accepted for data types with a natural null:
    /// an empty string for strings, and `NaT` for datetimes and timedeltas.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadataV3,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        let fill_value_out = match self {
            Self::Bool => match fill_value {
                FillValueMetadataV3::Bool(bool) => Some(FillValue::from(*bool)),
                _ => None,
            },
            Self::Int8 => fill_value_int!(fill_value, i8),
            Self::Int16 => fill_value_int!(fill_value, i16),
            Self::Int32 => fill_value_int!(fill_value, i32),
            Self::Int64 => fill_value_int!(fill_value, i64),
            Self::UInt8 => fill_value_int!(fill_value, u8),
            Self::UInt16 => fill_value_int!(fill_value, u16),
            Self::UInt32 => fill_value_int!(fill_value, u32),
            Self::UInt64 => fill_value_int!(fill_value, u64),
            Self::Float16 => fill_value_float!(fill_value, f16, u16, f16::from_f64),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float32 => fill_value_float!(fill_value, f32, u32, |f: f64| f as f32),
            Self::Float64 => fill_value_float!(fill_value, f64, u64, |f: f64| f),
            Self::String => match fill_value {
                FillValueMetadataV3::String(string) => Some(FillValue::from(string.as_str())),
                FillValueMetadataV3::Null => Some(FillValue::from("")),
                _ => None,
            },
            Self::FixedLengthUtf32(length) => match fill_value {
                FillValueMetadataV3::String(string) => string_to_utf32(string, *length).map(FillValue::new),
                FillValueMetadataV3::Null => Some(self.default_fill_value()),
                _ => None,
            },
            Self::NumpyDateTime64 { .. } | Self::NumpyTimeDelta64 { .. } => match fill_value {
                FillValueMetadataV3::String(string) if string == "NaT" => {
                    Some(FillValue::from(NAT))
                }
                FillValueMetadataV3::Null => Some(FillValue::from(NAT)),
                fill_value => fill_value_int!(fill_value, i64),
            },
        };
        fill_value_out
            .ok_or_else(|| IncompatibleFillValueMetadataError(self.to_string(), fill_value.clone()))
    }

    /// Create a fill value from optional metadata, with an absent fill value resolving to the [default](DataType::default_fill_value).
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn resolve_fill_value(
        &self,
        fill_value: Option<&FillValueMetadataV3>,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        fill_value.map_or_else(
            || Ok(self.default_fill_value()),
            |fill_value| self.fill_value_from_metadata(fill_value),
        )
    }

    /// Return the fill value metadata of `fill_value`.
    ///
    /// Non-finite floats are written as `"NaN"`, `"Infinity"` and `"-Infinity"`, with a non-standard NaN written as a hex string.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the fill value is incompatible with the data type.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<FillValueMetadataV3, IncompatibleFillValueError> {
        let bytes = fill_value.as_ne_bytes();
        let metadata = || -> Option<FillValueMetadataV3> {
            Some(match self {
                Self::Bool => match bytes {
                    [0] => FillValueMetadataV3::Bool(false),
                    [1] => FillValueMetadataV3::Bool(true),
                    _ => return None,
                },
                Self::Int8 => metadata_fill_value_int(i8::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::Int16 => metadata_fill_value_int(i16::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::Int32 => metadata_fill_value_int(i32::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::Int64 => metadata_fill_value_int(i64::from_ne_bytes(bytes.try_into().ok()?)),
                Self::UInt8 => FillValueMetadataV3::UInt(u8::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::UInt16 => FillValueMetadataV3::UInt(u16::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::UInt32 => FillValueMetadataV3::UInt(u32::from_ne_bytes(bytes.try_into().ok()?).into()),
                Self::UInt64 => FillValueMetadataV3::UInt(u64::from_ne_bytes(bytes.try_into().ok()?)),
                Self::Float16 => metadata_fill_value_float!(bytes, f16),
                Self::Float32 => metadata_fill_value_float!(bytes, f32),
                Self::Float64 => metadata_fill_value_float!(bytes, f64),
                Self::String => FillValueMetadataV3::String(std::str::from_utf8(bytes).ok()?.to_string()),
                Self::FixedLengthUtf32(length) => {
                    if bytes.len() != *length as usize * 4 {
                        return None;
                    }
                    FillValueMetadataV3::String(utf32_to_string(bytes)?)
                }
                Self::NumpyDateTime64 { .. } | Self::NumpyTimeDelta64 { .. } => {
                    match i64::from_ne_bytes(bytes.try_into().ok()?) {
                        NAT => FillValueMetadataV3::from("NaT"),
                        value => metadata_fill_value_int(value),
                    }
                }
            })
        };
        metadata().ok_or_else(|| IncompatibleFillValueError(self.to_string(), fill_value.clone()))
    }
}

/// Encode a string as `length` native endian UTF-32 code points, zero padded.
///
/// Returns [`None`] if the string has more than `length` code points.
pub(crate) fn string_to_utf32(string: &str, length: u32) -> Option<Vec<u8>> {
    let mut bytes = Vec::with_capacity(length as usize * 4);
    for char in string.chars() {
        bytes.extend_from_slice(&u32::from(char).to_ne_bytes());
    }
    if bytes.len() > length as usize * 4 {
        return None;
    }
    bytes.resize(length as usize * 4, 0);
    Some(bytes)
}

/// Decode native endian UTF-32 code points, dropping trailing zero padding.
pub(crate) fn utf32_to_string(bytes: &[u8]) -> Option<String> {
    bytes
        .chunks_exact(4)
        .map(|code_point| u32::from_ne_bytes([code_point[0], code_point[1], code_point[2], code_point[3]]))
        .take_while(|&code_point| code_point != 0)
        .map(char::from_u32)
        .collect()
}
