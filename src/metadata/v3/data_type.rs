//! Zarr V3 data type metadata.
//!
//! Core data types are identified by name only (e.g. `"int32"`).
//! The extension data types below carry a configuration.

use std::num::NonZeroU32;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The identifier for the `fixed_length_utf32` data type.
pub const FIXED_LENGTH_UTF32: &str = "fixed_length_utf32";

/// The identifier for the `numpy.datetime64` data type.
pub const NUMPY_DATETIME64: &str = "numpy.datetime64";

/// The identifier for the `numpy.timedelta64` data type.
pub const NUMPY_TIMEDELTA64: &str = "numpy.timedelta64";

/// Configuration parameters for the `fixed_length_utf32` data type.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct FixedLengthUtf32DataTypeConfigurationV1 {
    /// The length of an element in bytes. Four bytes per code point.
    pub length_bytes: u32,
}

/// The unit of a `numpy.datetime64` or `numpy.timedelta64` data type.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum NumpyTimeUnit {
    /// Years.
    #[serde(rename = "Y")]
    #[display("Y")]
    Year,
    /// Months.
    #[serde(rename = "M")]
    #[display("M")]
    Month,
    /// Weeks.
    #[serde(rename = "W")]
    #[display("W")]
    Week,
    /// Days.
    #[serde(rename = "D")]
    #[display("D")]
    Day,
    /// Hours.
    #[serde(rename = "h")]
    #[display("h")]
    Hour,
    /// Minutes.
    #[serde(rename = "m")]
    #[display("m")]
    Minute,
    /// Seconds.
    #[serde(rename = "s")]
    #[display("s")]
    Second,
    /// Milliseconds.
    #[serde(rename = "ms")]
    #[display("ms")]
    Millisecond,
    /// Microseconds.
    #[serde(rename = "us")]
    #[display("us")]
    Microsecond,
    /// Nanoseconds.
    #[serde(rename = "ns")]
    #[display("ns")]
    Nanosecond,
    /// Picoseconds.
    #[serde(rename = "ps")]
    #[display("ps")]
    Picosecond,
    /// Femtoseconds.
    #[serde(rename = "fs")]
    #[display("fs")]
    Femtosecond,
    /// Attoseconds.
    #[serde(rename = "as")]
    #[display("as")]
    Attosecond,
    /// No unit.
    #[serde(rename = "generic")]
    #[display("generic")]
    Generic,
}

impl std::str::FromStr for NumpyTimeUnit {
    type Err = String;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(unit.to_string()))
            .map_err(|_| format!("unknown time unit {unit}"))
    }
}

/// Configuration parameters for the `numpy.datetime64` and `numpy.timedelta64` data types.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct NumpyTimeDataTypeConfigurationV1 {
    /// The time unit.
    pub unit: NumpyTimeUnit,
    /// The number of units per increment.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: NonZeroU32,
}

const fn default_scale_factor() -> NonZeroU32 {
    NonZeroU32::MIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_numpy_time_configuration() {
        let configuration: NumpyTimeDataTypeConfigurationV1 =
            serde_json::from_str(r#"{"unit": "ns", "scale_factor": 10}"#).unwrap();
        assert_eq!(configuration.unit, NumpyTimeUnit::Nanosecond);
        assert_eq!(configuration.scale_factor.get(), 10);
        let configuration: NumpyTimeDataTypeConfigurationV1 =
            serde_json::from_str(r#"{"unit": "generic"}"#).unwrap();
        assert_eq!(configuration.scale_factor.get(), 1);
        assert!(serde_json::from_str::<NumpyTimeDataTypeConfigurationV1>(r#"{"unit": "ns", "scale_factor": 0}"#).is_err());
        assert!(serde_json::from_str::<NumpyTimeDataTypeConfigurationV1>(r#"{"unit": "x"}"#).is_err());
    }

    #[test]
    fn data_type_numpy_time_unit_from_str() {
        assert_eq!("M".parse::<NumpyTimeUnit>().unwrap(), NumpyTimeUnit::Month);
        assert_eq!("m".parse::<NumpyTimeUnit>().unwrap(), NumpyTimeUnit::Minute);
        assert!("minutes".parse::<NumpyTimeUnit>().is_err());
    }
}
