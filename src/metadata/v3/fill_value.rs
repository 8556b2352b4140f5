use derive_more::From;
use serde::{Deserialize, Deserializer, Serialize};

/// Fill value metadata.
///
/// The interpretation of a fill value depends on the data type it is paired with (see [`DataType::fill_value_from_metadata`](crate::array::DataType::fill_value_from_metadata)).
/// Non-finite floating point numbers, hex-encoded floats, and "not-a-time" are represented as strings:
/// `"NaN"`, `"Infinity"`, `"-Infinity"`, `"0x7fc00000"`, `"NaT"`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, From)]
#[serde(untagged)]
pub enum FillValueMetadataV3 {
    /// A null fill value.
    ///
    /// Only meaningful for data types with a natural null (strings, datetimes).
    Null,
    /// A boolean.
    Bool(bool),
    /// An unsigned integer.
    UInt(u64),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
}

impl core::fmt::Display for FillValueMetadataV3 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
    }
}

impl From<&str> for FillValueMetadataV3 {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f32> for FillValueMetadataV3 {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<i32> for FillValueMetadataV3 {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for FillValueMetadataV3 {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl FillValueMetadataV3 {
    /// Returns the value as an `f64` if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::UInt(value) => Some(*value as f64),
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Null | Self::Bool(_) | Self::String(_) => None,
        }
    }
}

/// Deserialize a fill value field that is present in the document.
///
/// Used with `#[serde(default, deserialize_with = ...)]` so that an absent field is [`None`] while an explicit `null` is `Some(FillValueMetadataV3::Null)`.
pub(crate) fn deserialize_present<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<FillValueMetadataV3>, D::Error> {
    FillValueMetadataV3::deserialize(d).map(Some)
}
