use derive_more::{Display, From};
use serde::{Deserialize, Deserializer, Serialize};

/// The identifier for the `pcodec` codec.
pub const IDENTIFIER: &str = "pcodec";

/// The `numcodecs` name of the `pcodec` codec.
pub const IDENTIFIER_NUMCODECS: &str = "numcodecs.pcodec";

/// A wrapper to handle various versions of `pcodec` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum PcodecCodecConfiguration {
    /// Version 1.0 draft.
    V1(PcodecCodecConfigurationV1),
}

impl Default for PcodecCodecConfiguration {
    fn default() -> Self {
        Self::V1(PcodecCodecConfigurationV1::default())
    }
}

/// `pcodec` codec configuration parameters (version 1.0 draft).
///
/// The fields are those of the `numcodecs` `pcodec` codec, so Zarr V2 configurations are accepted unchanged.
/// Every field is optional.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
#[serde(default, deny_unknown_fields)]
pub struct PcodecCodecConfigurationV1 {
    /// A compression level from 0-12, where 12 takes the longest and compresses the most.
    pub level: PcodecCompressionLevel,
    /// The mode spec.
    pub mode_spec: PcodecModeSpecConfiguration,
    /// The delta encoding strategy.
    pub delta_spec: PcodecDeltaSpecConfiguration,
    /// The paging spec.
    pub paging_spec: PcodecPagingSpecConfiguration,
    /// The delta encoding order from 0-7 used by the `try_consecutive` delta spec.
    pub delta_encoding_order: Option<PcodecDeltaEncodingOrder>,
    /// The maximum number of values to encode per page.
    ///
    /// The default is `1 << 18`.
    pub equal_pages_up_to: usize,
}

impl Default for PcodecCodecConfigurationV1 {
    fn default() -> Self {
        Self {
            level: PcodecCompressionLevel::default(),
            mode_spec: PcodecModeSpecConfiguration::default(),
            delta_spec: PcodecDeltaSpecConfiguration::default(),
            paging_spec: PcodecPagingSpecConfiguration::default(),
            delta_encoding_order: None,
            equal_pages_up_to: 1 << 18,
        }
    }
}

/// The [`pco::ModeSpec`](https://docs.rs/pco/latest/pco/enum.ModeSpec.html).
#[derive(Serialize, Deserialize, Default, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum PcodecModeSpecConfiguration {
    /// Automatically detect the best mode.
    #[default]
    Auto,
    /// Classic mode only.
    Classic,
}

/// The [`pco::DeltaSpec`](https://docs.rs/pco/latest/pco/enum.DeltaSpec.html).
///
/// The order of `try_consecutive` is the separate `delta_encoding_order` field.
#[derive(Serialize, Deserialize, Default, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum PcodecDeltaSpecConfiguration {
    /// Automatically detect the best delta encoding.
    #[default]
    Auto,
    /// No delta encoding.
    None,
    /// Consecutive delta encoding of `delta_encoding_order`.
    TryConsecutive,
    /// Lookback delta encoding.
    TryLookback,
}

/// The [`pco::PagingSpec`](https://docs.rs/pco/latest/pco/enum.PagingSpec.html).
#[derive(Serialize, Deserialize, Default, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum PcodecPagingSpecConfiguration {
    /// Pages of equal size up to `equal_pages_up_to` values.
    #[default]
    EqualPagesUpTo,
}

/// An integer from 0 to 12 controlling the compression level.
///
/// The default is 8.
#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct PcodecCompressionLevel(u8);

impl Default for PcodecCompressionLevel {
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<usize> for PcodecCompressionLevel {
    type Error = usize;

    fn try_from(level: usize) -> Result<Self, Self::Error> {
        match u8::try_from(level) {
            Ok(level) if level <= 12 => Ok(Self(level)),
            _ => Err(level),
        }
    }
}

impl<'de> Deserialize<'de> for PcodecCompressionLevel {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(d)?;
        Self::try_from(usize::from(level)).map_err(|_| {
            serde::de::Error::custom("pcodec compression level must be between 0 and 12")
        })
    }
}

impl PcodecCompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// An integer from 0 to 7, the number of times to apply delta encoding before compressing.
#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct PcodecDeltaEncodingOrder(u8);

impl TryFrom<usize> for PcodecDeltaEncodingOrder {
    type Error = usize;

    fn try_from(order: usize) -> Result<Self, Self::Error> {
        match u8::try_from(order) {
            Ok(order) if order <= 7 => Ok(Self(order)),
            _ => Err(order),
        }
    }
}

impl<'de> Deserialize<'de> for PcodecDeltaEncodingOrder {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let order = u8::deserialize(d)?;
        Self::try_from(usize::from(order)).map_err(|_| {
            serde::de::Error::custom("pcodec delta encoding order must be between 0 and 7")
        })
    }
}

impl PcodecDeltaEncodingOrder {
    /// The underlying integer delta encoding order.
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}
