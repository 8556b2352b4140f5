use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `gzip` codec.
pub const IDENTIFIER: &str = "gzip";

/// A wrapper to handle various versions of `gzip` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum GzipCodecConfiguration {
    /// Version 1.0.
    V1(GzipCodecConfigurationV1),
}

/// Configuration parameters for the `gzip` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GzipCodecConfigurationV1 {
    /// The compression level.
    pub level: GzipCompressionLevel,
}

impl GzipCodecConfigurationV1 {
    /// Create a new `gzip` codec configuration given a [`GzipCompressionLevel`].
    #[must_use]
    pub const fn new(level: GzipCompressionLevel) -> Self {
        Self { level }
    }
}

/// A `gzip` compression level, an integer from 0 to 9.
///
/// Compression is turned off completely when level is 0.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct GzipCompressionLevel(u32);

/// An invalid `gzip` compression level.
#[derive(Debug, thiserror::Error)]
#[error("invalid gzip compression level {0}, must be 0-9")]
pub struct GzipCompressionLevelError(u32);

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = GzipCompressionLevelError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value < 10 {
            Ok(Self(value))
        } else {
            Err(GzipCompressionLevelError(value))
        }
    }
}

impl<'de> Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

impl GzipCompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_gzip_configuration_valid() {
        let configuration: GzipCodecConfiguration =
            serde_json::from_str(r#"{"level": 1}"#).unwrap();
        let GzipCodecConfiguration::V1(configuration) = configuration;
        assert_eq!(configuration.level.as_u32(), 1);
    }

    #[test]
    fn codec_gzip_configuration_invalid() {
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level": -1}"#).is_err());
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level": 10}"#).is_err());
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level": 1, "mtime": 0}"#).is_err());
        assert!(serde_json::from_str::<GzipCodecConfiguration>("{}").is_err());
    }
}
