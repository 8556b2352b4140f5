use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

/// A wrapper to handle various versions of `zstd` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ZstdCodecConfiguration {
    /// Version 1.0.
    V1(ZstdCodecConfigurationV1),
}

/// Configuration parameters for the `zstd` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ZstdCodecConfigurationV1 {
    /// The compression level.
    pub level: ZstdCompressionLevel,
    /// Whether to store a checksum when writing that will be verified when reading.
    #[serde(default)]
    pub checksum: bool,
}

impl ZstdCodecConfigurationV1 {
    /// Create a new `zstd` codec configuration.
    #[must_use]
    pub const fn new(level: ZstdCompressionLevel, checksum: bool) -> Self {
        Self { level, checksum }
    }
}

/// A `zstd` compression level, an integer from -131072 to 22.
///
/// A value of 0 indicates to use the default compression level.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct ZstdCompressionLevel(i32);

impl<'de> Deserialize<'de> for ZstdCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = i32::deserialize(d)?;
        if (-131_072..=22).contains(&level) {
            Ok(Self(level))
        } else {
            Err(serde::de::Error::custom(
                "zstd compression level must be an integer between -131072 and 22",
            ))
        }
    }
}

impl From<i32> for ZstdCompressionLevel {
    fn from(level: i32) -> Self {
        Self(level.clamp(-131_072, 22))
    }
}

impl ZstdCompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_zstd_configuration() {
        let configuration: ZstdCodecConfigurationV1 =
            serde_json::from_str(r#"{"level": 22, "checksum": true}"#).unwrap();
        assert_eq!(configuration.level.as_i32(), 22);
        assert!(configuration.checksum);
        assert!(serde_json::from_str::<ZstdCodecConfiguration>(r#"{"level": 23}"#).is_err());
        assert!(serde_json::from_str::<ZstdCodecConfiguration>(r#"{"level": 1, "threads": 2}"#).is_err());
    }
}
