use derive_more::{Display, From};
use serde::{Deserialize, Deserializer, Serialize};

/// The identifier for the `bz2` codec.
pub const IDENTIFIER: &str = "bz2";

/// The `numcodecs` name of the `bz2` codec.
pub const IDENTIFIER_NUMCODECS: &str = "numcodecs.bz2";

/// A wrapper to handle various versions of `bz2` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum Bz2CodecConfiguration {
    /// Version 1.0 draft.
    V1(Bz2CodecConfigurationV1),
}

/// Configuration parameters for the `bz2` codec (version 1.0 draft).
///
/// This is also the configuration of the `numcodecs` `bz2` compressor, less its `id`.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct Bz2CodecConfigurationV1 {
    /// The compression level.
    pub level: Bz2CompressionLevel,
}

/// An integer from 1 to 9 controlling the compression level (the block size in units of 100k).
///
/// A level of 1 is the fastest and produces the least compression, while 9 is slowest and produces the most compression.
#[derive(Serialize, Copy, Clone, Debug, Eq, PartialEq, Display)]
pub struct Bz2CompressionLevel(u32);

/// An invalid `bz2` compression level.
#[derive(Debug, thiserror::Error)]
#[error("invalid bz2 compression level {0}, must be 1-9")]
pub struct Bz2CompressionLevelError(u32);

impl TryFrom<u32> for Bz2CompressionLevel {
    type Error = Bz2CompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Bz2CompressionLevelError(level))
        }
    }
}

impl<'de> Deserialize<'de> for Bz2CompressionLevel {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

impl Bz2CompressionLevel {
    /// The underlying integer compression level.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}
