use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `bitround` codec.
pub const IDENTIFIER: &str = "bitround";

/// A wrapper to handle various versions of `bitround` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum BitroundCodecConfiguration {
    /// Version 1.0.
    V1(BitroundCodecConfigurationV1),
}

/// Configuration parameters for the `bitround` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BitroundCodecConfigurationV1 {
    /// The number of mantissa bits to keep for a floating point data type.
    pub keepbits: u32,
}

impl BitroundCodecConfigurationV1 {
    /// Create a new `bitround` codec configuration.
    #[must_use]
    pub const fn new(keepbits: u32) -> Self {
        Self { keepbits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_bitround_configuration() {
        serde_json::from_str::<BitroundCodecConfiguration>(r#"{"keepbits": 2}"#).unwrap();
        assert!(serde_json::from_str::<BitroundCodecConfiguration>(r#"{"keepbits": -1}"#).is_err());
        assert!(serde_json::from_str::<BitroundCodecConfiguration>(r#"{"bits": 2}"#).is_err());
    }
}
