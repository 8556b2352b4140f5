use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `fletcher32` codec.
pub const IDENTIFIER: &str = "fletcher32";

/// The `numcodecs` name of the `fletcher32` codec.
pub const IDENTIFIER_NUMCODECS: &str = "numcodecs.fletcher32";

/// A wrapper to handle various versions of `fletcher32` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum Fletcher32CodecConfiguration {
    /// Version 1.0 draft.
    V1(Fletcher32CodecConfigurationV1),
}

/// Configuration parameters for the `fletcher32` codec (version 1.0 draft). There are none.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct Fletcher32CodecConfigurationV1 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_fletcher32_configuration() {
        serde_json::from_str::<Fletcher32CodecConfiguration>("{}").unwrap();
        assert!(serde_json::from_str::<Fletcher32CodecConfiguration>(r#"{"size": 4}"#).is_err());
    }
}
