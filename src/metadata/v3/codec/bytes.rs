use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

/// Endianness. Either `big` or `little`.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little endian.
    #[display("little")]
    Little,
    /// Big endian.
    #[display("big")]
    Big,
}

const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

impl Endianness {
    /// Returns the native endianness of the CPU.
    #[must_use]
    pub const fn native() -> Endianness {
        NATIVE_ENDIAN
    }

    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// A wrapper to handle various versions of `bytes` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum BytesCodecConfiguration {
    /// Version 1.0.
    V1(BytesCodecConfigurationV1),
}

/// Configuration parameters for the `bytes` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BytesCodecConfigurationV1 {
    /// The target endianness. Required if the data type is larger than one byte.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endianness>,
}

impl BytesCodecConfigurationV1 {
    /// Create a new `bytes` codec configuration given an optional [`Endianness`].
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_bytes_configuration() {
        let configuration: BytesCodecConfiguration =
            serde_json::from_str(r#"{"endian": "big"}"#).unwrap();
        assert_eq!(
            configuration,
            BytesCodecConfigurationV1::new(Some(Endianness::Big)).into()
        );
        let configuration: BytesCodecConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(configuration, BytesCodecConfigurationV1::new(None).into());
    }

    #[test]
    fn codec_bytes_configuration_invalid() {
        assert!(serde_json::from_str::<BytesCodecConfiguration>(r#"{"endian": "middle"}"#).is_err());
        assert!(serde_json::from_str::<BytesCodecConfiguration>(r#"{"order": "big"}"#).is_err());
    }
}
