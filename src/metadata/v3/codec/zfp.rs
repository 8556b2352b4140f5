use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `zfp` codec.
pub const IDENTIFIER: &str = "zfp";

/// A wrapper to handle various versions of `zfp` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ZfpCodecConfiguration {
    /// Version 1.0 draft.
    V1(ZfpCodecConfigurationV1),
}

/// Configuration parameters for the `zfp` codec (version 1.0 draft).
///
/// See the [zfp documentation](https://zfp.readthedocs.io/en/latest/) for the meaning of the mode parameters.
///
/// ### Example: fixed accuracy mode with a tolerance of 0.05
/// ```json
/// {
///     "mode": "fixed_accuracy",
///     "tolerance": 0.05
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ZfpCodecConfigurationV1 {
    /// Whether a full zfp header precedes the compressed stream.
    ///
    /// Data written by the `numcodecs` `zfpy` codec has a header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_header: Option<bool>,
    /// The zfp mode.
    #[serde(flatten)]
    pub mode: ZfpMode,
}

/// The zfp mode.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ZfpMode {
    /// Expert mode.
    Expert {
        /// The minimum number of compressed bits used to represent a block.
        minbits: u32,
        /// The maximum number of bits used to represent a block.
        maxbits: u32,
        /// The maximum number of bit planes encoded.
        maxprec: u32,
        /// The smallest absolute bit plane number encoded (floating point data only).
        minexp: i32,
    },
    /// Fixed rate mode.
    FixedRate {
        /// The number of compressed bits per value.
        rate: f64,
    },
    /// Fixed precision mode.
    FixedPrecision {
        /// The number of uncompressed bits per value to store.
        precision: u32,
    },
    /// Fixed accuracy mode.
    FixedAccuracy {
        /// The maximum absolute difference between decoded and input values.
        tolerance: f64,
    },
    /// Reversible (lossless) mode.
    Reversible,
}
