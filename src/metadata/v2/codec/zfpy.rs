use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::metadata::v3::codec::zfp::{ZfpCodecConfiguration, ZfpCodecConfigurationV1, ZfpMode};

/// The identifier for the `numcodecs` `zfpy` codec.
pub const IDENTIFIER: &str = "zfpy";

/// Configuration parameters for the `numcodecs` `zfpy` codec.
///
/// Parameters unused by `mode` are ignored, `zarr-python` writes them as -1.
/// Unknown fields such as `compression_kwargs` are tolerated.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ZfpyCodecConfigurationNumcodecs {
    /// The zfp mode.
    pub mode: ZfpyCodecConfigurationMode,
    /// The tolerance of fixed accuracy mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// The rate of fixed rate mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// The precision of fixed precision mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
}

/// The `numcodecs` `zfpy` mode.
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum ZfpyCodecConfigurationMode {
    /// Fixed rate.
    FixedRate = 2,
    /// Fixed precision.
    FixedPrecision = 3,
    /// Fixed accuracy.
    FixedAccuracy = 4,
    /// Reversible.
    Reversible = 5,
}

/// An invalid `numcodecs` `zfpy` configuration.
#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid zfpy configuration: {_0}")]
pub struct ZfpyConfigurationError(String);

/// Convert a `numcodecs` `zfpy` configuration to a `zfp` codec configuration with a header.
///
/// # Errors
/// Returns [`ZfpyConfigurationError`] if
///  - `rate` is missing for fixed rate mode,
///  - `precision` is missing or negative for fixed precision mode, or
///  - `tolerance` is missing for fixed accuracy mode.
pub fn codec_zfpy_v2_numcodecs_to_v3(
    zfpy: &ZfpyCodecConfigurationNumcodecs,
) -> Result<ZfpCodecConfiguration, ZfpyConfigurationError> {
    let missing = |parameter: &str| ZfpyConfigurationError(format!("missing {parameter}"));
    let mode = match zfpy.mode {
        ZfpyCodecConfigurationMode::FixedRate => ZfpMode::FixedRate {
            rate: zfpy.rate.ok_or_else(|| missing("rate"))?,
        },
        ZfpyCodecConfigurationMode::FixedPrecision => ZfpMode::FixedPrecision {
            precision: u32::try_from(zfpy.precision.ok_or_else(|| missing("precision"))?)
                .map_err(|_| ZfpyConfigurationError("negative precision".to_string()))?,
        },
        ZfpyCodecConfigurationMode::FixedAccuracy => ZfpMode::FixedAccuracy {
            tolerance: zfpy.tolerance.ok_or_else(|| missing("tolerance"))?,
        },
        ZfpyCodecConfigurationMode::Reversible => ZfpMode::Reversible,
    };
    Ok(ZfpCodecConfiguration::V1(ZfpCodecConfigurationV1 {
        write_header: Some(true),
        mode,
    }))
}

/// Convert a `zfp` codec configuration to a `numcodecs` `zfpy` configuration.
///
/// Returns [`None`] if the configuration does not write a header or is in expert mode.
#[must_use]
pub fn codec_zfp_v3_to_v2_numcodecs(
    zfp: &ZfpCodecConfiguration,
) -> Option<ZfpyCodecConfigurationNumcodecs> {
    let ZfpCodecConfiguration::V1(zfp) = zfp;
    if zfp.write_header != Some(true) {
        return None;
    }
    let mut zfpy = ZfpyCodecConfigurationNumcodecs {
        mode: ZfpyCodecConfigurationMode::Reversible,
        tolerance: None,
        rate: None,
        precision: None,
    };
    match zfp.mode {
        ZfpMode::Expert { .. } => return None,
        ZfpMode::FixedRate { rate } => {
            zfpy.mode = ZfpyCodecConfigurationMode::FixedRate;
            zfpy.rate = Some(rate);
        }
        ZfpMode::FixedPrecision { precision } => {
            zfpy.mode = ZfpyCodecConfigurationMode::FixedPrecision;
            zfpy.precision = Some(i32::try_from(precision).ok()?);
        }
        ZfpMode::FixedAccuracy { tolerance } => {
            zfpy.mode = ZfpyCodecConfigurationMode::FixedAccuracy;
            zfpy.tolerance = Some(tolerance);
        }
        ZfpMode::Reversible => {}
    }
    Some(zfpy)
}
