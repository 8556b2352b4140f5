use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `vlen_v2` codec.
pub const IDENTIFIER: &str = "vlen_v2";

/// The legacy name of the `vlen_v2` codec, also used as a Zarr V2 filter id.
pub const IDENTIFIER_VLEN_UTF8: &str = "vlen-utf8";

/// A wrapper to handle various versions of `vlen_v2` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum VlenV2CodecConfiguration {
    /// Version 1.0.
    V1(VlenV2CodecConfigurationV1),
}

/// Configuration parameters for the `vlen_v2` codec (version 1.0). There are none.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct VlenV2CodecConfigurationV1 {}
