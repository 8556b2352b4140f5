use std::num::NonZeroUsize;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The identifier for the `shuffle` codec.
pub const IDENTIFIER: &str = "shuffle";

/// The name of the `shuffle` codec in the `numcodecs` namespace, also used as a Zarr V2 codec id.
pub const IDENTIFIER_NUMCODECS: &str = "numcodecs.shuffle";

/// A wrapper to handle various versions of `shuffle` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ShuffleCodecConfiguration {
    /// Version 1.0.
    V1(ShuffleCodecConfigurationV1),
}

/// Configuration parameters for the `shuffle` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ShuffleCodecConfigurationV1 {
    /// The size in bytes of the elements whose bytes are grouped together.
    pub elementsize: NonZeroUsize,
}

impl ShuffleCodecConfigurationV1 {
    /// Create a new `shuffle` codec configuration.
    #[must_use]
    pub const fn new(elementsize: NonZeroUsize) -> Self {
        Self { elementsize }
    }
}
