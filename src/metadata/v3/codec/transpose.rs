use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The identifier for the `transpose` codec.
pub const IDENTIFIER: &str = "transpose";

/// A wrapper to handle various versions of `transpose` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum TransposeCodecConfiguration {
    /// Version 1.0.
    V1(TransposeCodecConfigurationV1),
}

/// Configuration parameters for the `transpose` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct TransposeCodecConfigurationV1 {
    /// The permutation applied to the dimensions of a chunk.
    pub order: TransposeOrder,
}

impl TransposeCodecConfigurationV1 {
    /// Create a new `transpose` codec configuration given a [`TransposeOrder`].
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }
}

/// The permutation applied to the dimensions of a chunk.
///
/// Serialised as an array of integers specifying a permutation of `0..n`.
/// The legacy strings `"C"` (identity) and `"F"` (reversal) are accepted when deserialising, and resolved against the chunk dimensionality when the codec is applied.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TransposeOrder {
    /// An explicit permutation.
    Permutation(Vec<usize>),
    /// The identity permutation.
    C,
    /// The reversal permutation.
    F,
}

/// An invalid permutation order error.
#[derive(Clone, Debug, Error, From)]
#[error("permutation order {0:?} is invalid, it must be a permutation of 0, 1, ..., n-1 where n is the number of dimensions")]
pub struct InvalidPermutationError(Vec<usize>);

impl TransposeOrder {
    /// Create a new [`TransposeOrder`].
    ///
    /// # Errors
    /// Returns [`InvalidPermutationError`] if `order` is not a permutation.
    pub fn new(order: &[usize]) -> Result<Self, InvalidPermutationError> {
        if validate_permutation(order) {
            Ok(Self::Permutation(order.to_vec()))
        } else {
            Err(InvalidPermutationError::from(order.to_vec()))
        }
    }

    /// Resolve the order to a permutation for a chunk with `dimensionality` dimensions.
    ///
    /// # Errors
    /// Returns [`InvalidPermutationError`] if an explicit permutation has the wrong length.
    pub fn permutation(&self, dimensionality: usize) -> Result<Vec<usize>, InvalidPermutationError> {
        match self {
            Self::Permutation(order) if order.len() == dimensionality => Ok(order.clone()),
            Self::Permutation(order) => Err(InvalidPermutationError(order.clone())),
            Self::C => Ok((0..dimensionality).collect()),
            Self::F => Ok((0..dimensionality).rev().collect()),
        }
    }

    /// Returns true if the order reverses the dimensions of a chunk with `dimensionality` dimensions.
    #[must_use]
    pub fn is_reversal(&self, dimensionality: usize) -> bool {
        self.permutation(dimensionality)
            .is_ok_and(|order| order.into_iter().eq((0..dimensionality).rev()))
    }
}

impl Serialize for TransposeOrder {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Permutation(order) => order.serialize(s),
            Self::C => s.serialize_str("C"),
            Self::F => s.serialize_str("F"),
        }
    }
}

impl<'de> Deserialize<'de> for TransposeOrder {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum TransposeOrderIntermediate {
            Permutation(Vec<usize>),
            String(String),
        }
        match TransposeOrderIntermediate::deserialize(d)? {
            TransposeOrderIntermediate::Permutation(order) if validate_permutation(&order) => {
                Ok(Self::Permutation(order))
            }
            TransposeOrderIntermediate::String(order) if order == "C" => Ok(Self::C),
            TransposeOrderIntermediate::String(order) if order == "F" => Ok(Self::F),
            _ => Err(serde::de::Error::custom(
                "transpose order must be a permutation of 0, 1, ..., n-1 where n is the number of dimensions",
            )),
        }
    }
}

fn validate_permutation(permutation: &[usize]) -> bool {
    let mut sorted = permutation.to_vec();
    sorted.sort_unstable();
    sorted.into_iter().eq(0..permutation.len())
}
