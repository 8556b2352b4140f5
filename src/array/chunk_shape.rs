use std::num::NonZeroU64;

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ArrayShape;

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Deref, From)]
pub struct ChunkShape(Vec<NonZeroU64>);

/// An error indicating that a chunk shape has a zero-length dimension.
#[derive(Copy, Clone, Debug, Error)]
#[error("chunk shape dimensions must be non-zero")]
pub struct NonZeroError;

impl ChunkShape {
    /// Return the number of elements.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements_u64(&self) -> u64 {
        self.0.iter().copied().map(NonZeroU64::get).product::<u64>()
    }

    /// Return the number of elements as a usize.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements_u64()).unwrap()
    }

    /// Convert the chunk shape to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        self.0.iter().map(|i| i.get()).collect()
    }
}

impl TryFrom<Vec<u64>> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        value.as_slice().try_into()
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = NonZeroError;

    fn try_from(value: &[u64]) -> Result<Self, Self::Error> {
        Ok(ChunkShape(
            value
                .iter()
                .map(|&i| NonZeroU64::new(i).ok_or(NonZeroError))
                .collect::<Result<_, _>>()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_shape() {
        let chunk_shape: ChunkShape = vec![2, 3].try_into().unwrap();
        assert_eq!(chunk_shape.num_elements_u64(), 6);
        assert_eq!(chunk_shape.to_array_shape(), vec![2, 3]);
        assert_eq!(chunk_shape.len(), 2);
        assert!(ChunkShape::try_from(vec![2, 0]).is_err());

        let scalar: ChunkShape = Vec::<u64>::new().try_into().unwrap();
        assert_eq!(scalar.num_elements_u64(), 1);
    }
}
