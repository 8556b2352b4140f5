use std::num::NonZeroU64;

use derive_more::Display;

use super::{ArrayShape, ChunkShape, DataType, DataTypeSize, FillValue};

/// The shape, data type, and fill value of a chunk.
///
/// This is the decoded representation seen by the array to array and array to bytes codecs of a codec chain.
#[derive(Clone, Debug, PartialEq, Eq, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ChunkRepresentation {
    shape: Vec<NonZeroU64>,
    data_type: DataType,
    fill_value: FillValue,
}

impl ChunkRepresentation {
    /// Create a new [`ChunkRepresentation`].
    #[must_use]
    pub fn new(chunk_shape: &ChunkShape, data_type: DataType, fill_value: FillValue) -> Self {
        Self {
            shape: chunk_shape.to_vec(),
            data_type,
            fill_value,
        }
    }

    /// Return the shape of the chunk.
    #[must_use]
    pub fn shape(&self) -> &[NonZeroU64] {
        &self.shape
    }

    /// Return the shape as an [`ArrayShape`] ([`Vec<u64>`]).
    #[must_use]
    pub fn shape_u64(&self) -> ArrayShape {
        self.shape.iter().map(|i| i.get()).collect()
    }

    /// Return the dimensionality of the chunk.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the data type of the chunk.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the chunk.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the number of elements in the chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().map(|i| i.get()).product()
    }

    /// Return the size in bytes of the decoded chunk, or [`None`] for a variable size data type.
    #[must_use]
    pub fn fixed_size(&self) -> Option<u64> {
        match self.data_type.size() {
            DataTypeSize::Fixed(size) => Some(self.num_elements() * size as u64),
            DataTypeSize::Variable => None,
        }
    }

    /// Return a representation with the same data type and fill value, and a new shape.
    #[must_use]
    pub fn with_shape(&self, shape: Vec<NonZeroU64>) -> Self {
        Self {
            shape,
            data_type: self.data_type.clone(),
            fill_value: self.fill_value.clone(),
        }
    }
}

/// The size of encoded bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum BytesRepresentation {
    /// The size is known.
    #[display("fixed size: {_0}")]
    FixedSize(u64),
    /// The size has a known upper bound.
    #[display("bounded size: {_0}")]
    BoundedSize(u64),
    /// The size is unknown until the bytes are produced.
    #[display("unbounded size")]
    UnboundedSize,
}

impl BytesRepresentation {
    /// Return the fixed or bounded size, or [`None`] if the size is unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_representation() {
        let representation = ChunkRepresentation::new(
            &vec![2, 3].try_into().unwrap(),
            DataType::UInt16,
            FillValue::from(0u16),
        );
        assert_eq!(representation.num_elements(), 6);
        assert_eq!(representation.fixed_size(), Some(12));
        assert_eq!(representation.shape_u64(), vec![2, 3]);

        let representation = ChunkRepresentation::new(
            &vec![4].try_into().unwrap(),
            DataType::String,
            FillValue::from(""),
        );
        assert_eq!(representation.fixed_size(), None);
    }

    #[test]
    fn bytes_representation() {
        assert_eq!(BytesRepresentation::FixedSize(10).size(), Some(10));
        assert_eq!(BytesRepresentation::BoundedSize(12).size(), Some(12));
        assert_eq!(BytesRepresentation::UnboundedSize.size(), None);
    }
}
