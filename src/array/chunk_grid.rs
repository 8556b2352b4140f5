//! The chunk grid of an array.
//!
//! Only the `regular` chunk grid is supported.
//! A regular grid partitions the array into chunks of a fixed [`ChunkShape`], with the final chunk along each axis extending past the array bounds when the shape is not a multiple of the chunk shape.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#regular-grids>.

use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    metadata::v3::{
        chunk_grid::regular::{RegularChunkGridConfiguration, IDENTIFIER},
        MetadataConfiguration, MetadataV3,
    },
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

use super::{ArrayIndices, ArrayShape, ChunkShape};

/// A `regular` chunk grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularChunkGrid {
    chunk_shape: ChunkShape,
}

/// An invalid chunk grid indices error.
#[derive(Clone, Debug, Error)]
#[error("chunk grid indices {0:?} are invalid for array with shape {1:?}")]
pub struct InvalidChunkGridIndicesError(ArrayIndices, ArrayShape);

impl InvalidChunkGridIndicesError {
    /// Create a new [`InvalidChunkGridIndicesError`].
    #[must_use]
    pub fn new(chunk_indices: ArrayIndices, array_shape: ArrayShape) -> Self {
        Self(chunk_indices, array_shape)
    }
}

impl RegularChunkGrid {
    /// Create a new regular chunk grid with chunk shape `chunk_shape`.
    #[must_use]
    pub fn new(chunk_shape: ChunkShape) -> Self {
        Self { chunk_shape }
    }

    /// Create a regular chunk grid from chunk grid metadata.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if the chunk grid is not `regular` or its configuration is invalid.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, PluginCreateError> {
        if metadata.name() != IDENTIFIER {
            return Err(PluginCreateError::unsupported(metadata.name(), "chunk grid"));
        }
        let configuration: RegularChunkGridConfiguration =
            metadata.to_configuration().map_err(|_| {
                PluginMetadataInvalidError::new(IDENTIFIER, "chunk grid", metadata.clone())
            })?;
        Ok(Self::new(configuration.chunk_shape))
    }

    /// Create the chunk grid metadata.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        let mut configuration = MetadataConfiguration::new();
        configuration.insert(
            "chunk_shape".to_string(),
            self.chunk_shape.to_array_shape().into(),
        );
        MetadataV3::new_with_configuration(IDENTIFIER, configuration)
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// The dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// The number of chunks along each dimension of an array with shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `array_shape` does not match the dimensionality of the grid.
    pub fn grid_shape(
        &self,
        array_shape: &[u64],
    ) -> Result<ArrayShape, IncompatibleDimensionalityError> {
        self.check_dimensionality(array_shape.len())?;
        Ok(std::iter::zip(array_shape, self.chunk_shape.iter())
            .map(|(&size, chunk_size)| size.div_ceil(chunk_size.get()))
            .collect())
    }

    /// The origin of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_indices` does not match the dimensionality of the grid.
    pub fn chunk_origin(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        self.check_dimensionality(chunk_indices.len())?;
        Ok(std::iter::zip(chunk_indices, self.chunk_shape.iter())
            .map(|(index, chunk_size)| index * chunk_size.get())
            .collect())
    }

    /// Returns true if `chunk_indices` lie within the grid of an array with shape `array_shape`.
    #[must_use]
    pub fn validate_chunk_indices(&self, chunk_indices: &[u64], array_shape: &[u64]) -> bool {
        self.grid_shape(array_shape).is_ok_and(|grid_shape| {
            chunk_indices.len() == grid_shape.len()
                && std::iter::zip(chunk_indices, &grid_shape).all(|(index, size)| index < size)
        })
    }

    /// The array subset of the chunk at `chunk_indices`.
    ///
    /// The subset always has the full chunk shape, and may extend beyond `array_shape` for a final chunk.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are outside the grid.
    pub fn subset(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let invalid =
            || InvalidChunkGridIndicesError::new(chunk_indices.to_vec(), array_shape.to_vec());
        if !self.validate_chunk_indices(chunk_indices, array_shape) {
            return Err(invalid());
        }
        let origin = self.chunk_origin(chunk_indices).map_err(|_| invalid())?;
        ArraySubset::new_with_start_shape(origin, self.chunk_shape.to_array_shape())
            .map_err(|_| invalid())
    }

    /// The subset of the chunk grid holding the chunks that intersect `array_subset`.
    ///
    /// An empty `array_subset` intersects no chunks.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `array_subset` does not match the dimensionality of the grid.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        self.check_dimensionality(array_subset.dimensionality())?;
        if array_subset.is_empty() {
            return Ok(ArraySubset::new_with_shape(vec![
                0;
                array_subset.dimensionality()
            ]));
        }
        let start = std::iter::zip(array_subset.start(), self.chunk_shape.iter())
            .map(|(start, chunk_size)| start / chunk_size.get())
            .collect();
        let end = std::iter::zip(array_subset.end_exc(), self.chunk_shape.iter())
            .map(|(end, chunk_size)| end.div_ceil(chunk_size.get()))
            .collect::<Vec<_>>();
        ArraySubset::new_with_start_end_exc(start, &end)
    }

    fn check_dimensionality(&self, dimensionality: usize) -> Result<(), IncompatibleDimensionalityError> {
        if dimensionality == self.dimensionality() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(
                dimensionality,
                self.dimensionality(),
            ))
        }
    }
}
