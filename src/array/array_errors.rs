use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    metadata::{ArrayMetadataV2ConversionError, ArrayMetadataV2ToV3ConversionError},
    node::NodePathError,
    plugin::PluginCreateError,
    storage::StorageError,
};

use super::{
    chunk_grid::InvalidChunkGridIndicesError,
    chunk_manifest::ChunkManifestError,
    codec::CodecError,
    data_type::{IncompatibleFillValueError, IncompatibleFillValueMetadataError, UnknownDataTypeError},
    ArrayIndices, ArrayShape, ElementError,
};

/// An array creation error.
///
/// Array creation is all or nothing: no array is constructed if any part of its metadata is invalid.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Invalid metadata.
    #[error("invalid array metadata: {0}")]
    InvalidMetadata(String),
    /// The metadata could not be deserialised.
    #[error("array metadata is invalid: {0}")]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// Zarr V2 metadata could not be converted to the internal representation.
    #[error(transparent)]
    ArrayMetadataV2ToV3ConversionError(#[from] ArrayMetadataV2ToV3ConversionError),
    /// The metadata could not be converted to Zarr V2 metadata.
    #[error(transparent)]
    ArrayMetadataV2ConversionError(#[from] ArrayMetadataV2ConversionError),
    /// Unknown data type.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnknownDataTypeError),
    /// The fill value metadata is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// The fill value is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// Error creating codecs.
    #[error(transparent)]
    CodecsCreateError(PluginCreateError),
    /// Error creating the chunk grid.
    #[error(transparent)]
    ChunkGridCreateError(PluginCreateError),
    /// Error creating the chunk key encoding.
    #[error(transparent)]
    ChunkKeyEncodingCreateError(PluginCreateError),
    /// Error creating storage transformers.
    #[error(transparent)]
    StorageTransformersCreateError(PluginCreateError),
    /// The dimensionality of the chunk grid does not match the array shape.
    #[error("chunk grid dimensionality {0} does not match array dimensionality {1}")]
    InvalidChunkGridDimensionality(usize, usize),
    /// The number of dimension names does not match the array dimensionality.
    #[error("the number of dimension names {0} does not match array dimensionality {1}")]
    InvalidDimensionNames(usize, usize),
    /// A chunk manifest is invalid or could not be read.
    #[error(transparent)]
    ChunkManifestError(#[from] ChunkManifestError),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A write was attempted on a chunk of an array backed by a chunk manifest.
    #[error("chunk {0:?} is read only, the array is backed by a chunk manifest")]
    ReadOnlyChunk(ArrayIndices),
    /// An operation on a chunk failed.
    #[error("chunk {chunk_indices:?}: {source}")]
    ChunkError {
        /// The grid indices of the chunk.
        chunk_indices: ArrayIndices,
        /// The underlying error.
        source: Box<ArrayError>,
    },
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A chunk manifest error.
    #[error(transparent)]
    ChunkManifestError(#[from] ChunkManifestError),
    /// Invalid chunk grid indices.
    #[error(transparent)]
    InvalidChunkGridIndicesError(#[from] InvalidChunkGridIndicesError),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// An array subset is not within the bounds of the array.
    #[error("array subset {_0} is not compatible with array shape {_1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// The bytes input to a store operation do not match the expected number of elements.
    #[error("input holds {_0} elements, expected {_1}")]
    InvalidBytesInputSize(u64, u64),
    /// An element error.
    #[error(transparent)]
    ElementError(#[from] ElementError),
    /// The metadata could not be serialised.
    #[error(transparent)]
    MetadataSerializationError(#[from] serde_json::Error),
    /// The array metadata is invalid.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
}

impl ArrayError {
    /// Wrap an error with the grid indices of the chunk it occurred in.
    #[must_use]
    pub fn in_chunk(self, chunk_indices: &[u64]) -> Self {
        match self {
            Self::ChunkError { .. } | Self::ReadOnlyChunk(_) => self,
            err => Self::ChunkError {
                chunk_indices: chunk_indices.to_vec(),
                source: Box::new(err),
            },
        }
    }
}
