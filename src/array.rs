//! Zarr arrays.
//!
//! An array is a node in a Zarr hierarchy used to hold multidimensional array data and associated metadata.
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#array>.
//!
//! Use [`ArrayBuilder`] to setup a new array, or use [`Array::open`] for an existing array.
//! The documentation for [`Array`] details how to interact with arrays.

mod array_builder;
mod array_bytes;
mod array_errors;
mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;
pub mod chunk_grid;
pub mod chunk_key_encoding;
pub mod chunk_manifest;
mod chunk_representation;
mod chunk_shape;
pub mod codec;
pub mod data_type;
mod element;
mod fill_value;

use std::sync::Arc;

pub use self::{
    array_builder::ArrayBuilder,
    array_bytes::{merge_array_bytes, ArrayBytes, RawBytes, RawBytesOffsets},
    array_errors::{ArrayCreateError, ArrayError},
    chunk_grid::{InvalidChunkGridIndicesError, RegularChunkGrid},
    chunk_key_encoding::ChunkKeyEncoding,
    chunk_manifest::{ChunkManifest, ChunkManifestError, VirtualChunkRef},
    chunk_representation::{BytesRepresentation, ChunkRepresentation},
    chunk_shape::{ChunkShape, NonZeroError},
    codec::CodecChain,
    data_type::{
        DataType, DataTypeSize, IncompatibleFillValueError, IncompatibleFillValueMetadataError,
        UnknownDataTypeError,
    },
    element::{Element, ElementError, ElementOwned},
    fill_value::FillValue,
};

pub use crate::metadata::{ArrayMetadata, ArrayMetadataV2, ArrayMetadataV3};

use log::debug;

use codec::ArrayToBytesCodecTraits;

use crate::{
    array_subset::ArraySubset,
    config::global_config,
    metadata::v3::{
        storage_transformer::chunk_manifest_json::{self, ChunkManifestJsonConfiguration},
        MetadataV3,
    },
    node::NodePath,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
    storage::StoreKey,
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A Zarr array.
///
/// ### Metadata
///
/// An array is defined by the following parameters (which are encoded in its JSON metadata):
///  - **shape**: defines the length of the array dimensions,
///  - **data type**: defines the numerical representation array elements,
///  - **chunk grid**: defines how the array is subdivided into chunks,
///  - **chunk key encoding**: defines how chunk grid cell coordinates are mapped to keys in a store,
///  - **fill value**: an element value to use for uninitialised portions of the array, and
///  - **codecs**: used to encode and decode chunks.
///
/// The metadata of an array may be in the Zarr V3 (`zarr.json`) or Zarr V2 (`.zarray` and `.zattrs`) dialect.
/// Both dialects are converted to a single internal representation when the array is created, and an array writes back the dialect it was created with.
/// Chunks are encoded identically in either dialect.
///
/// ### Initialisation
///
/// A *new* array can be initialised with an [`ArrayBuilder`] or [`Array::new_with_metadata`].
/// An *existing* array can be initialised with [`Array::open`], its metadata is read from the store.
///
/// Array metadata must be written explicitly to the store with [`store_metadata`](Array::store_metadata) if an array is newly created.
///
/// ### Virtual Chunks
///
/// An array with a [`ChunkManifest`] reads chunks from byte ranges of foreign files.
/// Chunks absent from the manifest are read from the store, and chunks absent from both are the fill value.
/// An array with a manifest is read only, and every write fails with [`ArrayError::ReadOnlyChunk`].
///
/// ### Methods
///
/// Array operations are divided into several categories based on the traits implemented for the backing [storage](crate::storage):
///  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits): read array data and metadata
///    - [`open`](Array::open)
///    - [`retrieve_chunk`](Array::retrieve_chunk) / [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists)
///    - [`retrieve_chunks`](Array::retrieve_chunks)
///    - [`retrieve_chunk_subset`](Array::retrieve_chunk_subset)
///    - [`retrieve_array_subset`](Array::retrieve_array_subset)
///  - [`WritableStorageTraits`](crate::storage::WritableStorageTraits): write array data and metadata
///    - [`store_metadata`](Array::store_metadata)
///    - [`store_chunk`](Array::store_chunk)
///    - [`store_chunks`](Array::store_chunks)
///    - [`erase_chunk`](Array::erase_chunk) / [`erase_chunks`](Array::erase_chunks)
///  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits): perform operations requiring both reading and writing
///    - [`store_chunk_subset`](Array::store_chunk_subset)
///    - [`store_array_subset`](Array::store_array_subset)
///
/// The `retrieve` and `store` methods operate on [`ArrayBytes`].
/// Variants with an `_elements` suffix read and write array elements with a known [`Element`] type.
///
/// ### Parallel Writing
///
/// Operations spanning multiple chunks encode and decode chunks in parallel, up to the [chunk concurrent limit](crate::config::Config#chunk-concurrent-limit).
///
/// The [`store_chunk_subset`](Array::store_chunk_subset) and [`store_array_subset`](Array::store_array_subset) methods retrieve a chunk, update it, then store it.
/// This sequence is not atomic: if a chunk is updated by more than one writer at the same time, the last write wins and other updates are lost.
/// Callers writing to the same chunk concurrently must exclude each other per chunk.
///
/// Writes spanning multiple chunks are not transactional.
/// If a chunk fails, chunks already stored are not rolled back.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in a store.
    path: NodePath,
    /// The metadata in the dialect the array was created with.
    metadata: ArrayMetadata,
    /// An array of integers providing the length of each dimension of the Zarr array.
    shape: ArrayShape,
    /// The data type of the Zarr array.
    data_type: DataType,
    /// The chunk grid of the Zarr array.
    chunk_grid: RegularChunkGrid,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    chunk_key_encoding: ChunkKeyEncoding,
    /// Provides an element value to use for uninitialised portions of the Zarr array.
    fill_value: FillValue,
    /// Specifies a list of codecs to be used for encoding and decoding chunks.
    codecs: CodecChain,
    /// An optional list of dimension names.
    dimension_names: Option<Vec<Option<String>>>,
    /// The key of the chunk manifest relative to the array path, if the array is virtual.
    manifest_key: Option<StoreKey>,
    /// The chunk manifest.
    chunk_manifest: Option<ChunkManifest>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    /// This does **not** write to the store, use [`store_metadata`](Array::store_metadata) to write `metadata` to `storage`.
    ///
    /// If the metadata declares a `chunk-manifest-json` storage transformer, the array is read only.
    /// The manifest itself is loaded by [`Array::open`], or can be attached with [`Array::with_chunk_manifest`].
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - any metadata is invalid or,
    ///  - a plugin (e.g. data type/chunk grid/chunk key encoding/codec/storage transformer) is invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let metadata_v3 = metadata.to_v3()?;

        let data_type = DataType::from_metadata(&metadata_v3.data_type)?;
        let chunk_grid = RegularChunkGrid::from_metadata(&metadata_v3.chunk_grid)
            .map_err(ArrayCreateError::ChunkGridCreateError)?;
        if chunk_grid.dimensionality() != metadata_v3.shape.len() {
            return Err(ArrayCreateError::InvalidChunkGridDimensionality(
                chunk_grid.dimensionality(),
                metadata_v3.shape.len(),
            ));
        }
        let fill_value = data_type.resolve_fill_value(metadata_v3.fill_value.as_ref())?;
        let codecs = CodecChain::from_metadata(&metadata_v3.codecs)
            .map_err(ArrayCreateError::CodecsCreateError)?;
        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata_v3.chunk_key_encoding)
            .map_err(ArrayCreateError::ChunkKeyEncodingCreateError)?;
        if let Some(dimension_names) = &metadata_v3.dimension_names {
            if dimension_names.len() != metadata_v3.shape.len() {
                return Err(ArrayCreateError::InvalidDimensionNames(
                    dimension_names.len(),
                    metadata_v3.shape.len(),
                ));
            }
        }
        let manifest_key = manifest_key_from_storage_transformers(&metadata_v3.storage_transformers)?;

        // Encode a chunk of the fill value to check the codec chain supports the data type
        let chunk_representation =
            ChunkRepresentation::new(chunk_grid.chunk_shape(), data_type.clone(), fill_value.clone());
        codecs
            .compute_encoded_size(&chunk_representation)
            .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?;

        debug!(
            "array {path}: {} shape {:?} data type {data_type} chunk shape {:?}{}",
            match metadata {
                ArrayMetadata::V2(_) => "Zarr V2",
                ArrayMetadata::V3(_) => "Zarr V3",
            },
            metadata_v3.shape,
            chunk_grid.chunk_shape().to_array_shape(),
            if manifest_key.is_some() { " (virtual)" } else { "" }
        );

        Ok(Self {
            storage,
            path,
            metadata,
            shape: metadata_v3.shape,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            dimension_names: metadata_v3.dimension_names,
            manifest_key,
            chunk_manifest: None,
        })
    }

    /// Attach a chunk manifest to the array, making it read only.
    ///
    /// If the array has Zarr V3 metadata without a `chunk-manifest-json` storage transformer, one is added with the default manifest key `manifest.json`.
    /// The base directory of the manifest is recorded in the storage transformer configuration so that relative paths still resolve after [`Array::open`].
    /// A manifest without a base directory takes the one declared in the metadata, if any.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the manifest does not match the chunk grid of the array, or the array has Zarr V2 metadata.
    pub fn with_chunk_manifest(mut self, mut chunk_manifest: ChunkManifest) -> Result<Self, ArrayCreateError> {
        chunk_manifest.validate(&self.chunk_grid_shape())?;
        let ArrayMetadata::V3(metadata) = &mut self.metadata else {
            return Err(ArrayCreateError::InvalidMetadata(
                "a chunk manifest requires Zarr V3 metadata".to_string(),
            ));
        };
        let position = metadata
            .storage_transformers
            .iter()
            .position(|storage_transformer| storage_transformer.name() == chunk_manifest_json::IDENTIFIER);
        let mut configuration: ChunkManifestJsonConfiguration = match position {
            Some(position) => metadata.storage_transformers[position]
                .to_configuration()
                .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?,
            None => ChunkManifestJsonConfiguration::default(),
        };
        if let Some(base_directory) = chunk_manifest.base_directory() {
            configuration.base_directory = Some(base_directory.to_string_lossy().into_owned());
        } else if let Some(base_directory) = &configuration.base_directory {
            chunk_manifest = chunk_manifest.with_base_directory(base_directory);
        }
        let storage_transformer = MetadataV3::new_with_serializable_configuration(
            chunk_manifest_json::IDENTIFIER,
            &configuration,
        )?;
        match position {
            Some(position) => metadata.storage_transformers[position] = storage_transformer,
            None => metadata.storage_transformers.push(storage_transformer),
        }
        if self.manifest_key.is_none() {
            self.manifest_key = Some(StoreKey::new_unchecked(configuration.manifest));
        }
        debug!(
            "array {}: attached chunk manifest with {} chunks",
            self.path,
            chunk_manifest.len()
        );
        self.chunk_manifest = Some(chunk_manifest);
        Ok(self)
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the array dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Get the codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the dimension names.
    #[must_use]
    pub fn dimension_names(&self) -> Option<&[Option<String>]> {
        self.dimension_names.as_deref()
    }

    /// Get the attributes.
    #[must_use]
    pub fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        self.metadata.attributes()
    }

    /// Get the chunk manifest, if one is attached.
    #[must_use]
    pub const fn chunk_manifest(&self) -> Option<&ChunkManifest> {
        self.chunk_manifest.as_ref()
    }

    /// Returns true if the array is backed by a chunk manifest and cannot be written.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.manifest_key.is_some()
    }

    /// Return the array metadata, in the dialect the array was created with.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Return the shape of the chunk grid (i.e., the number of chunks).
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        // The dimensionality of the grid and the array were validated on creation
        self.chunk_grid
            .grid_shape(&self.shape)
            .unwrap_or_else(|_| vec![0; self.dimensionality()])
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// The subset has the full chunk shape, and may extend past the end of the array.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset(chunk_indices, &self.shape)?)
    }

    /// Return the array subset of the chunk at `chunk_indices` bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        Ok(chunk_subset.overlap(&ArraySubset::new_with_shape(self.shape.clone()))?)
    }

    /// Return the array subset spanned by the chunks in `chunks`, bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunks` are incompatible with the chunk grid.
    pub fn chunks_subset_bounded(&self, chunks: &ArraySubset) -> Result<ArraySubset, ArrayError> {
        if chunks.is_empty() {
            return Ok(ArraySubset::new_with_shape(vec![0; self.dimensionality()]));
        }
        let chunk_last = chunks
            .end_exc()
            .iter()
            .map(|end| end - 1)
            .collect::<Vec<_>>();
        let start = self.chunk_subset(chunks.start())?;
        let end = self.chunk_subset_bounded(&chunk_last)?;
        Ok(ArraySubset::new_with_start_end_exc(
            start.start().to_vec(),
            &end.end_exc(),
        )?)
    }

    /// Return the indices of the chunks intersecting `array_subset`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidArraySubset`] if the subset is not within the bounds of the array.
    pub fn chunks_in_array_subset(&self, array_subset: &ArraySubset) -> Result<ArraySubset, ArrayError> {
        self.validate_array_subset(array_subset)?;
        Ok(self.chunk_grid.chunks_in_array_subset(array_subset)?)
    }

    /// Get the chunk representation of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_representation(&self, chunk_indices: &[u64]) -> Result<ChunkRepresentation, ArrayError> {
        if self.chunk_grid.validate_chunk_indices(chunk_indices, &self.shape) {
            Ok(ChunkRepresentation::new(
                self.chunk_grid.chunk_shape(),
                self.data_type.clone(),
                self.fill_value.clone(),
            ))
        } else {
            Err(InvalidChunkGridIndicesError::new(chunk_indices.to_vec(), self.shape.clone()).into())
        }
    }

    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.inbounds(&self.shape) {
            Ok(())
        } else {
            Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape.clone(),
            ))
        }
    }

    fn validate_writable(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        if self.is_read_only() {
            Err(ArrayError::ReadOnlyChunk(chunk_indices.to_vec()))
        } else {
            Ok(())
        }
    }
}

/// Find the chunk manifest key declared by the storage transformers of an array.
fn manifest_key_from_storage_transformers(
    storage_transformers: &[MetadataV3],
) -> Result<Option<StoreKey>, ArrayCreateError> {
    let mut manifest_key = None;
    for storage_transformer in storage_transformers {
        if storage_transformer.name() != chunk_manifest_json::IDENTIFIER {
            return Err(ArrayCreateError::StorageTransformersCreateError(
                PluginCreateError::unsupported(storage_transformer.name(), "storage transformer"),
            ));
        }
        if manifest_key.is_some() {
            return Err(ArrayCreateError::InvalidMetadata(
                "only one chunk manifest storage transformer is supported".to_string(),
            ));
        }
        let configuration: ChunkManifestJsonConfiguration = storage_transformer
            .to_configuration()
            .map_err(|_| {
                ArrayCreateError::StorageTransformersCreateError(
                    PluginMetadataInvalidError::new(
                        chunk_manifest_json::IDENTIFIER,
                        "storage transformer",
                        storage_transformer.clone(),
                    )
                    .into(),
                )
            })?;
        let key = StoreKey::new(configuration.manifest)
            .map_err(|err| ArrayCreateError::InvalidMetadata(err.to_string()))?;
        manifest_key = Some(key);
    }
    Ok(manifest_key)
}

/// The number of chunks to encode or decode concurrently.
fn chunk_concurrent_limit() -> usize {
    match global_config().chunk_concurrent_limit() {
        0 => rayon::current_num_threads(),
        limit => limit,
    }
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}
