use std::{borrow::Cow, sync::Arc};

use log::{trace, warn};
use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::ArraySubset,
    node::NodePath,
    storage::{
        meta_key, meta_key_v2_array, meta_key_v2_attributes, node_key, Bytes, MaybeBytes,
        ReadableStorageTraits, StorageError, StoreKey,
    },
};

use super::{
    chunk_concurrent_limit, codec::ArrayToBytesCodecTraits, merge_array_bytes, Array,
    ArrayBytes, ArrayCreateError, ArrayError, ArrayMetadata, ArrayMetadataV2, ArrayMetadataV3,
    ChunkManifest, ElementOwned,
};

fn parse_metadata<T: serde::de::DeserializeOwned>(key: &StoreKey, bytes: &Bytes) -> Result<T, StorageError> {
    serde_json::from_slice(bytes).map_err(|err| StorageError::InvalidMetadata(key.clone(), err.to_string()))
}

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Open an existing array in `storage` at `path`. The metadata is read from the store.
    ///
    /// Zarr V3 metadata (`zarr.json`) takes precedence over Zarr V2 metadata (`.zarray` and `.zattrs`).
    /// If the metadata declares a `chunk-manifest-json` storage transformer, the manifest is read from the store and validated against the chunk grid.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata is missing, or any metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::new(path)?;

        let key = meta_key(&node_path);
        let metadata = if let Some(bytes) = storage.get(&key)? {
            ArrayMetadata::V3(parse_metadata::<ArrayMetadataV3>(&key, &bytes)?)
        } else {
            let key = meta_key_v2_array(&node_path);
            let bytes = storage.get(&key)?.ok_or(ArrayCreateError::MissingMetadata)?;
            let mut metadata = parse_metadata::<ArrayMetadataV2>(&key, &bytes)?;
            let key = meta_key_v2_attributes(&node_path);
            if let Some(bytes) = storage.get(&key)? {
                metadata.attributes = parse_metadata(&key, &bytes)?;
            }
            ArrayMetadata::V2(metadata)
        };

        let array = Self::new_with_metadata(storage, path, metadata)?;
        if let Some(manifest_key) = &array.manifest_key {
            let key = node_key(array.path(), manifest_key);
            let manifest = array
                .storage
                .get(&key)?
                .ok_or(ArrayCreateError::MissingMetadata)?;
            let manifest = ChunkManifest::from_json(&manifest)?;
            array.with_chunk_manifest(manifest)
        } else {
            Ok(array)
        }
    }

    /// Read the encoded bytes of the chunk at `chunk_indices`.
    ///
    /// A chunk referenced by the chunk manifest is read from its foreign file, otherwise it is read from the store.
    /// Returns [`None`] if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the chunk indices are invalid, the referenced file cannot be read, or there is an underlying store error.
    pub fn retrieve_encoded_chunk(&self, chunk_indices: &[u64]) -> Result<MaybeBytes, ArrayError> {
        if !self.chunk_grid.validate_chunk_indices(chunk_indices, self.shape()) {
            return Err(super::InvalidChunkGridIndicesError::new(
                chunk_indices.to_vec(),
                self.shape().to_vec(),
            )
            .into());
        }
        if let Some(chunk_manifest) = &self.chunk_manifest {
            if let Some(chunk_ref) = chunk_manifest.get(chunk_indices) {
                if chunk_ref.length() == 0 {
                    warn!(
                        "array {}: chunk {chunk_indices:?} has a zero length reference to {}, reading the fill value",
                        self.path(),
                        chunk_ref.path()
                    );
                    return Ok(None);
                }
                trace!(
                    "array {}: reading chunk {chunk_indices:?} from {} at {}..{}",
                    self.path(),
                    chunk_ref.path(),
                    chunk_ref.offset(),
                    chunk_ref.offset() + chunk_ref.length()
                );
                return Ok(chunk_manifest.read_chunk(chunk_indices)?);
            }
        }
        trace!("array {}: reading chunk {chunk_indices:?}", self.path());
        Ok(crate::storage::retrieve_chunk(
            &*self.storage,
            self.path(),
            chunk_indices,
            self.chunk_key_encoding(),
        )?)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists.
    ///
    /// # Errors
    /// Returns an [`ArrayError::ChunkError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<ArrayBytes<'static>>, ArrayError> {
        let retrieve = || -> Result<Option<ArrayBytes<'static>>, ArrayError> {
            let Some(chunk_encoded) = self.retrieve_encoded_chunk(chunk_indices)? else {
                return Ok(None);
            };
            let chunk_representation = self.chunk_representation(chunk_indices)?;
            let chunk_decoded = self
                .codecs()
                .decode(Cow::Borrowed(&chunk_encoded), &chunk_representation)?;
            chunk_decoded.validate(
                chunk_representation.num_elements(),
                chunk_representation.data_type().size(),
            )?;
            Ok(Some(chunk_decoded.into_owned()))
        };
        retrieve().map_err(|err| err.in_chunk(chunk_indices))
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes or the fill value if it does not exist.
    ///
    /// A chunk which does not exist is not passed through the codec chain.
    ///
    /// # Errors
    /// See [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists).
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<ArrayBytes<'static>, ArrayError> {
        if let Some(chunk) = self.retrieve_chunk_if_exists(chunk_indices)? {
            Ok(chunk)
        } else {
            let chunk_representation = self
                .chunk_representation(chunk_indices)
                .map_err(|err| err.in_chunk(chunk_indices))?;
            Ok(ArrayBytes::new_fill_value(
                chunk_representation.num_elements(),
                self.data_type().size(),
                self.fill_value(),
            ))
        }
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements or the fill value if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_elements<T: ElementOwned>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        let bytes = self.retrieve_chunk(chunk_indices)?;
        Ok(T::from_array_bytes(self.data_type(), bytes)?)
    }

    /// Read and decode the chunks at `chunks` into their bytes.
    ///
    /// The output covers the chunks bounded by the array shape, see [`chunks_subset_bounded`](Array::chunks_subset_bounded).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if any chunk indices are invalid, or any chunk fails to be retrieved.
    pub fn retrieve_chunks(&self, chunks: &ArraySubset) -> Result<ArrayBytes<'static>, ArrayError> {
        let array_subset = self.chunks_subset_bounded(chunks)?;
        self.retrieve_array_subset(&array_subset)
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into its bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is not within the chunk,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        let chunk_representation = self.chunk_representation(chunk_indices)?;
        let chunk_shape = chunk_representation.shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidArraySubset(
                chunk_subset.clone(),
                chunk_shape,
            ));
        }
        let chunk_bytes = self.retrieve_chunk(chunk_indices)?;
        if chunk_subset.shape() == chunk_shape.as_slice() {
            Ok(chunk_bytes)
        } else {
            Ok(chunk_bytes.extract_array_subset(chunk_subset, &chunk_shape, self.data_type().size())?)
        }
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`retrieve_chunk_subset`](Array::retrieve_chunk_subset).
    pub fn retrieve_chunk_subset_elements<T: ElementOwned>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        let bytes = self.retrieve_chunk_subset(chunk_indices, chunk_subset)?;
        Ok(T::from_array_bytes(self.data_type(), bytes)?)
    }

    /// Read and decode the `array_subset` of the array into its bytes.
    ///
    /// Every chunk intersecting the subset is decoded, in parallel up to the chunk concurrent limit.
    /// Elements in chunks that do not exist are the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the `array_subset` is not within the bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    ///
    /// A chunk failure is reported as an [`ArrayError::ChunkError`] with the indices of the chunk.
    pub fn retrieve_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        let chunks = self.chunks_in_array_subset(array_subset)?;
        let data_type_size = self.data_type().size();

        let retrieve_chunk_overlap = |chunk_indices: Vec<u64>| -> Result<_, ArrayError> {
            let chunk_subset = self.chunk_subset(&chunk_indices)?;
            let overlap = chunk_subset.overlap(array_subset)?;
            let chunk_bytes = self.retrieve_chunk_subset(
                &chunk_indices,
                &overlap.relative_to(chunk_subset.start())?,
            )?;
            Ok((overlap.relative_to(array_subset.start())?, chunk_bytes))
        };

        let chunk_indices = chunks.iter_indices().collect::<Vec<_>>();
        let pieces = match chunk_indices.len() {
            0 => vec![],
            1 => chunk_indices
                .into_iter()
                .map(retrieve_chunk_overlap)
                .collect::<Result<Vec<_>, _>>()?,
            _ => iter_concurrent_limit!(
                chunk_concurrent_limit(),
                chunk_indices,
                map,
                retrieve_chunk_overlap
            )
            .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(merge_array_bytes(array_subset.shape(), &pieces, data_type_size)?)
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`retrieve_array_subset`](Array::retrieve_array_subset).
    pub fn retrieve_array_subset_elements<T: ElementOwned>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        T::validate_data_type(self.data_type())?;
        let bytes = self.retrieve_array_subset(array_subset)?;
        Ok(T::from_array_bytes(self.data_type(), bytes)?)
    }
}
