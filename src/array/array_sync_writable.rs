use log::trace;
use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::ArraySubset,
    storage::{
        meta_key, meta_key_v2_array, meta_key_v2_attributes, node_key, Bytes, StorageError,
        WritableStorageTraits,
    },
};

use super::{
    chunk_concurrent_limit, codec::ArrayToBytesCodecTraits, merge_array_bytes, Array,
    ArrayBytes, ArrayError, ArrayMetadata, Element,
};

fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes, StorageError> {
    serde_json::to_vec_pretty(value)
        .map(Bytes::from)
        .map_err(|err| StorageError::Other(err.to_string()))
}

impl<TStorage: ?Sized + WritableStorageTraits + 'static> Array<TStorage> {
    /// Store metadata.
    ///
    /// Zarr V3 metadata is written to `zarr.json`, along with the chunk manifest if one is attached.
    /// Zarr V2 metadata is written to `.zarray`, and the attributes to `.zattrs` if there are any.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        match self.metadata() {
            ArrayMetadata::V3(metadata) => {
                self.storage.set(&meta_key(self.path()), to_json(metadata)?)?;
                if let (Some(manifest_key), Some(chunk_manifest)) =
                    (&self.manifest_key, &self.chunk_manifest)
                {
                    let manifest = chunk_manifest
                        .to_json()
                        .map_err(|err| StorageError::Other(err.to_string()))?;
                    self.storage
                        .set(&node_key(self.path(), manifest_key), Bytes::from(manifest))?;
                }
            }
            ArrayMetadata::V2(metadata) => {
                self.storage
                    .set(&meta_key_v2_array(self.path()), to_json(metadata)?)?;
                if !metadata.attributes.is_empty() {
                    self.storage.set(
                        &meta_key_v2_attributes(self.path()),
                        to_json(&metadata.attributes)?,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// A chunk composed entirely of the fill value will be erased from the store.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is backed by a chunk manifest ([`ArrayError::ReadOnlyChunk`]),
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` is not equal to the expected length (the product of the number of elements in the chunk and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        self.validate_writable(chunk_indices)?;
        let store = || -> Result<(), ArrayError> {
            let chunk_representation = self.chunk_representation(chunk_indices)?;
            chunk_bytes.validate(
                chunk_representation.num_elements(),
                self.data_type().size(),
            )?;

            if chunk_bytes.is_fill_value(self.fill_value()) {
                trace!(
                    "array {}: chunk {chunk_indices:?} is the fill value, erasing",
                    self.path()
                );
                self.erase_chunk(chunk_indices)
            } else {
                let chunk_encoded = self.codecs().encode(chunk_bytes, &chunk_representation)?;
                trace!(
                    "array {}: storing chunk {chunk_indices:?} ({} bytes)",
                    self.path(),
                    chunk_encoded.len()
                );
                crate::storage::store_chunk(
                    &*self.storage,
                    self.path(),
                    chunk_indices,
                    self.chunk_key_encoding(),
                    Bytes::from(chunk_encoded.into_owned()),
                )?;
                Ok(())
            }
        };
        store().map_err(|err| err.in_chunk(chunk_indices))
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`store_chunk`](Array::store_chunk).
    pub fn store_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        let chunk_bytes = T::to_array_bytes(self.data_type(), chunk_elements)?;
        self.store_chunk(chunk_indices, chunk_bytes)
    }

    /// Encode `chunks_bytes` and store in the chunks at `chunks`.
    ///
    /// `chunks_bytes` covers the region of the chunks bounded by the array shape, see [`chunks_subset_bounded`](Array::chunks_subset_bounded).
    /// The parts of edge chunks outside of the array are the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is backed by a chunk manifest,
    ///  - any chunk indices in `chunks` are invalid,
    ///  - the length of `chunks_bytes` does not match the number of elements in the bounded chunks,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunks(
        &self,
        chunks: &ArraySubset,
        chunks_bytes: ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        self.validate_writable(chunks.start())?;
        let array_subset = self.chunks_subset_bounded(chunks)?;
        let data_type_size = self.data_type().size();
        chunks_bytes.validate(array_subset.num_elements(), data_type_size)?;

        let store_chunk = |chunk_indices: Vec<u64>| -> Result<(), ArrayError> {
            let chunk_subset = self.chunk_subset(&chunk_indices)?;
            let chunk_subset_bounded = self.chunk_subset_bounded(&chunk_indices)?;
            let chunk_bytes = chunks_bytes.extract_array_subset(
                &chunk_subset_bounded.relative_to(array_subset.start())?,
                array_subset.shape(),
                data_type_size,
            )?;
            let chunk_bytes = if chunk_subset_bounded == chunk_subset {
                chunk_bytes
            } else {
                let chunk_representation = self.chunk_representation(&chunk_indices)?;
                let fill = ArrayBytes::new_fill_value(
                    chunk_representation.num_elements(),
                    data_type_size,
                    self.fill_value(),
                );
                merge_array_bytes(
                    chunk_subset.shape(),
                    &[
                        (ArraySubset::new_with_shape(chunk_subset.shape().to_vec()), fill),
                        (chunk_subset_bounded.relative_to(chunk_subset.start())?, chunk_bytes),
                    ],
                    data_type_size,
                )?
            };
            self.store_chunk(&chunk_indices, chunk_bytes)
        };

        let chunk_indices = chunks.iter_indices().collect::<Vec<_>>();
        iter_concurrent_limit!(
            chunk_concurrent_limit(),
            chunk_indices,
            try_for_each,
            store_chunk
        )
    }

    /// Encode `chunks_elements` and store in the chunks at `chunks`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`store_chunks`](Array::store_chunks).
    pub fn store_chunks_elements<T: Element>(
        &self,
        chunks: &ArraySubset,
        chunks_elements: &[T],
    ) -> Result<(), ArrayError> {
        let chunks_bytes = T::to_array_bytes(self.data_type(), chunks_elements)?;
        self.store_chunks(chunks, chunks_bytes)
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is backed by a chunk manifest or there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.validate_writable(chunk_indices)?;
        Ok(crate::storage::erase_chunk(
            &*self.storage,
            self.path(),
            chunk_indices,
            self.chunk_key_encoding(),
        )?)
    }

    /// Erase the chunks in `chunks`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is backed by a chunk manifest or there is an underlying store error.
    pub fn erase_chunks(&self, chunks: &ArraySubset) -> Result<(), ArrayError> {
        self.validate_writable(chunks.start())?;
        let erase_chunk = |chunk_indices: Vec<u64>| self.erase_chunk(&chunk_indices);
        let chunk_indices = chunks.iter_indices().collect::<Vec<_>>();
        iter_concurrent_limit!(
            chunk_concurrent_limit(),
            chunk_indices,
            try_for_each,
            erase_chunk
        )
    }
}
