use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{array_subset::ArraySubset, storage::ReadableWritableStorageTraits};

use super::{chunk_concurrent_limit, merge_array_bytes, Array, ArrayBytes, ArrayError, Element};

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> Array<TStorage> {
    /// Encode `chunk_subset_bytes` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// Unless `chunk_subset` covers the entire chunk, the existing chunk (or the fill value) is read and the update is merged into it before writing.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is backed by a chunk manifest,
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is not within the chunk,
    ///  - the length of `chunk_subset_bytes` does not match the number of elements in `chunk_subset`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        self.validate_writable(chunk_indices)?;
        let chunk_shape = self.chunk_representation(chunk_indices)?.shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidArraySubset(
                chunk_subset.clone(),
                chunk_shape,
            ));
        }
        let data_type_size = self.data_type().size();
        chunk_subset_bytes.validate(chunk_subset.num_elements(), data_type_size)?;

        if chunk_subset.shape() == chunk_shape.as_slice() {
            self.store_chunk(chunk_indices, chunk_subset_bytes)
        } else {
            let chunk_bytes = self.retrieve_chunk(chunk_indices)?;
            let chunk_bytes = merge_array_bytes(
                &chunk_shape,
                &[
                    (ArraySubset::new_with_shape(chunk_shape.clone()), chunk_bytes),
                    (chunk_subset.clone(), chunk_subset_bytes),
                ],
                data_type_size,
            )
            .map_err(|err| ArrayError::from(err).in_chunk(chunk_indices))?;
            self.store_chunk(chunk_indices, chunk_bytes)
        }
    }

    /// Encode `chunk_subset_elements` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`store_chunk_subset`](Array::store_chunk_subset).
    pub fn store_chunk_subset_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        let chunk_subset_bytes = T::to_array_bytes(self.data_type(), chunk_subset_elements)?;
        self.store_chunk_subset(chunk_indices, chunk_subset, chunk_subset_bytes)
    }

    /// Encode `subset_bytes` and store in `array_subset`.
    ///
    /// Each chunk intersecting `array_subset` is updated in parallel, up to the chunk concurrent limit.
    /// Prefer [`store_chunk`](Array::store_chunk) where possible, since this will decode and encode each chunk that is only partially covered by `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is backed by a chunk manifest,
    ///  - `array_subset` is not within the bounds of the array,
    ///  - the length of `subset_bytes` does not match the number of elements in `array_subset`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        let chunks = self.chunks_in_array_subset(array_subset)?;
        self.validate_writable(chunks.start())?;
        let data_type_size = self.data_type().size();
        subset_bytes.validate(array_subset.num_elements(), data_type_size)?;

        let store_chunk = |chunk_indices: Vec<u64>| -> Result<(), ArrayError> {
            let chunk_subset = self.chunk_subset(&chunk_indices)?;
            let overlap = chunk_subset.overlap(array_subset)?;
            let chunk_subset_bytes = subset_bytes.extract_array_subset(
                &overlap.relative_to(array_subset.start())?,
                array_subset.shape(),
                data_type_size,
            )?;
            self.store_chunk_subset(
                &chunk_indices,
                &overlap.relative_to(chunk_subset.start())?,
                chunk_subset_bytes,
            )
        };

        let chunk_indices = chunks.iter_indices().collect::<Vec<_>>();
        iter_concurrent_limit!(
            chunk_concurrent_limit(),
            chunk_indices,
            try_for_each,
            store_chunk
        )
    }

    /// Encode `subset_elements` and store in `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the element type is incompatible with the data type, or see [`store_array_subset`](Array::store_array_subset).
    pub fn store_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        let subset_bytes = T::to_array_bytes(self.data_type(), subset_elements)?;
        self.store_array_subset(array_subset, subset_bytes)
    }
}
