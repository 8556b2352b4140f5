//! Storage of array metadata and chunks.
//!
//! A store maps [`StoreKey`]s to byte values.
//! This module defines the abstract store interfaces ([`ReadableStorageTraits`], [`WritableStorageTraits`], [`ListableStorageTraits`]), includes the [stores](store) and [storage adapters](storage_adapter), and has functions computing the keys of array metadata and chunks.
//!
//! A [`set`](WritableStorageTraits::set) always replaces the whole value at a key, so readers observe either the old or the new value of a chunk.

pub mod storage_adapter;
mod storage_sync;
mod storage_value_io;
pub mod store;
mod store_key;
mod store_prefix;

use std::sync::Arc;

use thiserror::Error;

use crate::{
    array::ChunkKeyEncoding,
    byte_range::InvalidByteRangeError,
    node::{NodePath, NodePathError},
};

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

pub use self::storage_sync::{
    erase_chunk, retrieve_chunk, store_chunk, ListableStorageTraits, ReadableListableStorageTraits,
    ReadableStorageTraits, ReadableWritableListableStorageTraits, ReadableWritableStorageTraits,
    WritableStorageTraits,
};

pub use storage_value_io::StorageValueIO;

/// Store value bytes.
pub type Bytes = bytes::Bytes;

/// Store value bytes, or [`None`] if the key is absent.
pub type MaybeBytes = Option<Bytes>;

/// [`Arc`] wrapped readable storage.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;

/// [`Arc`] wrapped writable storage.
pub type WritableStorage = Arc<dyn WritableStorageTraits>;

/// [`Arc`] wrapped listable storage.
pub type ListableStorage = Arc<dyn ListableStorageTraits>;

/// [`Arc`] wrapped readable and writable storage.
pub type ReadableWritableStorage = Arc<dyn ReadableWritableStorageTraits>;

/// [`Arc`] wrapped readable and listable storage.
pub type ReadableListableStorage = Arc<dyn ReadableListableStorageTraits>;

/// [`Arc`] wrapped readable, writable, and listable storage.
pub type ReadableWritableListableStorage = Arc<dyn ReadableWritableListableStorageTraits>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// An invalid byte range.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// Unknown key size where the key size must be known.
    #[error("unknown size of value at key {0}")]
    UnknownKeySize(StoreKey),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

fn meta_key_any(path: &NodePath, metadata_file_name: &str) -> StoreKey {
    let prefix = StorePrefix::from(path);
    StoreKey::new_unchecked(format!("{}{metadata_file_name}", prefix.as_str()))
}

/// Return the Zarr V3 metadata key (`zarr.json`) given a node path.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    meta_key_any(path, "zarr.json")
}

/// Return the Zarr V2 array metadata key (`.zarray`) given a node path.
#[must_use]
pub fn meta_key_v2_array(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zarray")
}

/// Return the Zarr V2 user-defined attributes key (`.zattrs`) given a node path.
#[must_use]
pub fn meta_key_v2_attributes(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zattrs")
}

/// Return the key of a node relative value given a node path and a relative key, such as a chunk manifest.
#[must_use]
pub fn node_key(path: &NodePath, key: &StoreKey) -> StoreKey {
    meta_key_any(path, key.as_str())
}

/// Return the data key given a node path, chunk grid coordinates, and a chunk key encoding.
#[must_use]
pub fn data_key(
    path: &NodePath,
    chunk_grid_indices: &[u64],
    chunk_key_encoding: &ChunkKeyEncoding,
) -> StoreKey {
    node_key(path, &chunk_key_encoding.encode(chunk_grid_indices))
}
