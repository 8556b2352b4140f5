//! A read-only zip storage adapter.
//!
//! Presents the entries of a zip archive, stored as a single value of another store, as a store.

use std::{io::Read, sync::Arc};

use parking_lot::Mutex;
use thiserror::Error;
use zip::{result::ZipError, ZipArchive};

use crate::{
    byte_range::{extract_byte_ranges, ByteRange},
    storage::{
        storage_value_io::StorageValueIO, Bytes, ListableStorageTraits, ReadableStorageTraits,
        StorageError, StoreKey, StoreKeys, StorePrefix,
    },
};

/// A zip storage adapter.
pub struct ZipStorageAdapter<TStorage: ?Sized + ReadableStorageTraits> {
    zip_archive: Mutex<ZipArchive<StorageValueIO<TStorage>>>,
    zip_path: String,
}

impl<TStorage: ?Sized + ReadableStorageTraits> ZipStorageAdapter<TStorage> {
    /// Create a new zip storage adapter for the archive at `key` in `storage`.
    ///
    /// # Errors
    /// Returns a [`ZipStorageAdapterCreateError`] if the value at `key` does not exist or is not a valid zip archive.
    pub fn new(storage: Arc<TStorage>, key: StoreKey) -> Result<Self, ZipStorageAdapterCreateError> {
        Self::new_with_path(storage, key, "")
    }

    /// Create a new zip storage adapter rooted at `path` within the archive at `key` in `storage`.
    ///
    /// `path` is a directory within the archive, such as `data/`.
    ///
    /// # Errors
    /// Returns a [`ZipStorageAdapterCreateError`] if the value at `key` does not exist or is not a valid zip archive.
    pub fn new_with_path(
        storage: Arc<TStorage>,
        key: StoreKey,
        path: &str,
    ) -> Result<Self, ZipStorageAdapterCreateError> {
        let storage_io = StorageValueIO::new(storage, key)?;
        let zip_archive = ZipArchive::new(storage_io)?;
        Ok(Self {
            zip_archive: Mutex::new(zip_archive),
            zip_path: path.to_string(),
        })
    }

    fn zip_name(&self, key: &StoreKey) -> String {
        format!("{}{}", self.zip_path, key.as_str())
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ReadableStorageTraits
    for ZipStorageAdapter<TStorage>
{
    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let mut zip_archive = self.zip_archive.lock();
        let mut file = match zip_archive.by_name(&self.zip_name(key)) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(StorageError::Other(err.to_string())),
        };
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut bytes)?;
        Ok(Some(
            extract_byte_ranges(&bytes, byte_ranges)?
                .into_iter()
                .map(Bytes::from)
                .collect(),
        ))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let mut zip_archive = self.zip_archive.lock();
        let size = match zip_archive.by_name(&self.zip_name(key)) {
            Ok(file) => Ok(Some(file.size())),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(StorageError::Other(err.to_string())),
        };
        size
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> ListableStorageTraits
    for ZipStorageAdapter<TStorage>
{
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let zip_archive = self.zip_archive.lock();
        let mut keys: StoreKeys = zip_archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .filter_map(|name| name.strip_prefix(self.zip_path.as_str()))
            .filter(|name| name.starts_with(prefix.as_str()))
            .filter_map(|name| StoreKey::new(name).ok())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// A zip storage adapter creation error.
#[derive(Debug, Error)]
pub enum ZipStorageAdapterCreateError {
    /// A zip error.
    #[error(transparent)]
    ZipError(#[from] ZipError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use crate::storage::{store::MemoryStore, WritableStorageTraits};

    use super::*;

    fn zip_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn zip_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let archive = zip_archive(&[
            ("data/a/b", vec![0, 1, 2, 3]),
            ("data/a/c", vec![]),
            ("data/d", vec![4]),
            ("other", vec![5]),
        ]);
        store
            .set(&StoreKey::new("test.zip").unwrap(), archive.into())
            .unwrap();
        store
    }

    #[test]
    fn zip_root() -> Result<(), Box<dyn std::error::Error>> {
        let adapter = ZipStorageAdapter::new(zip_store(), StoreKey::new("test.zip")?)?;
        assert_eq!(
            adapter.list()?,
            vec![
                StoreKey::new("data/a/b")?,
                StoreKey::new("data/a/c")?,
                StoreKey::new("data/d")?,
                StoreKey::new("other")?,
            ]
        );
        assert_eq!(adapter.get(&StoreKey::new("data/a/b")?)?.unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(adapter.size_key(&StoreKey::new("data/a/b")?)?, Some(4));
        assert!(adapter.get(&StoreKey::new("missing")?)?.is_none());
        Ok(())
    }

    #[test]
    fn zip_path() -> Result<(), Box<dyn std::error::Error>> {
        let adapter =
            ZipStorageAdapter::new_with_path(zip_store(), StoreKey::new("test.zip")?, "data/")?;
        assert_eq!(
            adapter.list_prefix(&StorePrefix::new("a/")?)?,
            vec![StoreKey::new("a/b")?, StoreKey::new("a/c")?]
        );
        assert_eq!(
            adapter.get_partial_values_key(&StoreKey::new("a/b")?, &[ByteRange::FromEnd(0, Some(1))])?,
            Some(vec![Bytes::from_static(&[3])])
        );
        Ok(())
    }

    #[test]
    fn zip_invalid() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::new("test.zip").unwrap();
        store.set(&key, Bytes::from_static(b"not a zip")).unwrap();
        assert!(ZipStorageAdapter::new(store.clone(), key).is_err());
        assert!(ZipStorageAdapter::new(store, StoreKey::new("missing").unwrap()).is_err());
    }
}
