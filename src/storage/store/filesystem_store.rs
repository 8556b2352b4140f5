//! A filesystem store.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/stores/filesystem/v1.0.html>.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use walkdir::WalkDir;

use crate::{
    byte_range::{extract_byte_ranges_read_seek, ByteRange, InvalidByteRangeError},
    storage::{
        Bytes, ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StoreKeys,
        StorePrefix, WritableStorageTraits,
    },
};

const TEMPORARY_SUFFIX: &str = ".partial";

/// A file system store.
///
/// Each key is a file relative to the base path of the store.
/// Values are written to a temporary sibling file which is then renamed over the destination, so a reader never observes a partially written value.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    readonly: bool,
    temporary_counter: AtomicU64,
}

impl FilesystemStore {
    /// Create a new file system store at a given `base_path`.
    ///
    /// The base path is created on the first write if it does not exist.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path` is not valid UTF-8, or it points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }

        let readonly = if base_path.exists() {
            let metadata = std::fs::metadata(&base_path)?;
            if !metadata.is_dir() {
                return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
            }
            metadata.permissions().readonly()
        } else {
            false
        };

        Ok(Self {
            base_path,
            readonly,
            temporary_counter: AtomicU64::new(0),
        })
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        let mut path = self.base_path.clone();
        path.extend(key.as_str().split('/'));
        path
    }

    fn prefix_to_fspath(&self, prefix: &StorePrefix) -> PathBuf {
        let mut path = self.base_path.clone();
        path.extend(prefix.as_str().split('/').filter(|component| !component.is_empty()));
        path
    }

    fn fspath_to_key(&self, path: &Path) -> Option<StoreKey> {
        let relative = pathdiff::diff_paths(path, &self.base_path)?;
        let components = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        StoreKey::new(components.join("/")).ok()
    }

    fn temporary_path(&self, path: &Path) -> PathBuf {
        let counter = self.temporary_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(
            ".{file_name}.{}.{counter}{TEMPORARY_SUFFIX}",
            std::process::id()
        ))
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let mut file = match File::open(self.key_to_fspath(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let size = file.metadata()?.len();
        if let Some(byte_range) = byte_ranges.iter().find(|byte_range| !byte_range.is_valid(size)) {
            return Err(InvalidByteRangeError::new(*byte_range, size).into());
        }
        Ok(Some(
            extract_byte_ranges_read_seek(&mut file, size, byte_ranges)?
                .into_iter()
                .map(Bytes::from)
                .collect(),
        ))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match std::fs::metadata(self.key_to_fspath(key)) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        let path = self.key_to_fspath(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temporary_path = self.temporary_path(&path);
        let result = File::create(&temporary_path)
            .and_then(|mut file| {
                file.write_all(&value)?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&temporary_path, &path));
        if result.is_err() {
            let _ = std::fs::remove_file(&temporary_path);
        }
        Ok(result?)
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        match std::fs::remove_file(self.key_to_fspath(key)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        match std::fs::remove_dir_all(self.prefix_to_fspath(prefix)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let prefix_path = self.prefix_to_fspath(prefix);
        if !prefix_path.exists() {
            return Ok(vec![]);
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(prefix_path).sort_by_file_name() {
            let entry = entry.map_err(|err| StorageError::Other(err.to_string()))?;
            let is_temporary = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(TEMPORARY_SUFFIX));
            if entry.file_type().is_file() && !is_temporary {
                if let Some(key) = self.fspath_to_key(entry.path()) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid base path.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
}
