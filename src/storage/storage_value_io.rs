use std::{
    io::{Read, Seek, SeekFrom},
    sync::Arc,
};

use crate::byte_range::ByteRange;

use super::{ReadableStorageTraits, StorageError, StoreKey};

/// Provides a [`Read`] and [`Seek`] interface to a storage value.
#[derive(Clone)]
pub struct StorageValueIO<TStorage: ?Sized + ReadableStorageTraits> {
    storage: Arc<TStorage>,
    key: StoreKey,
    pos: u64,
    size: u64,
}

impl<TStorage: ?Sized + ReadableStorageTraits> StorageValueIO<TStorage> {
    /// Create a new `StorageValueIO` for the `key` in `storage`.
    ///
    /// # Errors
    /// Returns [`StorageError::UnknownKeySize`] if the key does not exist, or a [`StorageError`] if the storage fails to return its size.
    pub fn new(storage: Arc<TStorage>, key: StoreKey) -> Result<Self, StorageError> {
        let size = storage
            .size_key(&key)?
            .ok_or_else(|| StorageError::UnknownKeySize(key.clone()))?;
        Ok(Self {
            storage,
            key,
            pos: 0,
            size,
        })
    }

    /// The size of the value.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Seek for StorageValueIO<TStorage> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        use std::io::{Error, ErrorKind};
        let (base, offset) = match pos {
            SeekFrom::Start(offset) => {
                self.pos = offset;
                return Ok(self.pos);
            }
            SeekFrom::Current(offset) => (self.pos, offset),
            SeekFrom::End(offset) => (self.size, offset),
        };
        self.pos = base
            .checked_add_signed(offset)
            .ok_or_else(|| Error::from(ErrorKind::InvalidInput))?;
        Ok(self.pos)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Read for StorageValueIO<TStorage> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let length = (buf.len() as u64).min(self.size.saturating_sub(self.pos));
        if length == 0 {
            return Ok(0);
        }
        let data = self
            .storage
            .get_partial_values_key(&self.key, &[ByteRange::FromStart(self.pos, Some(length))])
            .map_err(std::io::Error::other)?
            .and_then(|values| values.into_iter().next())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        buf[..data.len()].copy_from_slice(&data);
        self.pos += data.len() as u64;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{store::MemoryStore, WritableStorageTraits};

    use super::*;

    #[test]
    fn storage_value_io() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::new("value").unwrap();
        store.set(&key, (0u8..10).collect::<Vec<_>>().into()).unwrap();

        let mut io = StorageValueIO::new(store.clone(), key).unwrap();
        assert_eq!(io.size(), 10);
        io.seek(SeekFrom::End(-3)).unwrap();
        let mut buf = Vec::new();
        io.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![7, 8, 9]);

        assert!(StorageValueIO::new(store, StoreKey::new("missing").unwrap()).is_err());
    }
}
