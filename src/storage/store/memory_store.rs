//! An in-memory store.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    byte_range::{extract_byte_ranges, ByteRange},
    storage::{
        Bytes, ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StoreKeys,
        StorePrefix, WritableStorageTraits,
    },
};

/// An in-memory store.
///
/// Values are held behind per-key locks, so a value is replaced atomically with respect to concurrent readers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: Mutex<BTreeMap<StoreKey, Arc<RwLock<Bytes>>>>,
}

impl MemoryStore {
    /// Create a new, empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn value(&self, key: &StoreKey) -> Option<Arc<RwLock<Bytes>>> {
        self.data_map.lock().get(key).cloned()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let value = value.read();
        Ok(Some(
            extract_byte_ranges(&value, byte_ranges)?
                .into_iter()
                .map(Bytes::from)
                .collect(),
        ))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        Ok(self.value(key).map(|value| value.read().len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let entry = self
            .data_map
            .lock()
            .entry(key.clone())
            .or_default()
            .clone();
        *entry.write() = value;
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.data_map.lock().remove(key);
        Ok(())
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.data_map.lock().retain(|key, _| !key.has_prefix(prefix));
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self
            .data_map
            .lock()
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a/b").unwrap();
        assert!(store.get(&key).unwrap().is_none());
        store.set(&key, Bytes::from_static(&[0, 1, 2, 3])).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(store.size_key(&key).unwrap(), Some(4));
        assert_eq!(
            store
                .get_partial_values_key(&key, &[ByteRange::FromEnd(0, Some(2))])
                .unwrap()
                .unwrap(),
            vec![Bytes::from_static(&[2, 3])]
        );
        assert!(store
            .get_partial_values_key(&key, &[ByteRange::FromStart(3, Some(2))])
            .is_err());

        store.set(&StoreKey::new("a/c").unwrap(), Bytes::new()).unwrap();
        store.set(&StoreKey::new("b").unwrap(), Bytes::new()).unwrap();
        assert_eq!(
            store.list_prefix(&StorePrefix::new("a/").unwrap()).unwrap(),
            vec![StoreKey::new("a/b").unwrap(), StoreKey::new("a/c").unwrap()]
        );
        store.erase_prefix(&StorePrefix::new("a/").unwrap()).unwrap();
        assert_eq!(store.list().unwrap(), vec![StoreKey::new("b").unwrap()]);
        store.erase(&StoreKey::new("b").unwrap()).unwrap();
        store.erase(&StoreKey::new("b").unwrap()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
