//! In-process key-value store used by tests and headless runs.

use std::collections::BTreeMap;

use merge_farm_core::{KeyValueStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq)]
enum StoredValue {
    Int(i64),
    Float(f64),
}

/// Key-value store backed by an ordered map.
///
/// Reading a key through the accessor of the other numeric kind is reported as
/// malformed.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
    flushes: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of successful flushes.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(StoredValue::Int(value)) => Ok(*value),
            Some(StoredValue::Float(_)) => Err(StoreError::Malformed {
                key: key.to_owned(),
            }),
        }
    }

    fn get_float(&self, key: &str, default: f64) -> Result<f64, StoreError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(StoredValue::Float(value)) => Ok(*value),
            Some(StoredValue::Int(_)) => Err(StoreError::Malformed {
                key: key.to_owned(),
            }),
        }
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        let _ = self.values.insert(key.to_owned(), StoredValue::Int(value));
        Ok(())
    }

    fn set_float(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        let _ = self.values.insert(key.to_owned(), StoredValue::Float(value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let _ = self.values.remove(key);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}
