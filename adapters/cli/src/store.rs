//! Key-value store persisted as a JSON object on disk.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use merge_farm_core::{KeyValueStore, StoreError};
use serde_json::{Number, Value};

/// Store that keeps values in memory and rewrites the backing file on flush.
#[derive(Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read save file at {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse save file at {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    fn malformed(key: &str) -> StoreError {
        StoreError::Malformed {
            key: key.to_owned(),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_int(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| Self::malformed(key)),
        }
    }

    fn get_float(&self, key: &str, default: f64) -> Result<f64, StoreError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| Self::malformed(key)),
        }
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        let _ = self.values.insert(key.to_owned(), Value::from(value));
        self.dirty = true;
        Ok(())
    }

    fn set_float(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        let number = Number::from_f64(value).ok_or_else(|| Self::malformed(key))?;
        let _ = self.values.insert(key.to_owned(), Value::Number(number));
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let contents = serde_json::to_string_pretty(&self.values)
            .map_err(|error| StoreError::Unavailable(error.to_string()))?;
        fs::write(&self.path, contents).map_err(|error| {
            StoreError::Unavailable(format!("{}: {error}", self.path.display()))
        })?;
        self.dirty = false;
        Ok(())
    }
}
