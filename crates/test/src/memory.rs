use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;

use bytes::Bytes;
use deltalake_metadata::storage::{StorageBackend, StorageError};

/// A storage call, as seen by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Exists(String),
    List(String),
    Open(String),
}

/// In-memory storage backend that records every call made against it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, Bytes>>,
    calls: Mutex<Vec<StorageCall>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.into(), data.into());
    }

    pub fn delete(&self, path: &str) {
        self.objects.lock().unwrap().remove(path);
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Paths probed with `exists`, in call order.
    pub fn probed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::Exists(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Paths opened for reading, in call order.
    pub fn opened(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::Open(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StorageCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl StorageBackend for MemoryStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(StorageCall::Exists(path.to_string()));
        Ok(self.objects.lock().unwrap().contains_key(path))
    }

    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>, StorageError> {
        self.record(StorageCall::List(dir.to_string()));
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|path| {
                path.strip_prefix(&prefix)
                    .is_some_and(|name| !name.contains('/') && name.ends_with(suffix))
            })
            .cloned()
            .collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, StorageError> {
        self.record(StorageCall::Open(path.to_string()));
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }
}
