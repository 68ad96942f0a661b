//! Blocking adapter over any [`ObjectStore`], so cloud and in-memory stores can back a parse.
use std::io::Read;
use std::sync::Arc;

use ::object_store::path::Path;
use ::object_store::{DynObjectStore, Error as ObjectStoreError, ObjectStore};
use bytes::Buf;
use tokio::runtime;

use super::{join_path, StorageBackend, StorageError};

/// Storage backend driving an async [`ObjectStore`] on a private current-thread runtime.
///
/// Every call blocks the calling thread until the store answers, so this must not be used from
/// within an async context.
#[derive(Debug)]
pub struct ObjectStoreBackend {
    store: Arc<DynObjectStore>,
    rt: runtime::Runtime,
}

impl ObjectStoreBackend {
    /// Wrap an object store.
    pub fn try_new(store: Arc<DynObjectStore>) -> Result<Self, StorageError> {
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StorageError::Runtime)?;
        Ok(Self { store, rt })
    }
}

fn to_location(path: &str) -> Result<Path, StorageError> {
    Path::parse(path).map_err(|source| StorageError::InvalidPath {
        path: path.to_string(),
        source,
    })
}

fn map_not_found(path: &str, err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
        source => StorageError::ObjectStore { source },
    }
}

impl StorageBackend for ObjectStoreBackend {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let location = to_location(path)?;
        match self.rt.block_on(self.store.head(&location)) {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(source) => Err(StorageError::ObjectStore { source }),
        }
    }

    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = to_location(dir)?;
        let listing = match self.rt.block_on(self.store.list_with_delimiter(Some(&prefix))) {
            Ok(listing) => listing,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::ObjectStore { source }),
        };

        let mut paths: Vec<String> = listing
            .objects
            .iter()
            .filter_map(|meta| meta.location.filename())
            .filter(|name| name.ends_with(suffix))
            .map(|name| join_path(dir, name))
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, StorageError> {
        let location = to_location(path)?;
        let bytes = self
            .rt
            .block_on(async {
                let result = self.store.get(&location).await?;
                result.bytes().await
            })
            .map_err(|e| map_not_found(path, e))?;
        Ok(Box::new(bytes.reader()))
    }
}

#[cfg(test)]
mod tests {
    use ::object_store::memory::InMemory;
    use ::object_store::PutPayload;

    use super::*;

    fn backend_with(files: &[(&str, &str)]) -> ObjectStoreBackend {
        let store = Arc::new(InMemory::new());
        let rt = runtime::Builder::new_current_thread().build().unwrap();
        for (path, content) in files {
            rt.block_on(store.put(&Path::from(*path), PutPayload::from(content.to_string())))
                .unwrap();
        }
        ObjectStoreBackend::try_new(store).unwrap()
    }

    #[test]
    fn test_exists_and_open() {
        let backend = backend_with(&[("table/_delta_log/_last_checkpoint", r#"{"version":3}"#)]);

        assert!(backend.exists("table/_delta_log/_last_checkpoint").unwrap());
        assert!(!backend.exists("table/_delta_log/00000000000000000004.json").unwrap());

        let content = backend.get_obj("table/_delta_log/_last_checkpoint").unwrap();
        assert_eq!(content, br#"{"version":3}"#.to_vec());

        let err = backend
            .open("table/_delta_log/00000000000000000004.json")
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_list_is_shallow_and_sorted() {
        let backend = backend_with(&[
            ("table/_delta_log/00000000000000000001.json", "{}"),
            ("table/_delta_log/00000000000000000000.json", "{}"),
            ("table/_delta_log/_commits/00000000000000000002.uuid.json", "{}"),
            ("table/_delta_log/00000000000000000001.checkpoint.parquet", ""),
        ]);

        let listed = backend.list("table/_delta_log", ".json").unwrap();
        assert_eq!(
            listed,
            vec![
                "table/_delta_log/00000000000000000000.json".to_string(),
                "table/_delta_log/00000000000000000001.json".to_string(),
            ]
        );
        assert!(backend.list("other/_delta_log", ".json").unwrap().is_empty());
    }
}
