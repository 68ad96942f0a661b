//! Storage backend abstraction layer for reading Delta Table transaction logs

use std::fmt::Debug;
use std::io::Read;

pub mod file;
pub mod object_store;

pub use self::file::FileStorageBackend;
pub use self::object_store::ObjectStoreBackend;

/// Error enum returned when storage backend interaction fails.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Local filesystem interaction failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The path could not be expressed as an object store location.
    #[error("Invalid object store path {path}: {source}")]
    InvalidPath {
        /// Path as given by the caller
        path: String,
        /// Reason the path was rejected
        source: ::object_store::path::Error,
    },

    /// Object store interaction failed.
    #[error("ObjectStore interaction failed: {source}")]
    ObjectStore {
        /// Wrapped object store error
        #[from]
        source: ::object_store::Error,
    },

    /// The runtime driving an async object store could not be created.
    #[error("Failed to start storage runtime: {0}")]
    Runtime(std::io::Error),
}

impl StorageError {
    pub(crate) fn from_io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io {
                path: path.to_string(),
                source,
            },
        }
    }
}

/// Read-only access to the objects a Delta table is made of.
///
/// Paths are plain strings rooted at the table location the caller configured; backends decide
/// how to resolve them. Implementations must be safe to share between parses.
pub trait StorageBackend: Send + Sync + Debug {
    /// Check whether an object exists at `path`. Only transport failures are errors.
    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// List objects directly under `dir` whose names end with `suffix`.
    ///
    /// Returned paths are `dir/<name>`, sorted lexicographically. A missing directory yields an
    /// empty list.
    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>, StorageError>;

    /// Open the object at `path` for reading. The reader is released when dropped.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, StorageError>;

    /// Read the whole object at `path`.
    fn get_obj(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|source| StorageError::from_io(path, source))?;
        Ok(buf)
    }
}

/// Join a relative path onto a table or directory location.
pub fn join_path(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if root.is_empty() {
        return path.to_string();
    }
    format!("{root}/{path}")
}

/// The final path segment, i.e. the file name of a data file.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
