//! Local file storage backend. This backend reads objects from the local filesystem.
use std::fs;
use std::io::{BufReader, Read};

use super::{join_path, StorageBackend, StorageError};

/// Backend that resolves paths directly against the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileStorageBackend {}

impl FileStorageBackend {
    /// Create a new filesystem backend.
    pub fn new() -> Self {
        Self {}
    }
}

impl StorageBackend for FileStorageBackend {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(path, e)),
        }
    }

    fn list(&self, dir: &str, suffix: &str) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_io(dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| StorageError::from_io(dir, e))?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(suffix) {
                    paths.push(join_path(dir, name));
                }
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, StorageError> {
        let file = fs::File::open(path).map_err(|e| StorageError::from_io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
