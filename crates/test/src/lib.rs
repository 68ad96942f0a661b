#![allow(missing_docs)]
use std::fs;
use std::sync::Arc;

use deltalake_metadata::kernel::{Action, Metadata, StructField, StructType};
use deltalake_metadata::protocol::{
    checkpoint_file_name, commit_file_name, LastCheckpoint, DELTA_LOG_DIR,
    LAST_CHECKPOINT_FILE_NAME,
};
use deltalake_metadata::storage::{join_path, FileStorageBackend, StorageBackend};
use deltalake_metadata::ParseContext;
use tempfile::TempDir;

pub mod checkpoint;
pub mod logs;
pub mod memory;

pub use checkpoint::CheckpointBuilder;
pub use logs::CapturedLogs;
pub use memory::{MemoryStorage, StorageCall};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + 'static>>;

/// Render actions as the body of a commit file, one action per line.
pub fn commit_body(actions: &[Action]) -> String {
    let mut body = String::new();
    for action in actions {
        body.push_str(&serde_json::to_string(action).unwrap());
        body.push('\n');
    }
    body
}

/// A metaData action declaring `fields`.
pub fn metadata(fields: Vec<StructField>, partition_columns: &[&str]) -> Metadata {
    Metadata::new(
        &StructType::new(fields),
        partition_columns.iter().copied(),
    )
    .unwrap()
}

enum Sink {
    Memory(Arc<MemoryStorage>),
    Local(TempDir),
}

/// A Delta table written piece by piece, either in memory or in a temporary directory.
pub struct TestTable {
    root: String,
    sink: Sink,
}

impl TestTable {
    /// A table rooted at `root` in a fresh [`MemoryStorage`].
    pub fn memory(root: &str) -> Self {
        Self {
            root: root.to_string(),
            sink: Sink::Memory(Arc::new(MemoryStorage::new())),
        }
    }

    /// A table in a fresh temporary directory on the local filesystem.
    pub fn local() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        fs::create_dir_all(dir.path().join(DELTA_LOG_DIR)).unwrap();
        Self {
            root,
            sink: Sink::Local(dir),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn log_path(&self, name: &str) -> String {
        join_path(&join_path(&self.root, DELTA_LOG_DIR), name)
    }

    /// The in-memory storage, for inspecting recorded calls.
    pub fn memory_storage(&self) -> Option<Arc<MemoryStorage>> {
        match &self.sink {
            Sink::Memory(storage) => Some(storage.clone()),
            Sink::Local(_) => None,
        }
    }

    pub fn storage(&self) -> Arc<dyn StorageBackend> {
        match &self.sink {
            Sink::Memory(storage) => storage.clone(),
            Sink::Local(_) => Arc::new(FileStorageBackend::new()),
        }
    }

    pub fn context(&self) -> ParseContext {
        ParseContext::new(self.storage())
    }

    /// Store `data` at `name` inside the log directory.
    pub fn put_log_file(&self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match &self.sink {
            Sink::Memory(storage) => storage.put(self.log_path(name), data),
            Sink::Local(dir) => {
                fs::write(dir.path().join(DELTA_LOG_DIR).join(name), data).unwrap()
            }
        }
    }

    pub fn remove_log_file(&self, name: &str) {
        match &self.sink {
            Sink::Memory(storage) => storage.delete(&self.log_path(name)),
            Sink::Local(dir) => {
                fs::remove_file(dir.path().join(DELTA_LOG_DIR).join(name)).unwrap()
            }
        }
    }

    /// Write the commit for `version`.
    pub fn commit(&self, version: i64, actions: &[Action]) {
        self.put_log_file(&commit_file_name(version), commit_body(actions));
    }

    /// Write the checkpoint for `version` and point `_last_checkpoint` at it.
    pub fn checkpoint(&self, version: i64, checkpoint: &CheckpointBuilder) {
        self.put_log_file(
            &checkpoint_file_name(version),
            checkpoint.to_parquet().unwrap(),
        );
        self.last_checkpoint(&LastCheckpoint::new(version));
    }

    pub fn last_checkpoint(&self, pointer: &LastCheckpoint) {
        self.put_log_file(
            LAST_CHECKPOINT_FILE_NAME,
            serde_json::to_vec(pointer).unwrap(),
        );
    }

    /// Full path of a data file of this table.
    pub fn data_file(&self, path: &str) -> String {
        join_path(&self.root, path)
    }
}
