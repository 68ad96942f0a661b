//! Layout of the Delta transaction log on storage, and the `_last_checkpoint` pointer.
//!
//! Commit files are named after their version, zero-padded to 20 digits, so listing the log
//! directory in lexicographic order yields commits in version order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{join_path, StorageBackend, StorageError};
use crate::{DeltaResult, DeltaTableError};

pub mod checkpoints;
pub mod commits;

/// Name of the directory holding the transaction log, relative to the table root.
pub const DELTA_LOG_DIR: &str = "_delta_log";

/// Name of the checkpoint pointer file inside the log directory.
pub const LAST_CHECKPOINT_FILE_NAME: &str = "_last_checkpoint";

/// Width versions are zero-padded to in log file names.
pub const VERSION_WIDTH: usize = 20;

/// File name of the commit for `version`.
pub fn commit_file_name(version: i64) -> String {
    format!("{version:020}.json")
}

/// File name of the single-part checkpoint for `version`.
pub fn checkpoint_file_name(version: i64) -> String {
    format!("{version:020}.checkpoint.parquet")
}

/// Location of the log directory of the table at `table_root`.
pub fn log_dir(table_root: &str) -> String {
    join_path(table_root, DELTA_LOG_DIR)
}

/// Parse the version of a commit file, given its file name or full path.
///
/// Only plain commits (`<20 digits>.json`) qualify; compacted logs and other `.json` files
/// placed in the log directory return `None`.
pub fn commit_version(path: &str) -> Option<i64> {
    let name = crate::storage::basename(path);
    let digits = name.strip_suffix(".json")?;
    if digits.len() != VERSION_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Contents of the `_last_checkpoint` file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastCheckpoint {
    /// The version of the table when the last checkpoint was made.
    pub version: i64,
    /// The number of actions that are stored in the checkpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// The number of fragments if the last checkpoint was written in multiple parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<u32>,
    /// The number of bytes of the checkpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_in_bytes: Option<i64>,
    /// The number of AddFile actions in the checkpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_of_add_files: Option<i64>,
}

impl LastCheckpoint {
    /// A pointer to a single-part checkpoint at `version`.
    pub fn new(version: i64) -> Self {
        Self {
            version,
            size: None,
            parts: None,
            size_in_bytes: None,
            num_of_add_files: None,
        }
    }
}

/// Read the `_last_checkpoint` pointer of the log at `log_dir`.
///
/// Returns `None` when there is no pointer, or when it points at version 0, which never
/// carries a usable checkpoint.
pub fn read_last_checkpoint(
    storage: &dyn StorageBackend,
    log_dir: &str,
) -> DeltaResult<Option<LastCheckpoint>> {
    let path = join_path(log_dir, LAST_CHECKPOINT_FILE_NAME);
    if !storage.exists(&path)? {
        return Ok(None);
    }
    let data = match storage.get_obj(&path) {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let checkpoint: LastCheckpoint = match commits::JsonObjects::new(&data).next() {
        Some((_, Ok(checkpoint))) => checkpoint,
        Some((_, Err(err))) => return Err(DeltaTableError::InvalidLastCheckpoint(err.to_string())),
        None => {
            return Err(DeltaTableError::InvalidLastCheckpoint(
                "no JSON object found".to_string(),
            ))
        }
    };

    if checkpoint.version < 0 {
        return Err(DeltaTableError::InvalidLastCheckpoint(format!(
            "negative version {}",
            checkpoint.version
        )));
    }
    if checkpoint.version == 0 {
        debug!("_last_checkpoint points at version 0, replaying the full log");
        return Ok(None);
    }
    if let Some(parts) = checkpoint.parts.filter(|parts| *parts > 1) {
        return Err(DeltaTableError::MultiPartCheckpoint {
            version: checkpoint.version,
            parts,
        });
    }
    Ok(Some(checkpoint))
}
