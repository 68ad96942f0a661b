//! Create or load DeltaTables

use tracing::{debug, trace};

use super::config::{ParseContext, TableConfig};
use super::state::{DeltaTableState, Snapshot};
use crate::protocol::checkpoints::CheckpointReader;
use crate::protocol::commits::CommitActions;
use crate::protocol::{
    checkpoint_file_name, commit_file_name, commit_version, log_dir, read_last_checkpoint,
};
use crate::storage::join_path;
use crate::{DeltaResult, DeltaTableError};

/// Reconstructs the latest snapshot of a table from its transaction log.
///
/// Replay starts from the checkpoint named by `_last_checkpoint` when there is one, followed by
/// every consecutive commit after it. Without a checkpoint, all commits in the log directory are
/// replayed in version order.
#[derive(Debug)]
pub struct SnapshotBuilder<'a, C: TableConfig + ?Sized> {
    config: &'a C,
    context: &'a ParseContext,
}

impl<'a, C: TableConfig + ?Sized> SnapshotBuilder<'a, C> {
    /// Builder for the table `config` names, reading through `context`
    pub fn new(config: &'a C, context: &'a ParseContext) -> Self {
        Self { config, context }
    }

    fn check_cancelled(&self) -> DeltaResult<()> {
        if self.context.cancellation().is_cancelled() {
            return Err(DeltaTableError::Cancelled);
        }
        Ok(())
    }

    /// Replay the log and return the resulting snapshot.
    pub fn build(&self) -> DeltaResult<Snapshot> {
        let table_root = self.config.table_path();
        let log_dir = log_dir(table_root);
        let storage = self.context.storage();
        let mut state = DeltaTableState::new(
            table_root,
            self.context.format_settings(),
            self.context.time_zone(),
        );

        match read_last_checkpoint(storage, &log_dir)? {
            Some(checkpoint) => {
                let version = checkpoint.version;
                trace!(version, "found checkpoint");
                self.check_cancelled()?;
                self.load_checkpoint(&mut state, &log_dir, version)?;
                state.set_version(version);

                let first = version + 1;
                let mut next = first;
                loop {
                    self.check_cancelled()?;
                    let path = join_path(&log_dir, &commit_file_name(next));
                    if !storage.exists(&path)? {
                        break;
                    }
                    self.apply_commit(&mut state, &path)?;
                    state.set_version(next);
                    next += 1;
                }
                if next > first {
                    trace!(
                        "Processed metadata files from checkpoint {} to {}",
                        first,
                        next - 1
                    );
                } else {
                    trace!(version, "no commits after checkpoint");
                }
            }
            None => {
                let commits = storage
                    .list(&log_dir, ".json")?
                    .into_iter()
                    .filter_map(|path| commit_version(&path).map(|version| (version, path)));
                for (version, path) in commits {
                    self.check_cancelled()?;
                    self.apply_commit(&mut state, &path)?;
                    state.set_version(version);
                }
            }
        }

        let snapshot = state.into_snapshot();
        debug!(
            table = table_root,
            version = ?snapshot.version(),
            files = snapshot.data_files().len(),
            "loaded delta table snapshot"
        );
        Ok(snapshot)
    }

    fn load_checkpoint(
        &self,
        state: &mut DeltaTableState<'_>,
        log_dir: &str,
        version: i64,
    ) -> DeltaResult<()> {
        let path = join_path(log_dir, &checkpoint_file_name(version));
        let reader = CheckpointReader::try_new(self.context.storage(), &path)?;
        if let Some(metadata) = reader.metadata()? {
            state.process_action(metadata.into())?;
        }
        let adds = reader.add_actions(self.context.format_settings(), self.context.cancellation())?;
        debug!(
            path = %path,
            files = adds.len(),
            columns = state.schema().len(),
            "loaded checkpoint"
        );
        state.load_checkpoint_adds(adds)
    }

    fn apply_commit(&self, state: &mut DeltaTableState<'_>, path: &str) -> DeltaResult<()> {
        trace!(path, "reading commit");
        for action in CommitActions::try_new(self.context.storage(), path)? {
            state.process_action(action?)?;
        }
        Ok(())
    }
}
