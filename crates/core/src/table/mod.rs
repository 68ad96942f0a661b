//! Delta Table read structures

pub mod builder;
pub mod config;
pub mod state;

use self::builder::SnapshotBuilder;
use self::config::{ParseContext, TableConfig};
use self::state::Snapshot;
use crate::DeltaResult;

/// Parse the transaction log of the table `config` names and return its latest snapshot.
///
/// Every call replays the log from storage. When the context carries a log dispatcher, all
/// records emitted during the parse go to it.
pub fn parse<C: TableConfig + ?Sized>(config: &C, context: &ParseContext) -> DeltaResult<Snapshot> {
    let builder = SnapshotBuilder::new(config, context);
    match context.dispatch() {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, || builder.build()),
        None => builder.build(),
    }
}
