//! Read-side Delta Lake transaction log parser
//!
//! Given the root of a Delta table, replays its transaction log (starting from the last
//! checkpoint when there is one) and returns the current snapshot: the table schema resolved to
//! engine types, the set of active data files and the partition values of each file.
//!
//! # Usage
//!
//! Parse a table on the local filesystem:
//!
//! ```rust,no_run
//! use deltalake_metadata::{parse, ParseContext};
//!
//! let snapshot = parse("/data/events", &ParseContext::default()).unwrap();
//! for file in snapshot.data_files() {
//!     println!("{file}");
//! }
//! ```
//!
//! Parse a table in any [`object_store`] backed store:
//!
//! ```rust
//! use std::sync::Arc;
//! use deltalake_metadata::storage::ObjectStoreBackend;
//! use deltalake_metadata::{parse, ParseContext};
//! use object_store::memory::InMemory;
//!
//! let storage = ObjectStoreBackend::try_new(Arc::new(InMemory::new())).unwrap();
//! let context = ParseContext::new(Arc::new(storage));
//! let snapshot = parse("events", &context).unwrap();
//! assert!(snapshot.data_files().is_empty());
//! ```

#![deny(missing_docs)]

pub mod errors;
pub mod kernel;
pub mod protocol;
pub mod storage;
pub mod table;

pub use self::errors::*;
pub use self::table::config::{
    CancellationToken, DateTimeOverflowBehavior, DeltaTableConfig, FormatSettings, ParseContext,
    TableConfig,
};
pub use self::table::parse;
pub use self::table::state::{PartitionColumn, Snapshot};
pub use object_store;
