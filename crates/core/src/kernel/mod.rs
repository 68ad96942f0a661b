//! Delta Kernel module
//!
//! The Kernel module contains all the logic for reading the state of a Delta table: the actions
//! stored in the log, the table schema and the engine types it resolves to.

pub mod arrow;
pub mod models;
pub mod scalars;
pub mod schema;

pub use models::*;
pub use scalars::*;
pub use schema::*;
