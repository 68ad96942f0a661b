//! Delta table schema and its translation into engine types

pub mod data_type;
#[allow(clippy::module_inception)]
pub mod schema;

pub use data_type::*;
pub use schema::*;
