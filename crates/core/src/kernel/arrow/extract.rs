//! Utilities to extract columns from a record batch or nested / complex arrays.

use std::sync::Arc;

use arrow_array::{Array, MapArray, RecordBatch, StringArray, StructArray};
use arrow_schema::{ArrowError, DataType};
use indexmap::IndexMap;

/// Trait to extract a column by name from a record batch or nested / complex array.
pub(crate) trait ProvidesColumnByName {
    fn column_by_name(&self, name: &str) -> Option<&Arc<dyn Array>>;
}

impl ProvidesColumnByName for RecordBatch {
    fn column_by_name(&self, name: &str) -> Option<&Arc<dyn Array>> {
        self.column_by_name(name)
    }
}

impl ProvidesColumnByName for StructArray {
    fn column_by_name(&self, name: &str) -> Option<&Arc<dyn Array>> {
        self.column_by_name(name)
    }
}

/// Extracts a column by dotted path and casts it to the given type array type `T`.
///
/// Returns `None` if the column does not exist or if the column is not of type `T`.
pub(crate) fn extract_and_cast_opt<'a, T: Array + 'static>(
    array: &'a dyn ProvidesColumnByName,
    name: &'a str,
) -> Option<&'a T> {
    let mut path_steps = name.split('.');
    let first = path_steps.next()?;
    extract_column(array, first, &mut path_steps)
        .ok()?
        .as_any()
        .downcast_ref::<T>()
}

pub(crate) fn extract_column<'a>(
    array: &'a dyn ProvidesColumnByName,
    path_step: &str,
    remaining_path_steps: &mut impl Iterator<Item = &'a str>,
) -> Result<&'a Arc<dyn Array>, ArrowError> {
    let child = array
        .column_by_name(path_step)
        .ok_or(ArrowError::SchemaError(format!(
            "No such field: {path_step}",
        )))?;

    if let Some(next_path_step) = remaining_path_steps.next() {
        match child.data_type() {
            DataType::Map(_, _) => {
                // a map has exactly one child, but we want to be agnostic of its name
                let maparr = cast_column_as::<MapArray>(path_step, &Some(child))?;
                extract_column(maparr.entries(), next_path_step, remaining_path_steps)
            }
            _ => extract_column(
                cast_column_as::<StructArray>(path_step, &Some(child))?,
                next_path_step,
                remaining_path_steps,
            ),
        }
    } else {
        Ok(child)
    }
}

pub(crate) fn cast_column_as<'a, T: Array + 'static>(
    name: &str,
    column: &Option<&'a Arc<dyn Array>>,
) -> Result<&'a T, ArrowError> {
    column
        .ok_or(ArrowError::SchemaError(format!("No such column: {name}")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or(ArrowError::SchemaError(format!(
            "{name} is not of expected type."
        )))
}

/// Null-tolerant string accessor.
pub(crate) fn read_str(arr: &StringArray, idx: usize) -> Option<&str> {
    arr.is_valid(idx).then(|| arr.value(idx))
}

/// Collect the string map at row `idx`, keeping the order entries were written in.
pub(crate) fn collect_string_map(
    map: &MapArray,
    idx: usize,
) -> Result<IndexMap<String, Option<String>>, ArrowError> {
    if map.is_null(idx) {
        return Ok(IndexMap::new());
    }
    let entries = map.value(idx);
    let keys = cast_column_as::<StringArray>("key", &Some(entries.column(0)))?;
    let values = cast_column_as::<StringArray>("value", &Some(entries.column(1)))?;
    Ok((0..entries.len())
        .filter_map(|i| {
            read_str(keys, i).map(|k| (k.to_string(), read_str(values, i).map(str::to_string)))
        })
        .collect())
}
