//! Reading of single-part checkpoint parquet files.

use std::collections::HashSet;
use std::sync::Arc;

use arrow_array::{Array, BooleanArray, Int64Array, MapArray, RecordBatch, StringArray, StructArray};
use arrow_schema::{Field, Schema, SchemaRef};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tracing::{debug, trace};

use crate::kernel::arrow::extract::{collect_string_map, extract_and_cast_opt, read_str};
use crate::kernel::{Add, Metadata};
use crate::storage::StorageBackend;
use crate::table::config::{CancellationToken, FormatSettings};
use crate::{DeltaResult, DeltaTableError};

const ADD_COLUMN: &str = "add";
const REMOVE_COLUMN: &str = "remove";
const METADATA_COLUMN: &str = "metaData";

/// Number of top-level columns read to replay file actions.
const FILE_ACTION_COLUMNS: [&str; 2] = [ADD_COLUMN, REMOVE_COLUMN];

/// The schema of a checkpoint with every top-level column nullable.
///
/// Writers do not mark nullability of action columns consistently, while any single row only
/// ever carries one action.
pub fn force_nullable(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|field| field.as_ref().clone().with_nullable(true))
        .collect();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// A single-part checkpoint file held in memory.
#[derive(Debug, Clone)]
pub struct CheckpointReader {
    path: String,
    data: Bytes,
}

impl CheckpointReader {
    /// Read the checkpoint at `path`.
    pub fn try_new(storage: &dyn StorageBackend, path: &str) -> DeltaResult<Self> {
        let data = storage.get_obj(path)?;
        Ok(Self::from_bytes(path, Bytes::from(data)))
    }

    /// Use checkpoint content already in memory.
    pub fn from_bytes(path: impl Into<String>, data: Bytes) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Decode the batches of the given top-level columns, with every column nullable.
    ///
    /// Returns the batches and the subset of `columns` present in the file.
    fn read_columns(&self, columns: &[&str]) -> DeltaResult<(Vec<RecordBatch>, Vec<String>)> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.data.clone())?;

        let mut indices = Vec::new();
        let mut found = Vec::new();
        for (idx, field) in builder.schema().fields().iter().enumerate() {
            if columns.contains(&field.name().as_str()) {
                indices.push(idx);
                found.push(field.name().clone());
            }
        }
        if indices.is_empty() {
            return Ok((Vec::new(), found));
        }

        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        let reader = builder.with_projection(mask).build()?;
        let batches = reader
            .map(|batch| {
                let batch = batch?;
                let schema = force_nullable(batch.schema_ref());
                Ok(batch.with_schema(schema)?)
            })
            .collect::<DeltaResult<Vec<_>>>()?;
        Ok((batches, found))
    }

    /// All add actions stored in the checkpoint, in file order.
    ///
    /// Rows whose `add.path` is null or empty are skipped. A path that occurs twice fails the
    /// read with [`DeltaTableError::DuplicateCheckpointEntry`].
    pub fn add_actions(
        &self,
        settings: &FormatSettings,
        cancellation: &CancellationToken,
    ) -> DeltaResult<Vec<Add>> {
        let (batches, found) = self.read_columns(&FILE_ACTION_COLUMNS)?;
        if found.len() != FILE_ACTION_COLUMNS.len() && !settings.allow_missing_columns {
            return Err(DeltaTableError::CheckpointShape {
                found: found.len(),
                expected: FILE_ACTION_COLUMNS.len(),
            });
        }
        debug!(path = %self.path, columns = ?found, batches = batches.len(), "reading checkpoint");

        let mut seen = HashSet::new();
        let mut adds = Vec::new();
        for batch in &batches {
            let Some(add) = extract_and_cast_opt::<StructArray>(batch, ADD_COLUMN) else {
                continue;
            };
            let paths = extract_and_cast_opt::<StringArray>(batch, "add.path").ok_or_else(|| {
                DeltaTableError::CheckpointShape {
                    found: found.len(),
                    expected: FILE_ACTION_COLUMNS.len(),
                }
            })?;
            let partition_values = extract_and_cast_opt::<MapArray>(batch, "add.partitionValues");
            let sizes = extract_and_cast_opt::<Int64Array>(batch, "add.size");
            let modification_times =
                extract_and_cast_opt::<Int64Array>(batch, "add.modificationTime");
            let data_changes = extract_and_cast_opt::<BooleanArray>(batch, "add.dataChange");

            for idx in 0..batch.num_rows() {
                if cancellation.is_cancelled() {
                    return Err(DeltaTableError::Cancelled);
                }
                if add.is_null(idx) {
                    continue;
                }
                let path = match read_str(paths, idx) {
                    Some(path) if !path.is_empty() => path,
                    _ => continue,
                };
                if !seen.insert(path.to_string()) {
                    return Err(DeltaTableError::DuplicateCheckpointEntry(path.to_string()));
                }
                trace!(path, "checkpoint add");

                adds.push(Add {
                    path: path.to_string(),
                    partition_values: partition_values
                        .map(|map| collect_string_map(map, idx))
                        .transpose()?
                        .unwrap_or_default(),
                    size: sizes
                        .filter(|arr| arr.is_valid(idx))
                        .map(|arr| arr.value(idx))
                        .unwrap_or_default(),
                    modification_time: modification_times
                        .filter(|arr| arr.is_valid(idx))
                        .map(|arr| arr.value(idx))
                        .unwrap_or_default(),
                    data_change: data_changes
                        .filter(|arr| arr.is_valid(idx))
                        .map(|arr| arr.value(idx))
                        .unwrap_or_default(),
                    stats: None,
                });
            }
        }
        Ok(adds)
    }

    /// The table metadata stored in the checkpoint, if the checkpoint carries one.
    pub fn metadata(&self) -> DeltaResult<Option<Metadata>> {
        let (batches, _) = self.read_columns(&[METADATA_COLUMN])?;
        for batch in &batches {
            let Some(metadata) = extract_and_cast_opt::<StructArray>(batch, METADATA_COLUMN) else {
                continue;
            };
            let Some(schema_strings) =
                extract_and_cast_opt::<StringArray>(batch, "metaData.schemaString")
            else {
                continue;
            };
            let ids = extract_and_cast_opt::<StringArray>(batch, "metaData.id");

            for idx in 0..batch.num_rows() {
                if metadata.is_null(idx) {
                    continue;
                }
                if let Some(schema_string) = read_str(schema_strings, idx) {
                    return Ok(Some(Metadata {
                        id: ids
                            .and_then(|arr| read_str(arr, idx))
                            .unwrap_or_default()
                            .to_string(),
                        schema_string: schema_string.to_string(),
                        ..Default::default()
                    }));
                }
            }
        }
        Ok(None)
    }
}
