//! Writes checkpoint parquet files the way Delta writers lay them out: one action per row,
//! one top-level struct column per action type.
use std::sync::Arc;

use arrow_array::builder::{MapBuilder, StringBuilder};
use arrow_array::{Array, ArrayRef, BooleanArray, Int64Array, RecordBatch, StringArray, StructArray};
use arrow_buffer::NullBuffer;
use arrow_schema::{DataType, Field, Fields};
use deltalake_metadata::kernel::{Add, Metadata, Remove};
use parquet::arrow::ArrowWriter;

use crate::TestResult;

#[derive(Debug, Clone)]
enum Row {
    Add(Add),
    Remove(Remove),
    Metadata(Metadata),
}

/// Builder for the content of a single-part checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointBuilder {
    rows: Vec<Row>,
    with_remove_column: bool,
    with_metadata_column: bool,
}

impl Default for CheckpointBuilder {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            with_remove_column: true,
            with_metadata_column: true,
        }
    }
}

impl CheckpointBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, add: Add) -> Self {
        self.rows.push(Row::Add(add));
        self
    }

    pub fn remove(mut self, remove: Remove) -> Self {
        self.rows.push(Row::Remove(remove));
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.rows.push(Row::Metadata(metadata));
        self
    }

    /// Leave out the `remove` column entirely.
    pub fn without_remove_column(mut self) -> Self {
        self.with_remove_column = false;
        self
    }

    /// Leave out the `metaData` column entirely.
    pub fn without_metadata_column(mut self) -> Self {
        self.with_metadata_column = false;
        self
    }

    fn add_column(&self) -> TestResult<ArrayRef> {
        let adds: Vec<Option<&Add>> = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Add(add) => Some(add),
                _ => None,
            })
            .collect();

        let mut partition_values =
            MapBuilder::new(None, StringBuilder::new(), StringBuilder::new());
        for add in &adds {
            match add {
                Some(add) => {
                    for (key, value) in &add.partition_values {
                        partition_values.keys().append_value(key);
                        partition_values.values().append_option(value.as_deref());
                    }
                    partition_values.append(true)?;
                }
                None => partition_values.append(false)?,
            }
        }
        let partition_values = partition_values.finish();

        let fields = Fields::from(vec![
            Field::new("path", DataType::Utf8, true),
            Field::new(
                "partitionValues",
                partition_values.data_type().clone(),
                true,
            ),
            Field::new("size", DataType::Int64, true),
            Field::new("modificationTime", DataType::Int64, true),
            Field::new("dataChange", DataType::Boolean, true),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter(
                adds.iter().map(|a| a.map(|a| a.path.as_str())),
            )),
            Arc::new(partition_values),
            Arc::new(Int64Array::from_iter(adds.iter().map(|a| a.map(|a| a.size)))),
            Arc::new(Int64Array::from_iter(
                adds.iter().map(|a| a.map(|a| a.modification_time)),
            )),
            Arc::new(BooleanArray::from_iter(
                adds.iter().map(|a| a.map(|a| a.data_change)),
            )),
        ];
        let nulls = NullBuffer::from(adds.iter().map(Option::is_some).collect::<Vec<_>>());
        Ok(Arc::new(StructArray::try_new(fields, columns, Some(nulls))?))
    }

    fn remove_column(&self) -> TestResult<ArrayRef> {
        let removes: Vec<Option<&Remove>> = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Remove(remove) => Some(remove),
                _ => None,
            })
            .collect();
        let fields = Fields::from(vec![
            Field::new("path", DataType::Utf8, true),
            Field::new("deletionTimestamp", DataType::Int64, true),
            Field::new("dataChange", DataType::Boolean, true),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter(
                removes.iter().map(|r| r.map(|r| r.path.as_str())),
            )),
            Arc::new(Int64Array::from_iter(
                removes.iter().map(|r| r.and_then(|r| r.deletion_timestamp)),
            )),
            Arc::new(BooleanArray::from_iter(
                removes.iter().map(|r| r.map(|r| r.data_change)),
            )),
        ];
        let nulls = NullBuffer::from(removes.iter().map(Option::is_some).collect::<Vec<_>>());
        Ok(Arc::new(StructArray::try_new(fields, columns, Some(nulls))?))
    }

    fn metadata_column(&self) -> TestResult<ArrayRef> {
        let metadata: Vec<Option<&Metadata>> = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Metadata(metadata) => Some(metadata),
                _ => None,
            })
            .collect();
        let fields = Fields::from(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("schemaString", DataType::Utf8, true),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter(
                metadata.iter().map(|m| m.map(|m| m.id.as_str())),
            )),
            Arc::new(StringArray::from_iter(
                metadata.iter().map(|m| m.map(|m| m.schema_string.as_str())),
            )),
        ];
        let nulls = NullBuffer::from(metadata.iter().map(Option::is_some).collect::<Vec<_>>());
        Ok(Arc::new(StructArray::try_new(fields, columns, Some(nulls))?))
    }

    /// The checkpoint as a record batch.
    pub fn to_batch(&self) -> TestResult<RecordBatch> {
        let mut columns = vec![("add", self.add_column()?)];
        if self.with_remove_column {
            columns.push(("remove", self.remove_column()?));
        }
        if self.with_metadata_column {
            columns.push(("metaData", self.metadata_column()?));
        }
        Ok(RecordBatch::try_from_iter(columns)?)
    }

    /// The checkpoint as parquet file content.
    pub fn to_parquet(&self) -> TestResult<Vec<u8>> {
        let batch = self.to_batch()?;
        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(buffer)
    }
}
