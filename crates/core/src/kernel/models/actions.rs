use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::schema::StructType;
use crate::DeltaResult;

/// Defines a file format used in table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Name of the encoding for files in this table
    pub provider: String,
    /// A map containing configuration options for the format
    #[serde(default)]
    pub options: HashMap<String, Option<String>>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            provider: "parquet".to_string(),
            options: HashMap::new(),
        }
    }
}

/// Defines a metadata action
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Unique identifier for this table
    #[serde(default)]
    pub id: String,
    /// User-provided identifier for this table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// User-provided description for this table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Specification of the encoding for the files stored in the table
    #[serde(default)]
    pub format: Format,
    /// Schema of the table
    pub schema_string: String,
    /// Column names by which the data should be partitioned
    #[serde(default)]
    pub partition_columns: Vec<String>,
    /// The time when this metadata action is created, in milliseconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    /// Configuration options for the metadata action
    #[serde(default)]
    pub configuration: HashMap<String, Option<String>>,
}

impl Metadata {
    /// Create a new metadata action carrying the given schema
    pub fn new(
        schema: &StructType,
        partition_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> DeltaResult<Self> {
        Ok(Self {
            schema_string: serde_json::to_string(schema)
                .map_err(|e| crate::DeltaTableError::InvalidSchema(e.to_string()))?,
            partition_columns: partition_columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    /// Parse the table schema embedded in this action
    pub fn schema(&self) -> DeltaResult<StructType> {
        StructType::from_schema_string(&self.schema_string)
    }
}

/// Defines a protocol action
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    /// The minimum version of the Delta read protocol that a client must implement
    /// in order to correctly read this table
    pub min_reader_version: i32,
    /// The minimum version of the Delta write protocol that a client must implement
    /// in order to correctly write this table
    pub min_writer_version: i32,
    /// A collection of features that a client must implement in order to correctly
    /// read this table (exist only when minReaderVersion is set to 3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader_features: Option<Vec<String>>,
    /// A collection of features that a client must implement in order to correctly
    /// write this table (exist only when minWriterVersion is set to 7)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_features: Option<Vec<String>>,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            min_reader_version: 1,
            min_writer_version: 2,
            reader_features: None,
            writer_features: None,
        }
    }
}

/// Provenance of a commit. Writers store arbitrary data here; only the common fields are typed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Timestamp in millis when the commit was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// The operation performed by the commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Additional provenance information for the commit
    #[serde(flatten, default)]
    pub info: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
/// Defines an add action
pub struct Add {
    /// A relative path to a data file from the root of the table or an absolute path to a file
    /// that should be added to the table.
    pub path: String,

    /// A map from partition column to value for this logical file, in the order the writer
    /// recorded them.
    #[serde(default)]
    pub partition_values: IndexMap<String, Option<String>>,

    /// The size of this data file in bytes
    #[serde(default)]
    pub size: i64,

    /// The time this logical file was created, as milliseconds since the epoch.
    #[serde(default)]
    pub modification_time: i64,

    /// When `false` the logical file must already be present in the table or the records
    /// in the added file must be contained in one or more remove actions in the same version.
    #[serde(default)]
    pub data_change: bool,

    /// Contains statistics (e.g., count, min/max values for columns) about the data in this logical file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
}

impl Add {
    /// Create an add action for a data file
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data_change: true,
            ..Default::default()
        }
    }

    /// Set the partition values of this file
    pub fn with_partition_values(
        mut self,
        values: impl IntoIterator<Item = (impl Into<String>, Option<impl Into<String>>)>,
    ) -> Self {
        self.partition_values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.map(Into::into)))
            .collect();
        self
    }
}

/// Represents a tombstone (deleted file) in the Delta log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Remove {
    /// A relative path to a data file from the root of the table or an absolute path to a file
    /// that should be removed from the table.
    pub path: String,
    /// The time this logical file was created, as milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<i64>,
    /// When `false` the records in the removed file must be contained in one or more add
    /// file actions in the same version.
    #[serde(default)]
    pub data_change: bool,
    /// When true the fields `partition_values`, `size`, and `tags` are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_file_metadata: Option<bool>,
    /// A map from partition column to value for this logical file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_values: Option<IndexMap<String, Option<String>>>,
    /// The size of this data file in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl Remove {
    /// Create a remove action for a data file
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data_change: true,
            ..Default::default()
        }
    }
}

/// Action used by streaming systems to track progress using application-specific versions to
/// enable idempotency.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// A unique identifier for the application performing the transaction.
    pub app_id: String,

    /// An application-specific numeric identifier for this transaction.
    pub version: i64,

    /// The time when this transaction action was created in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}
