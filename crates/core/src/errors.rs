//! Exceptions for the deltalake-metadata crate
use crate::kernel::DataType;
use crate::storage::StorageError;

/// A result returned by deltalake-metadata
pub type DeltaResult<T, E = DeltaTableError> = Result<T, E>;

/// Coarse classification of a [`DeltaTableError`], used by callers that map failures onto
/// their own error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The table contents on storage are malformed or inconsistent.
    IncorrectData,
    /// The log references something the current state cannot explain.
    LogicalError,
    /// A type name or literal value could not be interpreted.
    BadArguments,
    /// The table uses a feature this reader does not support.
    NotImplemented,
    /// The storage layer failed.
    Transport,
    /// The parse was stopped through its cancellation token.
    Cancelled,
}

/// Delta Table specific error
#[derive(thiserror::Error, Debug)]
pub enum DeltaTableError {
    /// Error returned when a type name in the schema is not a known Delta type.
    #[error("Unknown Delta type: {0}")]
    UnknownType(String),

    /// Error returned when a `decimal(p,s)` descriptor cannot be parsed or is out of range.
    #[error("Malformed decimal type: {0}")]
    MalformedDecimal(String),

    /// Error returned when a partition column has a type that cannot hold partition values.
    #[error("Unsupported partition column type: {0}")]
    UnsupportedPartitionType(DataType),

    /// Error returned when a partition value does not parse as its column's type.
    #[error("Invalid partition value `{value}` for type {data_type}")]
    InvalidPartitionValue {
        /// The raw value taken from `partitionValues`
        value: String,
        /// The column type the value was parsed against
        data_type: DataType,
    },

    /// Error returned when a date or timestamp partition value falls outside the supported range
    /// and overflow behavior is `throw`.
    #[error("Date/time value `{0}` is out of the supported range")]
    DateTimeOverflow(String),

    /// Error returned when an object inside a commit file could not be parsed.
    #[error("Malformed log entry in {path} at byte {offset}: {source}")]
    MalformedLogLine {
        /// Commit file being read
        path: String,
        /// Byte offset of the object that failed
        offset: usize,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Error returned when the `_last_checkpoint` file is not a valid checkpoint pointer.
    #[error("Invalid _last_checkpoint: {0}")]
    InvalidLastCheckpoint(String),

    /// Error returned when `schemaString` of a metaData action is not a valid schema.
    #[error("Invalid table schema: {0}")]
    InvalidSchema(String),

    /// Error returned when the projected checkpoint does not carry both `add` and `remove`.
    #[error("Checkpoint has {found} of the expected {expected} columns (add, remove)")]
    CheckpointShape {
        /// Number of projected columns found
        found: usize,
        /// Number of projected columns expected
        expected: usize,
    },

    /// Error returned when a data file appears more than once in a checkpoint.
    #[error("Data file {0} appears more than once in checkpoint")]
    DuplicateCheckpointEntry(String),

    /// Error returned when partition values name a column the table schema does not have.
    #[error("Partition column {column} for file {file} is not part of the table schema")]
    UnknownPartitionColumn {
        /// Partition column name
        column: String,
        /// Data file carrying the partition value
        file: String,
    },

    /// Error returned when a later metaData action carries a schema different from the first.
    #[error("Schema evolution is not supported: schema changed from {previous} to {current}")]
    SchemaEvolutionUnsupported {
        /// Schema in effect before the change
        previous: String,
        /// Schema announced by the later metaData action
        current: String,
    },

    /// Error returned when `_last_checkpoint` points at a multi-part checkpoint.
    #[error("Multi-part checkpoints are not supported (version {version}, {parts} parts)")]
    MultiPartCheckpoint {
        /// Checkpoint version
        version: i64,
        /// Number of parts
        parts: u32,
    },

    /// Error returned when reading the checkpoint parquet file fails.
    #[error("Failed to read checkpoint parquet: {source}")]
    Parquet {
        /// Parquet error details returned when reading the checkpoint failed.
        #[from]
        source: parquet::errors::ParquetError,
    },

    /// Error returned when converting or accessing arrow data fails.
    #[error("Failed to convert into Arrow schema: {source}")]
    Arrow {
        /// Arrow error details returned when converting the schema in Arrow format failed
        #[from]
        source: arrow_schema::ArrowError,
    },

    /// Error returned when a configuration option is invalid.
    #[error("Invalid table option {key}: {message}")]
    InvalidOption {
        /// Option name
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// Error returned when the storage backend fails.
    #[error("Failed to read delta log object: {source}")]
    Storage {
        /// Storage error details when reading the delta log object failed.
        #[from]
        source: StorageError,
    },

    /// Error returned when the parse was cancelled.
    #[error("Delta log parsing was cancelled")]
    Cancelled,
}

impl DeltaTableError {
    /// The [`ErrorKind`] this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownType(_)
            | Self::MalformedDecimal(_)
            | Self::UnsupportedPartitionType(_)
            | Self::InvalidPartitionValue { .. }
            | Self::DateTimeOverflow(_)
            | Self::InvalidOption { .. } => ErrorKind::BadArguments,
            Self::MalformedLogLine { .. }
            | Self::InvalidLastCheckpoint(_)
            | Self::InvalidSchema(_)
            | Self::CheckpointShape { .. }
            | Self::DuplicateCheckpointEntry(_)
            | Self::Parquet { .. }
            | Self::Arrow { .. } => ErrorKind::IncorrectData,
            Self::UnknownPartitionColumn { .. } => ErrorKind::LogicalError,
            Self::SchemaEvolutionUnsupported { .. } | Self::MultiPartCheckpoint { .. } => {
                ErrorKind::NotImplemented
            }
            Self::Storage { .. } => ErrorKind::Transport,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
