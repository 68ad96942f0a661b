//! Delta Table configuration and the context a parse runs in
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::Dispatch;

use crate::errors::DeltaTableError;
use crate::storage::{FileStorageBackend, StorageBackend};

/// Anything that names the root location of a Delta table.
pub trait TableConfig {
    /// Root of the table; the `_delta_log` directory lives directly below it.
    fn table_path(&self) -> &str;
}

impl TableConfig for str {
    fn table_path(&self) -> &str {
        self
    }
}

impl TableConfig for String {
    fn table_path(&self) -> &str {
        self
    }
}

/// Configuration of the table to parse
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaTableConfig {
    /// Root location of the table
    pub table_path: String,
}

impl DeltaTableConfig {
    /// Configuration for the table rooted at `table_path`
    pub fn new(table_path: impl Into<String>) -> Self {
        Self {
            table_path: table_path.into(),
        }
    }
}

impl TableConfig for DeltaTableConfig {
    fn table_path(&self) -> &str {
        &self.table_path
    }
}

/// What to do with date and timestamp partition values outside of 1900-01-01 ..= 2299-12-31
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateTimeOverflowBehavior {
    /// Keep the value as parsed
    #[default]
    Ignore,
    /// Fail the parse
    Throw,
    /// Clamp to the nearest end of the range
    Saturate,
}

impl FromStr for DateTimeOverflowBehavior {
    type Err = DeltaTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "throw" => Ok(Self::Throw),
            "saturate" => Ok(Self::Saturate),
            _ => Err(DeltaTableError::InvalidOption {
                key: OPTION_DATE_TIME_OVERFLOW_BEHAVIOR.to_string(),
                message: format!("expected one of ignore, throw, saturate; got {s}"),
            }),
        }
    }
}

impl fmt::Display for DateTimeOverflowBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Throw => write!(f, "throw"),
            Self::Saturate => write!(f, "saturate"),
        }
    }
}

/// Settings that influence how checkpoints and partition values are decoded
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", default)]
pub struct FormatSettings {
    /// Accept checkpoints that lack the `add` or `remove` column
    pub allow_missing_columns: bool,
    /// Handling of out of range date and timestamp partition values
    pub date_time_overflow_behavior: DateTimeOverflowBehavior,
}

/// Option key for [`FormatSettings::allow_missing_columns`]
pub const OPTION_ALLOW_MISSING_COLUMNS: &str = "allow_missing_columns";
/// Option key for [`FormatSettings::date_time_overflow_behavior`]
pub const OPTION_DATE_TIME_OVERFLOW_BEHAVIOR: &str = "date_time_overflow_behavior";
/// Option key for the time zone of timestamp partition values
pub const OPTION_TIMEZONE: &str = "timezone";

/// Cooperative stop signal for a running parse.
///
/// Clones share the same flag, so one can be handed to another thread to cancel.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Everything a parse needs besides the table location.
#[derive(Clone)]
pub struct ParseContext {
    storage: Arc<dyn StorageBackend>,
    format_settings: FormatSettings,
    time_zone: Tz,
    cancellation: CancellationToken,
    dispatch: Option<Dispatch>,
}

impl fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("storage", &self.storage)
            .field("format_settings", &self.format_settings)
            .field("time_zone", &self.time_zone)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("dispatch", &self.dispatch.is_some())
            .finish()
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(Arc::new(FileStorageBackend::new()))
    }
}

impl ParseContext {
    /// A context reading through `storage`, with default settings
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            format_settings: FormatSettings::default(),
            time_zone: Tz::UTC,
            cancellation: CancellationToken::default(),
            dispatch: None,
        }
    }

    /// Replace the storage backend
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = storage;
        self
    }

    /// Set the format settings
    pub fn with_format_settings(mut self, format_settings: FormatSettings) -> Self {
        self.format_settings = format_settings;
        self
    }

    /// Time zone for timestamp partition values written without an offset
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Use `cancellation` to stop the parse
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Route the parse's log records to `dispatch` instead of the global subscriber
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Apply string options, as passed on command lines or through table engine settings.
    ///
    /// Recognized keys are [`OPTION_ALLOW_MISSING_COLUMNS`],
    /// [`OPTION_DATE_TIME_OVERFLOW_BEHAVIOR`] and [`OPTION_TIMEZONE`]; others are ignored.
    pub fn with_options(mut self, options: &HashMap<String, String>) -> Result<Self, DeltaTableError> {
        if let Some(value) = options.get(OPTION_ALLOW_MISSING_COLUMNS) {
            self.format_settings.allow_missing_columns =
                value.parse().map_err(|_| DeltaTableError::InvalidOption {
                    key: OPTION_ALLOW_MISSING_COLUMNS.to_string(),
                    message: format!("expected true or false; got {value}"),
                })?;
        }
        if let Some(value) = options.get(OPTION_DATE_TIME_OVERFLOW_BEHAVIOR) {
            self.format_settings.date_time_overflow_behavior = value.parse()?;
        }
        if let Some(value) = options.get(OPTION_TIMEZONE) {
            self.time_zone = value.parse().map_err(|e| DeltaTableError::InvalidOption {
                key: OPTION_TIMEZONE.to_string(),
                message: format!("{e}"),
            })?;
        }
        Ok(self)
    }

    /// The storage backend
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// The format settings
    pub fn format_settings(&self) -> &FormatSettings {
        &self.format_settings
    }

    /// Time zone for timestamp partition values
    pub fn time_zone(&self) -> &Tz {
        &self.time_zone
    }

    /// The cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The injected log dispatcher, if any
    pub fn dispatch(&self) -> Option<&Dispatch> {
        self.dispatch.as_ref()
    }
}
