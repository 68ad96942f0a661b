//! The module for delta table state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use arrow_schema::Schema as ArrowSchema;
use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::kernel::arrow::to_arrow_schema;
use crate::kernel::{parse_partition_value, Action, Add, Metadata, NameAndType, Scalar};
use crate::storage::{basename, join_path};
use crate::table::config::FormatSettings;
use crate::{DeltaResult, DeltaTableError};

/// A typed partition value of one data file
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionColumn {
    /// The partition column, as found in the table schema
    pub column: NameAndType,
    /// The value of the column for the data file
    pub value: Scalar,
}

/// The state of a Delta table at its latest version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    version: Option<i64>,
    schema: Vec<NameAndType>,
    data_files: Vec<String>,
    partition_columns: BTreeMap<String, Vec<PartitionColumn>>,
}

impl Snapshot {
    /// The last version folded into this snapshot; `None` for a table without commits.
    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Table columns as `(physical name, type)`, in schema order.
    pub fn schema(&self) -> &[NameAndType] {
        &self.schema
    }

    /// Fully qualified paths of the active data files, in lexicographic order.
    pub fn data_files(&self) -> &[String] {
        &self.data_files
    }

    /// Partition values per data file basename.
    pub fn partition_columns(&self) -> &BTreeMap<String, Vec<PartitionColumn>> {
        &self.partition_columns
    }

    /// Partition values of one data file, by basename or full path.
    pub fn partition_values(&self, file: &str) -> Option<&[PartitionColumn]> {
        self.partition_columns
            .get(basename(file))
            .map(Vec::as_slice)
    }

    /// The table schema as an Arrow schema.
    pub fn arrow_schema(&self) -> DeltaResult<ArrowSchema> {
        Ok(to_arrow_schema(&self.schema)?)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => writeln!(f, "version: {version}")?,
            None => writeln!(f, "version: none")?,
        }
        writeln!(f, "schema:")?;
        for column in &self.schema {
            writeln!(f, "  {column}")?;
        }
        writeln!(f, "files: {}", self.data_files.len())?;
        for file in &self.data_files {
            write!(f, "  {file}")?;
            if let Some(values) = self.partition_values(file) {
                let rendered: Vec<_> = values
                    .iter()
                    .map(|pc| format!("{}={}", pc.column.name, pc.value))
                    .collect();
                write!(f, " [{}]", rendered.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Mutable state accumulated while replaying the log.
#[derive(Debug)]
pub(crate) struct DeltaTableState<'a> {
    table_root: String,
    settings: &'a FormatSettings,
    time_zone: &'a Tz,
    version: Option<i64>,
    schema: Vec<NameAndType>,
    files: BTreeSet<String>,
    partition_columns: BTreeMap<String, Vec<PartitionColumn>>,
}

impl<'a> DeltaTableState<'a> {
    pub(crate) fn new(table_root: &str, settings: &'a FormatSettings, time_zone: &'a Tz) -> Self {
        Self {
            table_root: table_root.to_string(),
            settings,
            time_zone,
            version: None,
            schema: Vec::new(),
            files: BTreeSet::new(),
            partition_columns: BTreeMap::new(),
        }
    }

    pub(crate) fn set_version(&mut self, version: i64) {
        self.version = Some(version);
    }

    pub(crate) fn schema(&self) -> &[NameAndType] {
        &self.schema
    }

    /// Seed the active files with the adds of a checkpoint. Every path must be new.
    pub(crate) fn load_checkpoint_adds(&mut self, adds: Vec<Add>) -> DeltaResult<()> {
        for add in adds {
            let full_path = join_path(&self.table_root, &add.path);
            if self.files.contains(&full_path) {
                return Err(DeltaTableError::DuplicateCheckpointEntry(add.path));
            }
            if self.schema.is_empty() && !add.partition_values.is_empty() {
                debug!(path = %add.path, "no schema known yet, skipping checkpoint partition values");
                self.files.insert(full_path);
                continue;
            }
            self.process_add(add)?;
        }
        Ok(())
    }

    /// Apply one action of a commit file.
    pub(crate) fn process_action(&mut self, action: Action) -> DeltaResult<()> {
        match action {
            Action::Add(add) => self.process_add(add)?,
            Action::Remove(remove) => {
                let full_path = join_path(&self.table_root, &remove.path);
                if self.files.remove(&full_path) {
                    trace!(path = %full_path, "removed data file");
                }
            }
            Action::Metadata(metadata) => self.process_metadata(&metadata)?,
            other => trace!(action = other.tag(), "ignoring action"),
        }
        Ok(())
    }

    fn process_add(&mut self, add: Add) -> DeltaResult<()> {
        let full_path = join_path(&self.table_root, &add.path);
        let filename = basename(&add.path).to_string();

        if !self.partition_columns.contains_key(&filename) && !add.partition_values.is_empty() {
            let mut values = Vec::with_capacity(add.partition_values.len());
            for (name, raw) in &add.partition_values {
                let column = self
                    .schema
                    .iter()
                    .find(|column| &column.name == name)
                    .ok_or_else(|| DeltaTableError::UnknownPartitionColumn {
                        column: name.clone(),
                        file: add.path.clone(),
                    })?;
                let value = parse_partition_value(
                    &column.data_type,
                    raw.as_deref(),
                    self.settings,
                    self.time_zone,
                )?;
                trace!(column = %name, value = %value, file = %filename, "partition value");
                values.push(PartitionColumn {
                    column: column.clone(),
                    value,
                });
            }
            self.partition_columns.insert(filename, values);
        }

        trace!(path = %full_path, "added data file");
        self.files.insert(full_path);
        Ok(())
    }

    fn process_metadata(&mut self, metadata: &Metadata) -> DeltaResult<()> {
        let schema = metadata.schema()?.to_engine_schema()?;
        if self.schema.is_empty() {
            trace!(columns = %render_schema(&schema), "discovered table schema");
            self.schema = schema;
        } else if self.schema != schema {
            return Err(DeltaTableError::SchemaEvolutionUnsupported {
                previous: render_schema(&self.schema),
                current: render_schema(&schema),
            });
        }
        Ok(())
    }

    pub(crate) fn into_snapshot(self) -> Snapshot {
        Snapshot {
            version: self.version,
            schema: self.schema,
            data_files: self.files.into_iter().collect(),
            partition_columns: self.partition_columns,
        }
    }
}

fn render_schema(schema: &[NameAndType]) -> String {
    let columns: Vec<_> = schema.iter().map(ToString::to_string).collect();
    format!("[{}]", columns.join(", "))
}
