//! Delta table schema, as serialized in `metaData.schemaString`

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DeltaResult, DeltaTableError};

/// A value that can be stored in the metadata of a Delta table schema entity.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A number value
    Number(i64),
    /// A string value
    String(String),
    /// Any other JSON value
    Other(Value),
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug)]
#[allow(missing_docs)]
pub enum ColumnMetadataKey {
    ColumnMappingId,
    ColumnMappingPhysicalName,
}

impl AsRef<str> for ColumnMetadataKey {
    fn as_ref(&self) -> &str {
        match self {
            Self::ColumnMappingId => "delta.columnMapping.id",
            Self::ColumnMappingPhysicalName => "delta.columnMapping.physicalName",
        }
    }
}

/// Represents a struct field defined in the Delta table schema.
// https://github.com/delta-io/delta/blob/master/PROTOCOL.md#Schema-Serialization-Format
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct StructField {
    /// Name of this (possibly nested) column
    pub name: String,
    /// The data type of this field
    #[serde(rename = "type")]
    pub data_type: SchemaDataType,
    /// Denotes whether this Field can be null
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// A JSON map containing information about this column
    #[serde(default)]
    pub metadata: HashMap<String, MetadataValue>,
    /// Some writers mark nested fields with `required` instead of `nullable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl StructField {
    /// Creates a new field
    pub fn new(name: impl Into<String>, data_type: SchemaDataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            metadata: HashMap::default(),
            required: None,
        }
    }

    /// Creates a new field with metadata
    pub fn with_metadata(
        mut self,
        metadata: impl IntoIterator<Item = (impl Into<String>, impl Into<MetadataValue>)>,
    ) -> Self {
        self.metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Get the value of a specific metadata key
    pub fn get_config_value(&self, key: &ColumnMetadataKey) -> Option<&MetadataValue> {
        self.metadata.get(key.as_ref())
    }

    #[inline]
    /// Returns the name of the column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the column is nullable. An explicit `required` flag takes precedence.
    pub fn is_nullable(&self) -> bool {
        self.required.map(|required| !required).unwrap_or(self.nullable)
    }

    /// Returns the physical name of the column
    /// Equals the name if column mapping is not enabled on table
    pub fn physical_name(&self) -> DeltaResult<&str> {
        match self.get_config_value(&ColumnMetadataKey::ColumnMappingPhysicalName) {
            None => Ok(&self.name),
            Some(MetadataValue::String(s)) => Ok(s),
            Some(other) => Err(DeltaTableError::InvalidSchema(format!(
                "unexpected physical name {other:?} for column {}",
                self.name
            ))),
        }
    }

    #[inline]
    /// Returns the data type of the column
    pub const fn data_type(&self) -> &SchemaDataType {
        &self.data_type
    }
}

/// A struct is used to represent both the top-level schema of the table
/// as well as struct columns that contain nested columns.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct StructType {
    #[serde(rename = "type")]
    /// The type of this struct
    pub type_name: String,
    /// The fields of this struct, in declaration order
    pub fields: Vec<StructField>,
}

impl StructType {
    /// Creates a new struct type
    pub fn new(fields: Vec<StructField>) -> Self {
        Self {
            type_name: "struct".into(),
            fields,
        }
    }

    /// Returns an immutable reference of the fields in the struct
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Parse a `schemaString` as found in a metaData action.
    pub fn from_schema_string(schema_string: &str) -> DeltaResult<Self> {
        serde_json::from_str(schema_string)
            .map_err(|e| DeltaTableError::InvalidSchema(format!("{e}: {schema_string}")))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
/// An array stores a variable length collection of items of some type.
pub struct ArrayType {
    #[serde(rename = "type")]
    /// The type of this struct
    pub type_name: String,
    /// The type of element stored in this array
    pub element_type: SchemaDataType,
    /// Denoting whether this array can contain one or more null values
    #[serde(default = "default_true")]
    pub contains_null: bool,
}

impl ArrayType {
    /// Creates a new array type
    pub fn new(element_type: SchemaDataType, contains_null: bool) -> Self {
        Self {
            type_name: "array".into(),
            element_type,
            contains_null,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
/// A map stores an arbitrary length collection of key-value pairs
pub struct MapType {
    #[serde(rename = "type")]
    /// The type of this struct
    pub type_name: String,
    /// The type of element used for the key of this map
    pub key_type: SchemaDataType,
    /// The type of element used for the value of this map
    pub value_type: SchemaDataType,
    /// Denoting whether this map can contain one or more null values
    #[serde(default = "default_true", alias = "containsNull")]
    pub value_contains_null: bool,
}

impl MapType {
    /// Creates a new map type
    pub fn new(
        key_type: SchemaDataType,
        value_type: SchemaDataType,
        value_contains_null: bool,
    ) -> Self {
        Self {
            type_name: "map".into(),
            key_type,
            value_type,
            value_contains_null,
        }
    }
}

fn default_true() -> bool {
    true
}

/// The data type of a column, as written by Delta writers.
///
/// Primitive names are kept verbatim; they are interpreted by
/// [`resolve_type`](crate::kernel::resolve_type), which rejects unknown names.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum SchemaDataType {
    /// A primitive type name such as `long` or `decimal(10,2)`
    Primitive(String),
    /// An array stores a variable length collection of items of some type.
    Array(Box<ArrayType>),
    /// A map stores an arbitrary length collection of key-value pairs
    /// with a single keyType and a single valueType
    Map(Box<MapType>),
    /// A struct column that contains nested columns.
    Struct(Box<StructType>),
}

impl SchemaDataType {
    /// create a new primitive type from its Delta name
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive(name.into())
    }
}

impl Display for SchemaDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDataType::Primitive(name) => write!(f, "{name}"),
            SchemaDataType::Struct(s) => {
                write!(f, "struct<")?;
                for (i, field) in s.fields.iter().enumerate() {
                    write!(f, "{}: {}", field.name, field.data_type)?;
                    if i < s.fields.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, ">")
            }
            SchemaDataType::Array(a) => write!(f, "array<{}>", a.element_type),
            SchemaDataType::Map(m) => write!(f, "map<{}, {}>", m.key_type, m.value_type),
        }
    }
}
