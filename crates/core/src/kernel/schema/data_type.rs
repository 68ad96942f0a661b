//! Engine-side data types and their resolution from Delta schema descriptors.
//!
//! Delta describes columns with the types of its own protocol (`long`, `decimal(10,2)`, nested
//! structs...). Readers plan against a smaller set of engine types, where nullability of
//! primitive columns is carried in the type itself.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use super::schema::{SchemaDataType, StructField, StructType};
use crate::{DeltaResult, DeltaTableError};

/// Largest precision a decimal column may declare.
pub const DECIMAL_MAX_PRECISION: u8 = 38;

/// Primitive engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// UTF-8 string, also used for Delta `binary`
    String,
    /// 1-byte signed integer
    Int8,
    /// 2-byte signed integer
    Int16,
    /// 4-byte signed integer
    Int32,
    /// 8-byte signed integer
    Int64,
    /// 4-byte floating point
    Float32,
    /// 8-byte floating point
    Float64,
    /// Boolean
    Boolean,
    /// Days since the unix epoch
    Date32,
    /// Microseconds since the unix epoch
    Timestamp,
    /// Fixed point decimal
    Decimal {
        /// Total number of digits
        precision: u8,
        /// Digits after the decimal point
        scale: u8,
    },
}

impl PrimitiveType {
    fn parse_decimal(name: &str) -> DeltaResult<Self> {
        let malformed = || DeltaTableError::MalformedDecimal(name.to_string());
        let inner = name
            .strip_prefix("decimal(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;

        let mut parts = inner.split(',');
        let precision = parts
            .next()
            .and_then(|part| part.trim().parse::<u8>().ok())
            .ok_or_else(malformed)?;
        // a missing scale means zero digits after the point
        let scale = match parts.next().map(str::trim) {
            None | Some("") => 0,
            Some(part) => part.parse::<u8>().map_err(|_| malformed())?,
        };
        if parts.next().is_some() {
            return Err(malformed());
        }

        if precision == 0 || precision > DECIMAL_MAX_PRECISION || scale > precision {
            return Err(malformed());
        }
        Ok(PrimitiveType::Decimal { precision, scale })
    }
}

impl FromStr for PrimitiveType {
    type Err = DeltaTableError;

    /// Parse a Delta primitive type name.
    // https://github.com/delta-io/delta/blob/master/PROTOCOL.md#primitive-types
    fn from_str(name: &str) -> DeltaResult<Self> {
        Ok(match name {
            "string" | "binary" => PrimitiveType::String,
            "long" => PrimitiveType::Int64,
            "integer" => PrimitiveType::Int32,
            "short" => PrimitiveType::Int16,
            "byte" => PrimitiveType::Int8,
            "float" => PrimitiveType::Float32,
            "double" => PrimitiveType::Float64,
            "boolean" => PrimitiveType::Boolean,
            "date" => PrimitiveType::Date32,
            "timestamp" => PrimitiveType::Timestamp,
            _ if name.starts_with("decimal(") => Self::parse_decimal(name)?,
            _ => return Err(DeltaTableError::UnknownType(name.to_string())),
        })
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::String => write!(f, "String"),
            PrimitiveType::Int8 => write!(f, "Int8"),
            PrimitiveType::Int16 => write!(f, "Int16"),
            PrimitiveType::Int32 => write!(f, "Int32"),
            PrimitiveType::Int64 => write!(f, "Int64"),
            PrimitiveType::Float32 => write!(f, "Float32"),
            PrimitiveType::Float64 => write!(f, "Float64"),
            PrimitiveType::Boolean => write!(f, "Bool"),
            PrimitiveType::Date32 => write!(f, "Date32"),
            PrimitiveType::Timestamp => write!(f, "DateTime64(6)"),
            PrimitiveType::Decimal { precision, scale } => {
                write!(f, "Decimal({precision}, {scale})")
            }
        }
    }
}

/// A named column type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameAndType {
    /// Column name; the physical name for top-level table columns
    pub name: String,
    /// Column type
    pub data_type: DataType,
}

impl NameAndType {
    /// Create a new named type
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl Display for NameAndType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

/// An engine data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A non-nullable primitive
    Primitive(PrimitiveType),
    /// A primitive that admits null. Only primitives carry nullability.
    Nullable(PrimitiveType),
    /// A struct, as an ordered list of named members
    Tuple(Vec<NameAndType>),
    /// A variable length list of elements
    Array(Box<DataType>),
    /// Key/value pairs
    Map(Box<DataType>, Box<DataType>),
}

impl DataType {
    /// The primitive inside this type, looking through `Nullable`.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            DataType::Primitive(p) | DataType::Nullable(p) => Some(*p),
            _ => None,
        }
    }

    /// Whether this type admits null values.
    pub fn is_nullable(&self) -> bool {
        matches!(self, DataType::Nullable(_))
    }
}

impl From<PrimitiveType> for DataType {
    fn from(value: PrimitiveType) -> Self {
        DataType::Primitive(value)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(p) => write!(f, "{p}"),
            DataType::Nullable(p) => write!(f, "Nullable({p})"),
            DataType::Tuple(members) => {
                write!(f, "Tuple(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, ")")
            }
            DataType::Array(element) => write!(f, "Array({element})"),
            DataType::Map(key, value) => write!(f, "Map({key}, {value})"),
        }
    }
}

/// Nested descriptors are matched on their fields, so the `type` tag has to be checked here.
fn check_tag(type_name: &str, expected: &str) -> DeltaResult<()> {
    if type_name == expected {
        Ok(())
    } else {
        Err(DeltaTableError::UnknownType(type_name.to_string()))
    }
}

/// Resolve a Delta type descriptor into an engine type.
///
/// `nullable` is the nullability the enclosing context declares for this type. It only has an
/// effect on primitives; nested types are never wrapped.
pub fn resolve_type(descriptor: &SchemaDataType, nullable: bool) -> DeltaResult<DataType> {
    match descriptor {
        SchemaDataType::Primitive(name) => {
            let primitive = name.parse::<PrimitiveType>()?;
            Ok(if nullable {
                DataType::Nullable(primitive)
            } else {
                DataType::Primitive(primitive)
            })
        }
        SchemaDataType::Struct(s) => {
            check_tag(&s.type_name, "struct")?;
            Ok(DataType::Tuple(
                s.fields()
                    .iter()
                    .map(|field| {
                        Ok(NameAndType::new(
                            field.name(),
                            resolve_type(field.data_type(), field.is_nullable())?,
                        ))
                    })
                    .collect::<DeltaResult<_>>()?,
            ))
        }
        SchemaDataType::Array(a) => {
            check_tag(&a.type_name, "array")?;
            Ok(DataType::Array(Box::new(resolve_type(
                &a.element_type,
                a.contains_null,
            )?)))
        }
        SchemaDataType::Map(m) => {
            check_tag(&m.type_name, "map")?;
            Ok(DataType::Map(
                Box::new(resolve_type(&m.key_type, false)?),
                Box::new(resolve_type(&m.value_type, m.value_contains_null)?),
            ))
        }
    }
}

/// Resolve a top-level table column into its physical name and engine type.
pub fn resolve_field(field: &StructField) -> DeltaResult<NameAndType> {
    Ok(NameAndType::new(
        field.physical_name()?,
        resolve_type(field.data_type(), field.is_nullable())?,
    ))
}

impl StructType {
    /// Project the table columns as `(physical name, engine type)` pairs, in schema order.
    pub fn to_engine_schema(&self) -> DeltaResult<Vec<NameAndType>> {
        self.fields().iter().map(resolve_field).collect()
    }
}
