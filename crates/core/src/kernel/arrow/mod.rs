//! Conversions between engine and Arrow data types

use std::sync::Arc;

use arrow_schema::{
    ArrowError, DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit,
};

use super::{DataType, NameAndType, PrimitiveType};

pub(crate) mod extract;

const MAP_ROOT_DEFAULT: &str = "key_value";
const MAP_KEY_DEFAULT: &str = "key";
const MAP_VALUE_DEFAULT: &str = "value";
const LIST_ROOT_DEFAULT: &str = "element";

/// Nested types carry no nullability of their own, so their fields are always nullable.
fn arrow_nullable(data_type: &DataType) -> bool {
    !matches!(data_type, DataType::Primitive(_))
}

impl TryFrom<&NameAndType> for ArrowField {
    type Error = ArrowError;

    fn try_from(column: &NameAndType) -> Result<Self, ArrowError> {
        Ok(ArrowField::new(
            &column.name,
            ArrowDataType::try_from(&column.data_type)?,
            arrow_nullable(&column.data_type),
        ))
    }
}

impl TryFrom<&PrimitiveType> for ArrowDataType {
    type Error = ArrowError;

    fn try_from(p: &PrimitiveType) -> Result<Self, ArrowError> {
        match p {
            PrimitiveType::String => Ok(ArrowDataType::Utf8),
            PrimitiveType::Int8 => Ok(ArrowDataType::Int8),
            PrimitiveType::Int16 => Ok(ArrowDataType::Int16),
            PrimitiveType::Int32 => Ok(ArrowDataType::Int32),
            PrimitiveType::Int64 => Ok(ArrowDataType::Int64),
            PrimitiveType::Float32 => Ok(ArrowDataType::Float32),
            PrimitiveType::Float64 => Ok(ArrowDataType::Float64),
            PrimitiveType::Boolean => Ok(ArrowDataType::Boolean),
            PrimitiveType::Date32 => Ok(ArrowDataType::Date32),
            PrimitiveType::Timestamp => Ok(ArrowDataType::Timestamp(
                TimeUnit::Microsecond,
                Some("UTC".into()),
            )),
            PrimitiveType::Decimal { precision, scale } => {
                let scale = i8::try_from(*scale).map_err(|_| {
                    ArrowError::SchemaError(format!("Decimal scale too large: {scale}"))
                })?;
                Ok(ArrowDataType::Decimal128(*precision, scale))
            }
        }
    }
}

impl TryFrom<&DataType> for ArrowDataType {
    type Error = ArrowError;

    fn try_from(t: &DataType) -> Result<Self, ArrowError> {
        match t {
            DataType::Primitive(p) | DataType::Nullable(p) => p.try_into(),
            DataType::Tuple(members) => Ok(ArrowDataType::Struct(
                members
                    .iter()
                    .map(TryInto::try_into)
                    .collect::<Result<Vec<ArrowField>, ArrowError>>()?
                    .into(),
            )),
            DataType::Array(element) => Ok(ArrowDataType::List(Arc::new(ArrowField::new(
                LIST_ROOT_DEFAULT,
                element.as_ref().try_into()?,
                arrow_nullable(element),
            )))),
            DataType::Map(key, value) => Ok(ArrowDataType::Map(
                Arc::new(ArrowField::new(
                    MAP_ROOT_DEFAULT,
                    ArrowDataType::Struct(
                        vec![
                            ArrowField::new(MAP_KEY_DEFAULT, key.as_ref().try_into()?, false),
                            ArrowField::new(
                                MAP_VALUE_DEFAULT,
                                value.as_ref().try_into()?,
                                arrow_nullable(value),
                            ),
                        ]
                        .into(),
                    ),
                    // always non-null
                    false,
                )),
                false,
            )),
        }
    }
}

/// Convert a resolved table schema into an Arrow schema.
pub fn to_arrow_schema(columns: &[NameAndType]) -> Result<ArrowSchema, ArrowError> {
    let fields = columns
        .iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<ArrowField>, ArrowError>>()?;
    Ok(ArrowSchema::new(fields))
}
