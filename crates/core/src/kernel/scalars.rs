//! Typed partition values

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::{DataType, PrimitiveType};
use crate::table::config::{DateTimeOverflowBehavior, FormatSettings};
use crate::{DeltaResult, DeltaTableError};

/// Days since epoch of 1900-01-01, the earliest representable date.
pub const MIN_DATE_DAYS: i32 = -25_567;
/// Days since epoch of 2299-12-31, the latest representable date.
pub const MAX_DATE_DAYS: i32 = 120_529;
/// Microseconds since epoch of 1900-01-01 00:00:00 UTC.
pub const MIN_TIMESTAMP_MICROS: i64 = MIN_DATE_DAYS as i64 * MICROS_PER_DAY;
/// Microseconds since epoch of 2299-12-31 23:59:59.999999 UTC.
pub const MAX_TIMESTAMP_MICROS: i64 = (MAX_DATE_DAYS as i64 + 1) * MICROS_PER_DAY - 1;

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single value with an associated data type.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// 32bit integer
    Integer(i32),
    /// 64bit integer
    Long(i64),
    /// 16bit integer
    Short(i16),
    /// 8bit integer
    Byte(i8),
    /// 32bit floating point
    Float(f32),
    /// 64bit floating point
    Double(f64),
    /// utf-8 encoded string.
    String(String),
    /// true or false value
    Boolean(bool),
    /// Microsecond precision timestamp, adjusted to UTC.
    Timestamp(i64),
    /// Date stored as a signed 32bit int days since UNIX epoch 1970-01-01
    Date(i32),
    /// Null value with a given data type.
    Null(DataType),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Long(i) => write!(f, "{i}"),
            Self::Short(i) => write!(f, "{i}"),
            Self::Byte(i) => write!(f, "{i}"),
            Self::Float(fl) => write!(f, "{fl}"),
            Self::Double(fl) => write!(f, "{fl}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Timestamp(ts) => match DateTime::from_timestamp_micros(*ts) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
                None => write!(f, "{ts}"),
            },
            Self::Date(days) => {
                match DateTime::from_timestamp(*days as i64 * 86_400, 0) {
                    Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d")),
                    None => write!(f, "{days}"),
                }
            }
            Self::Null(_) => write!(f, "NULL"),
        }
    }
}

/// Parses a raw partition value into a scalar of the column's type.
///
/// A missing or empty raw value is a typed null, as Delta writers encode null partitions either
/// way. Timestamps without an explicit offset are interpreted in `time_zone`.
pub fn parse_partition_value(
    data_type: &DataType,
    raw: Option<&str>,
    settings: &FormatSettings,
    time_zone: &Tz,
) -> DeltaResult<Scalar> {
    let primitive = match data_type.primitive() {
        Some(PrimitiveType::Decimal { .. }) | None => {
            return Err(DeltaTableError::UnsupportedPartitionType(data_type.clone()))
        }
        Some(primitive) => primitive,
    };

    let raw = match raw {
        None | Some("") => return Ok(Scalar::Null(data_type.clone())),
        Some(raw) => raw,
    };

    let parse_error = || DeltaTableError::InvalidPartitionValue {
        value: raw.to_string(),
        data_type: data_type.clone(),
    };

    match primitive {
        PrimitiveType::String => Ok(Scalar::String(raw.to_string())),
        PrimitiveType::Int8 => str_parse_scalar(raw, Scalar::Byte).ok_or_else(parse_error),
        PrimitiveType::Int16 => str_parse_scalar(raw, Scalar::Short).ok_or_else(parse_error),
        PrimitiveType::Int32 => str_parse_scalar(raw, Scalar::Integer).ok_or_else(parse_error),
        PrimitiveType::Int64 => str_parse_scalar(raw, Scalar::Long).ok_or_else(parse_error),
        PrimitiveType::Float32 => str_parse_scalar(raw, Scalar::Float).ok_or_else(parse_error),
        PrimitiveType::Float64 => str_parse_scalar(raw, Scalar::Double).ok_or_else(parse_error),
        PrimitiveType::Boolean => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(Scalar::Boolean(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(Scalar::Boolean(false))
            } else {
                Err(parse_error())
            }
        }
        PrimitiveType::Date32 => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| parse_error())?;
            let days = date
                .signed_duration_since(DateTime::<Utc>::UNIX_EPOCH.date_naive())
                .num_days();
            let days = i32::try_from(days).map_err(|_| parse_error())?;
            let days = check_range(
                raw,
                days,
                MIN_DATE_DAYS,
                MAX_DATE_DAYS,
                settings.date_time_overflow_behavior,
            )?;
            Ok(Scalar::Date(days))
        }
        PrimitiveType::Timestamp => {
            let micros = parse_timestamp_micros(raw, time_zone).ok_or_else(parse_error)?;
            let micros = check_range(
                raw,
                micros,
                MIN_TIMESTAMP_MICROS,
                MAX_TIMESTAMP_MICROS,
                settings.date_time_overflow_behavior,
            )?;
            Ok(Scalar::Timestamp(micros))
        }
        PrimitiveType::Decimal { .. } => {
            Err(DeltaTableError::UnsupportedPartitionType(data_type.clone()))
        }
    }
}

fn str_parse_scalar<T: std::str::FromStr>(raw: &str, f: impl FnOnce(T) -> Scalar) -> Option<Scalar> {
    raw.parse().ok().map(f)
}

fn parse_timestamp_micros(raw: &str, time_zone: &Tz) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).timestamp_micros());
    }

    let naive = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    // earliest() resolves the ambiguous hour of a DST fold; a gap yields None
    let local = time_zone.from_local_datetime(&naive).earliest()?;
    Some(local.with_timezone(&Utc).timestamp_micros())
}

fn check_range<T: PartialOrd + Copy>(
    raw: &str,
    value: T,
    min: T,
    max: T,
    behavior: DateTimeOverflowBehavior,
) -> DeltaResult<T> {
    if value >= min && value <= max {
        return Ok(value);
    }
    match behavior {
        DateTimeOverflowBehavior::Ignore => Ok(value),
        DateTimeOverflowBehavior::Throw => Err(DeltaTableError::DateTimeOverflow(raw.to_string())),
        DateTimeOverflowBehavior::Saturate => Ok(if value < min { min } else { max }),
    }
}
