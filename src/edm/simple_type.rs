//! EDM simple types and the literal codec
//!
//! Converts the textual form of a primitive value (XML element text, a JSON
//! string or the text of a JSON number/boolean) into a typed [`SimpleValue`].
//! The default host representation depends on the [`EdmSimpleTypeKind`]; a
//! caller may ask for another representation through a [`TargetType`].

use std::fmt;

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::Facets;

/// Primitive types of the EDM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmSimpleTypeKind {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Time,
}

impl EdmSimpleTypeKind {
    /// Name without the `Edm.` namespace
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Decimal => "Decimal",
            Self::Double => "Double",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::SByte => "SByte",
            Self::Single => "Single",
            Self::String => "String",
            Self::Time => "Time",
        }
    }

    /// Host representation produced when the caller asks for none
    pub fn default_target(&self) -> TargetType {
        match self {
            Self::Binary => TargetType::Bytes,
            Self::Boolean => TargetType::Bool,
            Self::Byte => TargetType::U8,
            Self::DateTime => TargetType::DateTimeUtc,
            Self::DateTimeOffset => TargetType::DateTimeOffset,
            Self::Decimal => TargetType::Decimal,
            Self::Double => TargetType::F64,
            Self::Guid => TargetType::Uuid,
            Self::Int16 => TargetType::I16,
            Self::Int32 => TargetType::I32,
            Self::Int64 => TargetType::I64,
            Self::SByte => TargetType::I8,
            Self::Single => TargetType::F32,
            Self::String => TargetType::String,
            Self::Time => TargetType::Duration,
        }
    }

    /// Convert a literal into a value of this type
    ///
    /// Facets are validated only when given; callers pass `None` when facet
    /// validation is switched off.
    pub fn value_of_string(
        &self,
        literal: &str,
        literal_kind: EdmLiteralKind,
        facets: Option<&Facets>,
        target: Option<TargetType>,
    ) -> Result<SimpleValue, EdmSimpleTypeError> {
        let value = self.parse_literal(literal, literal_kind)?;
        if let Some(facets) = facets {
            self.validate_facets(literal, &value, facets)?;
        }
        match target {
            Some(target) if target != self.default_target() => convert(value, *self, target, literal),
            _ => Ok(value),
        }
    }

    fn illegal(&self, literal: &str) -> EdmSimpleTypeError {
        EdmSimpleTypeError::LiteralIllegalContent {
            literal: literal.to_string(),
            kind: *self,
        }
    }

    fn parse_literal(&self, literal: &str, literal_kind: EdmLiteralKind) -> Result<SimpleValue, EdmSimpleTypeError> {
        let illegal = || self.illegal(literal);
        let value = match self {
            Self::Binary => SimpleValue::Binary(
                base64::engine::general_purpose::STANDARD
                    .decode(literal)
                    .map_err(|_| illegal())?,
            ),
            Self::Boolean => match literal {
                "true" | "1" => SimpleValue::Boolean(true),
                "false" | "0" => SimpleValue::Boolean(false),
                _ => return Err(illegal()),
            },
            Self::Byte => SimpleValue::Byte(literal.parse().map_err(|_| illegal())?),
            Self::SByte => SimpleValue::SByte(literal.parse().map_err(|_| illegal())?),
            Self::Int16 => SimpleValue::Int16(literal.parse().map_err(|_| illegal())?),
            Self::Int32 => SimpleValue::Int32(literal.parse().map_err(|_| illegal())?),
            Self::Int64 => SimpleValue::Int64(literal.parse().map_err(|_| illegal())?),
            Self::Double => SimpleValue::Double(parse_float(literal).ok_or_else(illegal)?),
            Self::Single => {
                let value = parse_float(literal).ok_or_else(illegal)?;
                if value.is_finite() && value.abs() > f32::MAX as f64 {
                    return Err(illegal());
                }
                SimpleValue::Single(value as f32)
            }
            Self::Decimal => {
                if !is_numeric_literal(literal) {
                    return Err(illegal());
                }
                let value = literal
                    .parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(literal))
                    .map_err(|_| illegal())?;
                SimpleValue::Decimal(value)
            }
            Self::Guid => {
                if literal.len() != 36 {
                    return Err(illegal());
                }
                SimpleValue::Guid(Uuid::parse_str(literal).map_err(|_| illegal())?)
            }
            Self::String => SimpleValue::String(literal.to_string()),
            Self::DateTime => {
                let parsed = match literal_kind {
                    EdmLiteralKind::Json => parse_json_date(literal).and_then(|(millis, _)| {
                        DateTime::<Utc>::from_timestamp_millis(millis)
                    }),
                    EdmLiteralKind::Default => None,
                };
                SimpleValue::DateTime(match parsed {
                    Some(value) => value,
                    None => parse_iso_date_time(literal).ok_or_else(illegal)?,
                })
            }
            Self::DateTimeOffset => {
                let parsed = match literal_kind {
                    EdmLiteralKind::Json => parse_json_date(literal).and_then(|(millis, offset)| {
                        let offset = FixedOffset::east_opt(offset.unwrap_or(0) * 60)?;
                        let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
                        Some(utc.with_timezone(&offset))
                    }),
                    EdmLiteralKind::Default => None,
                };
                SimpleValue::DateTimeOffset(match parsed {
                    Some(value) => value,
                    None => parse_iso_date_time_offset(literal).ok_or_else(illegal)?,
                })
            }
            Self::Time => SimpleValue::Time(parse_duration(literal).ok_or_else(illegal)?),
        };
        Ok(value)
    }

    fn validate_facets(&self, literal: &str, value: &SimpleValue, facets: &Facets) -> Result<(), EdmSimpleTypeError> {
        let mismatch = || EdmSimpleTypeError::LiteralFacetsNotMatched {
            literal: literal.to_string(),
            kind: *self,
        };
        match value {
            SimpleValue::String(s) => {
                if let Some(max) = facets.max_length {
                    if s.chars().count() > max as usize {
                        return Err(mismatch());
                    }
                }
            }
            SimpleValue::Binary(bytes) => {
                if let Some(max) = facets.max_length {
                    if bytes.len() > max as usize {
                        return Err(mismatch());
                    }
                }
            }
            SimpleValue::Decimal(d) => {
                if let Some(scale) = facets.scale {
                    if d.normalize().scale() > scale {
                        return Err(mismatch());
                    }
                }
                if let Some(precision) = facets.precision {
                    let digits = d.normalize().mantissa().unsigned_abs().to_string().len();
                    if digits > precision as usize {
                        return Err(mismatch());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for EdmSimpleTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edm.{}", self.name())
    }
}

/// Textual convention the literal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdmLiteralKind {
    /// XML element text and raw `$value` content
    Default,
    /// Verbose JSON (`/Date(ms)/` for date/time kinds)
    Json,
}

/// Host representation a caller can request for a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Bytes,
    Bool,
    U8,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    String,
    Uuid,
    DateTimeUtc,
    DateTimeOffset,
    /// Milliseconds since the Unix epoch, as `SimpleValue::Int64`
    EpochMillis,
    Duration,
}

/// Typed primitive value
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(chrono::Duration),
}

impl SimpleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v.into()),
            Self::SByte(v) => Some(v.into()),
            Self::Int16(v) => Some(v.into()),
            Self::Int32(v) => Some(v.into()),
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

/// Errors raised by the literal codec
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EdmSimpleTypeError {
    #[error("Illegal content '{literal}' for {kind}")]
    LiteralIllegalContent {
        literal: String,
        kind: EdmSimpleTypeKind,
    },

    #[error("Literal '{literal}' does not match the facets of {kind}")]
    LiteralFacetsNotMatched {
        literal: String,
        kind: EdmSimpleTypeKind,
    },

    #[error("Literal '{literal}' cannot be converted to {target:?}")]
    LiteralUnconvertibleToValueType { literal: String, target: TargetType },

    #[error("{kind} values cannot be represented as {target:?}")]
    ValueTypeNotSupported {
        kind: EdmSimpleTypeKind,
        target: TargetType,
    },
}

fn convert(
    value: SimpleValue,
    kind: EdmSimpleTypeKind,
    target: TargetType,
    literal: &str,
) -> Result<SimpleValue, EdmSimpleTypeError> {
    let unconvertible = || EdmSimpleTypeError::LiteralUnconvertibleToValueType {
        literal: literal.to_string(),
        target,
    };
    let unsupported = || EdmSimpleTypeError::ValueTypeNotSupported { kind, target };

    if let Some(n) = value.as_i64() {
        return match target {
            TargetType::U8 => u8::try_from(n).map(SimpleValue::Byte).map_err(|_| unconvertible()),
            TargetType::I8 => i8::try_from(n).map(SimpleValue::SByte).map_err(|_| unconvertible()),
            TargetType::I16 => i16::try_from(n).map(SimpleValue::Int16).map_err(|_| unconvertible()),
            TargetType::I32 => i32::try_from(n).map(SimpleValue::Int32).map_err(|_| unconvertible()),
            TargetType::I64 => Ok(SimpleValue::Int64(n)),
            TargetType::Decimal => Ok(SimpleValue::Decimal(Decimal::from(n))),
            TargetType::F64 => Ok(SimpleValue::Double(n as f64)),
            _ => Err(unsupported()),
        };
    }

    match (value, target) {
        (SimpleValue::Single(v), TargetType::F64) => Ok(SimpleValue::Double(v as f64)),
        (SimpleValue::Double(v), TargetType::F32) => {
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                Err(unconvertible())
            } else {
                Ok(SimpleValue::Single(v as f32))
            }
        }
        (SimpleValue::Single(v), TargetType::Decimal) => Decimal::from_f32(v)
            .map(SimpleValue::Decimal)
            .ok_or_else(unconvertible),
        (SimpleValue::Double(v), TargetType::Decimal) => Decimal::from_f64(v)
            .map(SimpleValue::Decimal)
            .ok_or_else(unconvertible),
        (SimpleValue::Decimal(d), TargetType::F64) => {
            d.to_f64().map(SimpleValue::Double).ok_or_else(unconvertible)
        }
        (SimpleValue::Decimal(d), TargetType::I64) => {
            if !d.fract().is_zero() {
                return Err(unconvertible());
            }
            d.to_i64().map(SimpleValue::Int64).ok_or_else(unconvertible)
        }
        (SimpleValue::Guid(g), TargetType::String) => {
            Ok(SimpleValue::String(g.hyphenated().to_string()))
        }
        (SimpleValue::DateTime(dt), TargetType::DateTimeOffset) => {
            Ok(SimpleValue::DateTimeOffset(dt.fixed_offset()))
        }
        (SimpleValue::DateTime(dt), TargetType::EpochMillis) => {
            Ok(SimpleValue::Int64(dt.timestamp_millis()))
        }
        (SimpleValue::DateTimeOffset(dt), TargetType::DateTimeUtc) => {
            Ok(SimpleValue::DateTime(dt.with_timezone(&Utc)))
        }
        (SimpleValue::DateTimeOffset(dt), TargetType::EpochMillis) => {
            Ok(SimpleValue::Int64(dt.timestamp_millis()))
        }
        _ => Err(unsupported()),
    }
}

fn is_numeric_literal(literal: &str) -> bool {
    !literal.is_empty()
        && literal
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Parse a floating-point literal, accepting `INF`, `-INF` and `NaN` only in
/// that spelling
fn parse_float(literal: &str) -> Option<f64> {
    match literal {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ if is_numeric_literal(literal) => literal.parse().ok(),
        _ => None,
    }
}

/// Split `/Date(<millis>[±<offset minutes>])/`
fn parse_json_date(literal: &str) -> Option<(i64, Option<i32>)> {
    let inner = literal.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let split = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(index, _)| index);
    match split {
        Some(index) => {
            let millis = inner[..index].parse().ok()?;
            let offset = inner[index..].parse().ok()?;
            Some((millis, Some(offset)))
        }
        None => Some((inner.parse().ok()?, None)),
    }
}

fn parse_iso_date_time(literal: &str) -> Option<DateTime<Utc>> {
    let text = literal.strip_suffix('Z').unwrap_or(literal);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_iso_date_time_offset(literal: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(value) = DateTime::parse_from_rfc3339(literal) {
        return Some(value);
    }
    let text = match literal.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => literal.to_string(),
    };
    DateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M%:z").ok()
}

/// Parse an `xs:duration` restricted to days, hours, minutes and seconds
fn parse_duration(literal: &str) -> Option<chrono::Duration> {
    let (negative, rest) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut millis: i64 = 0;
    if !date_part.is_empty() {
        let days: i64 = date_part.strip_suffix('D')?.parse().ok()?;
        millis = millis.checked_add(days.checked_mul(86_400_000)?)?;
    }

    if let Some(mut time) = time_part {
        if time.is_empty() {
            return None;
        }
        for (designator, factor) in [('H', 3_600_000i64), ('M', 60_000)] {
            if let Some(index) = time.find(designator) {
                let amount: i64 = time[..index].parse().ok()?;
                millis = millis.checked_add(amount.checked_mul(factor)?)?;
                time = &time[index + 1..];
            }
        }
        if !time.is_empty() {
            let seconds = time.strip_suffix('S')?;
            if !seconds.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return None;
            }
            let seconds: f64 = seconds.parse().ok()?;
            millis = millis.checked_add((seconds * 1000.0).round() as i64)?;
        }
    } else if date_part.is_empty() {
        return None;
    }

    chrono::Duration::try_milliseconds(if negative { -millis } else { millis })
}
