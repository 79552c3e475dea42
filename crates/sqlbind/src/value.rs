//! Engine-neutral SQL values and the conversions between them and struct fields.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// An owned SQL value, independent of the database engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp in UTC.
    TimestampTz(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
        }
    }

    /// Render as text for engines without native timestamp storage.
    pub(crate) fn timestamp_text(&self) -> Option<String> {
        match self {
            Value::Timestamp(t) => Some(t.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::TimestampTz(t) => Some(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            _ => None,
        }
    }
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueError(String);

impl ValueError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    fn unexpected(expected: &str, got: &Value) -> Self {
        Self(format!("expected {expected}, got {}", got.type_name()))
    }
}

/// Produce a [`Value`] for a bound parameter.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Build a Rust value from a scanned [`Value`].
///
/// Takes the value by reference so a buffered row is read in place; only owned
/// targets (`String`, `Vec<u8>`) copy their payload.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

/// In-place assignment into a field; the object-safe face of [`FromValue`].
pub trait Assign {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError>;
}

impl<T: FromValue> Assign for T {
    fn assign(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

/// Time values stored as integer seconds since the Unix epoch.
pub trait EpochTime {
    fn to_epoch(&self) -> Value;
    fn assign_epoch(&mut self, value: &Value) -> Result<(), ValueError>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match *value {
            Value::Bool(b) => Ok(b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(i) => Err(ValueError::new(format!(
                "integer {i} is not a valid bool (expected 0 or 1)"
            ))),
            ref other => Err(ValueError::unexpected("bool", other)),
        }
    }
}

macro_rules! impl_integer {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::Integer(i64::from(*self))
            }
        }

        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, ValueError> {
                match *value {
                    Value::Integer(i) => <$t>::try_from(i).map_err(|_| {
                        ValueError::new(format!(
                            "integer {i} out of range for {}",
                            stringify!($t)
                        ))
                    }),
                    Value::Bool(b) => Ok(<$t>::from(b)),
                    ref other => Err(ValueError::unexpected("integer", other)),
                }
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match *value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            ref other => Err(ValueError::unexpected("real", other)),
        }
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Blob(b) => std::str::from_utf8(b)
                .map(str::to_owned)
                .map_err(|e| ValueError::new(format!("blob is not valid UTF-8: {e}"))),
            other => Err(ValueError::unexpected("text", other)),
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(ValueError::unexpected("blob", other)),
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ValueError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t.and_utc());
        }
    }
    Err(ValueError::new(format!("`{s}` is not a recognized timestamp")))
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>, ValueError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ValueError::new(format!("epoch {secs} is out of range")))
}

fn timestamp_from_value(value: &Value) -> Result<DateTime<Utc>, ValueError> {
    match value {
        Value::TimestampTz(t) => Ok(*t),
        Value::Timestamp(t) => Ok(t.and_utc()),
        Value::Text(s) => parse_timestamp(s),
        Value::Integer(secs) => from_epoch(*secs),
        other => Err(ValueError::unexpected("timestamp", other)),
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        timestamp_from_value(value).map(|t| t.naive_utc())
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::TimestampTz(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        timestamp_from_value(value)
    }
}

impl EpochTime for DateTime<Utc> {
    fn to_epoch(&self) -> Value {
        Value::Integer(self.timestamp())
    }

    fn assign_epoch(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = timestamp_from_value(value)?;
        Ok(())
    }
}

impl EpochTime for Option<DateTime<Utc>> {
    fn to_epoch(&self) -> Value {
        match self {
            Some(t) => Value::Integer(t.timestamp()),
            None => Value::Null,
        }
    }

    fn assign_epoch(&mut self, value: &Value) -> Result<(), ValueError> {
        *self = match value {
            Value::Null => None,
            other => Some(timestamp_from_value(other)?),
        };
        Ok(())
    }
}


macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v.into())
            }
        }
    )*};
}

impl_from!(
    i32 => Integer,
    i64 => Integer,
    f64 => Real,
    bool => Bool,
    String => Text,
    &str => Text,
    Vec<u8> => Blob,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
