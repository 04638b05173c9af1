//! [`Value`], the dynamically typed cell used for both row ingestion and query
//! results.
//!
//! The REST encoding of query results sends every scalar as a string (or
//! `null`), wrapped in `{"v": ...}` objects, with repeated fields as arrays of
//! those objects and records as `{"f": [...]}`. Decoding is driven by the column
//! schema, so the resulting variant always follows the declared column type.
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Value as Json;

use crate::table::{FieldMode, FieldType, TableFieldSchema};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Named sub-values, in schema order.
    Record(Vec<(String, Value)>),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Record(_) => "record",
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(int) => Some(*int),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(float) => Some(*float),
            Self::Integer(int) => Some(*int as f64),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes the contents of a single `"v"` cell according to `field`.
    pub fn decode<S: AsRef<str>>(
        field: &TableFieldSchema<S>,
        cell: &Json,
    ) -> Result<Self, DecodeError> {
        match (field.mode, cell) {
            (_, Json::Null) => Ok(Self::Null),
            (FieldMode::Repeated, Json::Array(items)) => items
                .iter()
                .map(|item| decode_single(field, unwrap_cell(item)))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            (FieldMode::Repeated, other) => Err(DecodeError::shape(field, "an array", other)),
            (_, other) => decode_single(field, other),
        }
    }
}

/// Pulls the payload out of a `{"v": ...}` wrapper, treating a missing payload as null.
#[inline]
pub(crate) fn unwrap_cell(cell: &Json) -> &Json {
    static NULL: Json = Json::Null;
    cell.get("v").unwrap_or(&NULL)
}

fn decode_single<S: AsRef<str>>(
    field: &TableFieldSchema<S>,
    cell: &Json,
) -> Result<Value, DecodeError> {
    match (field.ty, cell) {
        (_, Json::Null) => Ok(Value::Null),
        (FieldType::Record, Json::Object(map)) => {
            let cells = match map.get("f") {
                Some(Json::Array(cells)) => cells.as_slice(),
                Some(other) => return Err(DecodeError::shape(field, "a record", other)),
                None => &[],
            };

            let mut record = Vec::with_capacity(field.fields.len());
            for (idx, sub_field) in field.fields.iter().enumerate() {
                let value = match cells.get(idx) {
                    Some(cell) => Value::decode(sub_field, unwrap_cell(cell))?,
                    None => Value::Null,
                };
                record.push((sub_field.name.as_ref().to_owned(), value));
            }

            Ok(Value::Record(record))
        }
        (FieldType::Record, other) => Err(DecodeError::shape(field, "a record", other)),
        (FieldType::Integer, Json::String(s)) => s
            .parse()
            .map(Value::Integer)
            .map_err(|_| DecodeError::scalar(field, s)),
        (FieldType::Integer, Json::Number(num)) => num
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| DecodeError::scalar(field, &num.to_string())),
        (FieldType::Float, Json::String(s)) => s
            .parse()
            .map(Value::Float)
            .map_err(|_| DecodeError::scalar(field, s)),
        (FieldType::Float, Json::Number(num)) => num
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| DecodeError::scalar(field, &num.to_string())),
        (FieldType::Bool, Json::String(s)) => match s.as_str() {
            "true" | "TRUE" => Ok(Value::Bool(true)),
            "false" | "FALSE" => Ok(Value::Bool(false)),
            _ => Err(DecodeError::scalar(field, s)),
        },
        (FieldType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (_, Json::String(s)) => Ok(Value::String(s.clone())),
        (_, Json::Number(num)) => Ok(Value::String(num.to_string())),
        (_, Json::Bool(b)) => Ok(Value::String(b.to_string())),
        (_, other) => Err(DecodeError::shape(field, "a scalar", other)),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("column '{column}': expected {expected}, found {found}")]
    UnexpectedShape {
        column: Box<str>,
        expected: &'static str,
        found: &'static str,
    },
    #[error("column '{column}': invalid {ty} value '{value}'")]
    InvalidScalar {
        column: Box<str>,
        ty: &'static str,
        value: Box<str>,
    },
}

impl DecodeError {
    fn shape<S: AsRef<str>>(
        field: &TableFieldSchema<S>,
        expected: &'static str,
        found: &Json,
    ) -> Self {
        let found = match found {
            Json::Null => "null",
            Json::Bool(_) => "a bool",
            Json::Number(_) => "a number",
            Json::String(_) => "a string",
            Json::Array(_) => "an array",
            Json::Object(_) => "an object",
        };

        Self::UnexpectedShape {
            column: Box::from(field.name.as_ref()),
            expected,
            found,
        }
    }

    fn scalar<S: AsRef<str>>(field: &TableFieldSchema<S>, value: &str) -> Self {
        Self::InvalidScalar {
            column: Box::from(field.name.as_ref()),
            ty: field.ty.as_str(),
            value: Box::from(value),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(int) => serializer.serialize_i64(*int),
            Self::Float(float) if float.is_finite() => serializer.serialize_f64(*float),
            // JSON has no representation for these, the service accepts them as strings.
            Self::Float(float) if float.is_nan() => serializer.serialize_str("NaN"),
            Self::Float(float) if float.is_sign_positive() => serializer.serialize_str("Infinity"),
            Self::Float(_) => serializer.serialize_str("-Infinity"),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::String(s) => f.write_str(s),
            Self::Array(values) => f.debug_list().entries(values.iter().map(DisplayAsDebug)).finish(),
            Self::Record(fields) => f
                .debug_map()
                .entries(fields.iter().map(|(k, v)| (k, DisplayAsDebug(v))))
                .finish(),
        }
    }
}

struct DisplayAsDebug<'a>(&'a Value);

impl fmt::Debug for DisplayAsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)
    }
}

macro_rules! impl_from {
    ($($variant:ident($($src:ty),* $(,)?) as $dst:ty;)*) => {
        $(
            $(
                impl From<$src> for Value {
                    #[inline]
                    fn from(value: $src) -> Self {
                        Self::$variant(<$dst>::from(value))
                    }
                }
            )*
        )*
    };
}

impl_from! {
    Bool(bool) as bool;
    Integer(i8, i16, i32, i64, u8, u16, u32) as i64;
    Float(f32, f64) as f64;
    String(&str, String, Box<str>) as String;
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(num) => match num.as_i64() {
                Some(int) => Self::Integer(int),
                // u64 values past i64::MAX and real floats both land here.
                None => Self::Float(num.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::String(s),
            Json::Array(values) => Self::Array(values.into_iter().map(Self::from).collect()),
            Json::Object(map) => {
                Self::Record(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
