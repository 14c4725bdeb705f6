use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A primitive (or, for `Json`/`StringArray`, structured) domain value.
///
/// Literals in a filter carry a `Value`; bind arguments extracted from a
/// rendered SQL fragment are `Value`s as well. `Null` represents an explicit
/// SQL NULL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
    StringArray(Vec<String>),
    Null,
}

/// Base types used for comparison type inference.
///
/// An untyped operand adopts the base type of the typed side of a
/// comparison; a mismatch between two known base types is tolerated and left
/// to the database's own coercion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BaseType {
    String,
    Boolean,
    Integer,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
}

impl Value {
    /// The base type of this value, or `None` for `Null` and values that are
    /// not primitive (JSON, string arrays).
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Value::Int(_) => Some(BaseType::Integer),
            Value::Float(_) => Some(BaseType::Double),
            Value::String(_) => Some(BaseType::String),
            Value::Boolean(_) => Some(BaseType::Boolean),
            Value::Date(_) => Some(BaseType::Date),
            Value::Timestamp(_) => Some(BaseType::DateTime),
            Value::Uuid(_) => Some(BaseType::String),
            Value::Json(_) | Value::StringArray(_) | Value::Null => None,
        }
    }

    /// Whether this value can be bound as a single SQL argument.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Json(_) | Value::StringArray(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.parse::<i64>().ok(),
            Value::Boolean(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Json(_) | Value::StringArray(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::String(v) => v.parse::<bool>().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::StringArray(v) => write!(f, "{v:?}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_type_of_primitives() {
        assert_eq!(Value::Int(7).base_type(), Some(BaseType::Integer));
        assert_eq!(
            Value::String("x".into()).base_type(),
            Some(BaseType::String)
        );
        assert_eq!(Value::Null.base_type(), None);
    }

    #[test]
    fn json_and_arrays_are_not_primitive() {
        assert!(!Value::Json(serde_json::json!({"a": 1})).is_primitive());
        assert!(!Value::StringArray(vec!["a".into()]).is_primitive());
        assert!(Value::Null.is_primitive());
        assert!(Value::Boolean(true).is_primitive());
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(Value::String("42".into()).as_i64(), Some(42));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Uuid(Uuid::nil()).as_f64(), None);
    }
}
