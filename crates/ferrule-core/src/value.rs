//! The dynamically-typed runtime datum.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A value flowing through the engine: an input field, an intermediate
/// expression result, or an assignment.
///
/// This is a plain tagged enum, not a generic object box — the evaluator's
/// type classification (`spec.md` §4.4) is a `match`, never reflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Exact, scale-preserving decimal. Never a binary float.
    Number(Decimal),
    String(String),
    /// Naive wall-clock instant; no time-zone offset.
    DateTime(NaiveDateTime),
}

/// The runtime type tag of a [`Value`], used for classification independent
/// of the value's contents (e.g. a type-annotated field read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    DateTime,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::DateTime(_) => ValueType::DateTime,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Default stringification used by concatenation and string coercion
    /// when no targeted converter applies. Numbers render via their own
    /// `Display` (no trailing zero padding beyond what the decimal already
    /// carries); booleans render as `true`/`false`; null renders as the
    /// empty string (the converter registry decides this per
    /// `treatNullStringAsEmpty`, this is just the raw fallback).
    pub fn default_string_form(&self, datetime_format: &str) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::DateTime(dt) => dt.format(datetime_format).to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Boolean => "bool",
            ValueType::Number => "decimal",
            ValueType::String => "string",
            ValueType::DateTime => "datetime",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_stringifies_empty() {
        assert_eq!(Value::Null.default_string_form("%Y-%m-%d"), "");
    }

    #[test]
    fn number_round_trips_exactly() {
        let v = Value::Number(Decimal::new(12345, 2)); // 123.45
        assert_eq!(v.default_string_form("%Y-%m-%d"), "123.45");
    }
}
