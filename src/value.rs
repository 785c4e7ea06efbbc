//! Scalar Values and Records
//!
//! The store is schema-less: a record is a mapping from field name to a
//! scalar value, and fields vary per record and per table. Values are a
//! closed sum of string, integer, and float; anything else is rejected at
//! the conversion boundary rather than carried around as dynamic JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DynqlError, Result};

/// A scalar stored in a record field
///
/// Serde representation is untagged so JSON scalars map directly:
/// `"x"` → `Str`, `1` → `Int`, `1.5` → `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float (stored data only; never produced from SQL text)
    Float(f64),
    /// UTF-8 string
    Str(String),
}

/// A schema-less record: field name → scalar value
///
/// `BTreeMap` keeps field iteration deterministic, which the formatter and
/// the expression builder both rely on.
pub type Record = BTreeMap<String, Value>;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Coerce a literal token from SQL text into a typed scalar
///
/// Rules, applied in order:
/// 1. Wrapped in matching single or double quotes → string, one outer quote
///    pair stripped; interior characters are kept verbatim.
/// 2. Every character is a decimal digit → integer.
/// 3. Anything else → the raw token as a string.
///
/// No error is ever raised here; unparseable shapes pass through as
/// strings. There is no float literal form in SQL text.
#[must_use]
pub fn coerce_literal(token: &str) -> Value {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return Value::Str(token[1..token.len() - 1].to_string());
        }
    }
    if !token.is_empty() && bytes.iter().all(u8::is_ascii_digit) {
        // Digit runs too long for i64 fall through to the string arm
        if let Ok(n) = token.parse::<i64>() {
            return Value::Int(n);
        }
    }
    Value::Str(token.to_string())
}

/// Convert a parsed JSON object into a record
///
/// The JSON itself has already parsed, so a non-scalar field value is a
/// validation failure, not a syntax one.
pub fn record_from_json(object: serde_json::Map<String, serde_json::Value>) -> Result<Record> {
    let mut record = Record::new();
    for (field, raw) in object {
        let value = serde_json::from_value::<Value>(raw).map_err(|_| {
            DynqlError::validation(format!(
                "field '{field}' must be a string or number scalar"
            ))
        })?;
        record.insert(field, value);
    }
    Ok(record)
}
