use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::filter::CompareOp;

/// Property map in insertion order. Export keeps keys where they were written.
pub type Properties = IndexMap<String, Value>;

/// A scalar property value.
///
/// Untagged on the wire: JSON `1` is `Int`, `1.5` is `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Name of the scalar kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Compare `self` (the stored property) against `other` (the literal).
    ///
    /// Integers and floats compare numerically with each other. Strings and
    /// booleans only compare with their own kind; anything else is a
    /// `TypeMismatch` rather than a silent `false`.
    pub fn compare(&self, op: CompareOp, other: &Value) -> Result<bool> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => {
                return Err(GraphError::TypeMismatch {
                    left: self.kind(),
                    op,
                    right: other.kind(),
                })
            }
        };

        // Unordered floats (NaN) are only ever "not equal".
        Ok(match ordering {
            Some(ord) => op.matches(ord),
            None => op == CompareOp::Ne,
        })
    }

    /// Convert a JSON scalar. `key` only feeds the error message.
    pub fn from_json(key: &str, json: serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        match json {
            Json::Bool(b) => Ok(Value::Bool(b)),
            Json::String(s) => Ok(Value::Str(s)),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .ok_or_else(|| GraphError::UnsupportedValue {
                    key: key.to_string(),
                    value: n.to_string(),
                }),
            other => Err(GraphError::UnsupportedValue {
                key: key.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Parse a JSON object of scalars into a property map, keeping key order.
pub fn properties_from_json(json: serde_json::Value) -> Result<Properties> {
    let serde_json::Value::Object(map) = json else {
        return Err(GraphError::NotAnObject(json.to_string()));
    };

    let mut props = Properties::with_capacity(map.len());
    for (key, value) in map {
        let value = Value::from_json(&key, value)?;
        props.insert(key, value);
    }
    Ok(props)
}

/// Parse the text of a JSON object (`{"since": 2018}`) into properties.
///
/// Keys keep the order they have in `text`.
pub fn properties_from_str(text: &str) -> Result<Properties> {
    let map: IndexMap<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|e| GraphError::NotAnObject(format!("{text} ({e})")))?;

    let mut props = Properties::with_capacity(map.len());
    for (key, value) in map {
        let value = Value::from_json(&key, value)?;
        props.insert(key, value);
    }
    Ok(props)
}
