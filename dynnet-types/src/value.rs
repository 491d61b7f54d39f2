use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Double,
    Bool,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::Bool => "bool",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

/// Typed payload carried by an interval.
///
/// # Examples
///
/// ```
/// use dynnet_types::value::{AttrValue, ValueType};
///
/// let v = AttrValue::from("red");
/// assert_eq!(v.value_type(), ValueType::String);
/// assert_eq!(v.to_string(), "red");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl AttrValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AttrValue::Int(_) => ValueType::Int,
            AttrValue::Double(_) => ValueType::Double,
            AttrValue::Bool(_) => ValueType::Bool,
            AttrValue::String(_) => ValueType::String,
        }
    }

    /// Numeric view of the value, `None` for booleans and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Double(v) => Some(*v),
            AttrValue::Bool(_) | AttrValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Double(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

/// Reduce two optional values to their minimum.
///
/// A missing side yields the other side. Ints and doubles compare
/// numerically, booleans reduce to `false`, and strings or mixed types have
/// no minimum.
pub fn compare_min(a: Option<AttrValue>, b: Option<AttrValue>) -> Option<AttrValue> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(AttrValue::Int(x)), Some(AttrValue::Int(y))) => Some(AttrValue::Int(x.min(y))),
        (Some(AttrValue::Double(x)), Some(AttrValue::Double(y))) => {
            Some(AttrValue::Double(if x < y { x } else { y }))
        }
        (Some(AttrValue::Bool(_)), Some(AttrValue::Bool(_))) => Some(AttrValue::Bool(false)),
        _ => None,
    }
}

/// Reduce two optional values to their maximum. Mirror of [`compare_min`],
/// with booleans reducing to `true`.
pub fn compare_max(a: Option<AttrValue>, b: Option<AttrValue>) -> Option<AttrValue> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(AttrValue::Int(x)), Some(AttrValue::Int(y))) => Some(AttrValue::Int(x.max(y))),
        (Some(AttrValue::Double(x)), Some(AttrValue::Double(y))) => {
            Some(AttrValue::Double(if x < y { y } else { x }))
        }
        (Some(AttrValue::Bool(_)), Some(AttrValue::Bool(_))) => Some(AttrValue::Bool(true)),
        _ => None,
    }
}
