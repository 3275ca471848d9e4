//! Attribute values
//!
//! The closed set of value kinds an item field can hold.

use crate::types::JsonValue;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single field value inside an [`Item`](super::Item)
///
/// On the JSON wire values are written as plain JSON. Binary values are
/// written as base64 strings and therefore read back as [`AttributeValue::S`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number (integer or float)
    N(Number),
    /// String
    S(String),
    /// Binary blob
    B(Vec<u8>),
    /// Ordered list of values
    L(Vec<AttributeValue>),
    /// Nested mapping
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Short type tag ("S", "N", ...) used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::N(_) => "N",
            Self::S(_) => "S",
            Self::B(_) => "B",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::N(n) => n.as_f64(),
            _ => None,
        }
    }

    /// String form of a scalar key value
    ///
    /// Strings are returned as-is, numbers in their canonical decimal form
    /// and binaries base64-encoded. Other kinds cannot be keys.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Self::S(s) => Some(s.clone()),
            Self::N(n) => Some(n.to_string()),
            Self::B(b) => Some(base64::engine::general_purpose::STANDARD.encode(b)),
            _ => None,
        }
    }

    /// Compare two values of the same kind
    ///
    /// Returns `None` when the kinds differ or are not ordered.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::S(a), Self::S(b)) => Some(a.cmp(b)),
            (Self::B(a), Self::B(b)) => Some(a.cmp(b)),
            (Self::N(a), Self::N(b)) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
            },
            _ => None,
        }
    }

    /// Convert to a plain JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::N(n) => JsonValue::Number(n.clone()),
            Self::S(s) => JsonValue::String(s.clone()),
            Self::B(b) => JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b)),
            Self::L(values) => JsonValue::Array(values.iter().map(Self::to_json).collect()),
            Self::M(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for AttributeValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::N(n),
            JsonValue::String(s) => Self::S(s),
            JsonValue::Array(values) => Self::L(values.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => {
                Self::M(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::N(n.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::N)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        Self::B(b)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Self::from)
    }
}
