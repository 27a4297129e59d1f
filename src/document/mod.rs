//! Document values consumed by the inference engine
//!
//! Documents are trees drawn from a closed set of value kinds. The engine only
//! ever looks at a value's [`ValueKind`] and, for containers, at its children,
//! so the data carried by scalar variants is kept for completeness rather than
//! interpreted.

pub mod extended_json;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use extended_json::{JsonLines, read_json_lines};

/// The kind of a document value
///
/// Only the kinds up to [`ValueKind::Array`] have a native SQL type; the
/// remaining ones are accepted but always projected as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Null,
    Boolean,
    Int32,
    Int64,
    Double,
    Decimal128,
    String,
    Binary,
    DateTime,
    ObjectId,
    MinKey,
    MaxKey,
    Document,
    Array,
    RegularExpression,
    JavaScript,
    Symbol,
    /// Replication timestamp (not a date)
    Timestamp,
    Undefined,
    DbPointer,
}

impl ValueKind {
    /// Every kind, in declaration order
    pub const ALL: [ValueKind; 20] = [
        ValueKind::Null,
        ValueKind::Boolean,
        ValueKind::Int32,
        ValueKind::Int64,
        ValueKind::Double,
        ValueKind::Decimal128,
        ValueKind::String,
        ValueKind::Binary,
        ValueKind::DateTime,
        ValueKind::ObjectId,
        ValueKind::MinKey,
        ValueKind::MaxKey,
        ValueKind::Document,
        ValueKind::Array,
        ValueKind::RegularExpression,
        ValueKind::JavaScript,
        ValueKind::Symbol,
        ValueKind::Timestamp,
        ValueKind::Undefined,
        ValueKind::DbPointer,
    ];

    /// Kind name as used in log output
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Double => "double",
            ValueKind::Decimal128 => "decimal128",
            ValueKind::String => "string",
            ValueKind::Binary => "binary",
            ValueKind::DateTime => "dateTime",
            ValueKind::ObjectId => "objectId",
            ValueKind::MinKey => "minKey",
            ValueKind::MaxKey => "maxKey",
            ValueKind::Document => "document",
            ValueKind::Array => "array",
            ValueKind::RegularExpression => "regularExpression",
            ValueKind::JavaScript => "javaScript",
            ValueKind::Symbol => "symbol",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Undefined => "undefined",
            ValueKind::DbPointer => "dbPointer",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single document value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// High-precision decimal, kept in its textual form
    Decimal128(String),
    String(String),
    Binary { subtype: u8, bytes: Vec<u8> },
    DateTime(DateTime<Utc>),
    ObjectId([u8; 12]),
    MinKey,
    MaxKey,
    Document(Document),
    Array(Vec<Value>),
    RegularExpression { pattern: String, options: String },
    JavaScript(String),
    Symbol(String),
    Timestamp { time: u32, increment: u32 },
    Undefined,
    DbPointer { namespace: String, id: [u8; 12] },
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Double(_) => ValueKind::Double,
            Value::Decimal128(_) => ValueKind::Decimal128,
            Value::String(_) => ValueKind::String,
            Value::Binary { .. } => ValueKind::Binary,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::ObjectId(_) => ValueKind::ObjectId,
            Value::MinKey => ValueKind::MinKey,
            Value::MaxKey => ValueKind::MaxKey,
            Value::Document(_) => ValueKind::Document,
            Value::Array(_) => ValueKind::Array,
            Value::RegularExpression { .. } => ValueKind::RegularExpression,
            Value::JavaScript(_) => ValueKind::JavaScript,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Timestamp { .. } => ValueKind::Timestamp,
            Value::Undefined => ValueKind::Undefined,
            Value::DbPointer { .. } => ValueKind::DbPointer,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

/// An ordered set of named fields
///
/// Field order is the order in which fields were first inserted; inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_preserves_insertion_order() {
        let doc = Document::new()
            .with("b", 1)
            .with("a", "x")
            .with("c", true);

        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_document_insert_replaces_in_place() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        let previous = doc.insert("a", "text");

        assert_eq!(previous, Some(Value::Int32(1)));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.keys().next(), Some("a"));
        assert_eq!(doc.get("a"), Some(&Value::String("text".to_string())));
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::Int64(5).kind(), ValueKind::Int64);
        assert_eq!(Value::Array(vec![]).kind(), ValueKind::Array);
        assert_eq!(Value::Document(Document::new()).kind(), ValueKind::Document);
        assert_eq!(
            Value::Timestamp {
                time: 1,
                increment: 2
            }
            .kind(),
            ValueKind::Timestamp
        );
    }
}
