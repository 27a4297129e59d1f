//! MongoDB Extended JSON decoding
//!
//! Converts canonical and relaxed Extended JSON (v2, plus the legacy `$binary`
//! / `$type` and `$regex` / `$options` forms) into [`Value`] trees. Plain JSON
//! is accepted as-is: integers that fit 32 bits become `Int32`, larger ones
//! `Int64`, anything else `Double`.

use std::io::{BufRead, Lines};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use super::{Document, Value};
use crate::inference::InferenceError;

impl Value {
    /// Decode an Extended JSON value
    pub fn from_extended_json(json: JsonValue) -> Result<Value, InferenceError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Boolean(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(match i32::try_from(i) {
                        Ok(small) => Value::Int32(small),
                        Err(_) => Value::Int64(i),
                    })
                } else {
                    // u64 beyond i64::MAX or a float
                    Ok(Value::Double(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            JsonValue::String(s) => Ok(Value::String(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(Value::from_extended_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            JsonValue::Object(map) => decode_object(map),
        }
    }
}

impl Document {
    /// Decode an Extended JSON object into a document
    pub fn from_extended_json(json: JsonValue) -> Result<Document, InferenceError> {
        match Value::from_extended_json(json)? {
            Value::Document(doc) => Ok(doc),
            other => Err(InferenceError::InvalidStructure(other.kind().to_string())),
        }
    }

    /// Parse a JSON string into a document
    pub fn from_json_str(json: &str) -> Result<Document, InferenceError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Document::from_extended_json(value)
    }
}

/// Iterator over newline-delimited Extended JSON documents
///
/// Blank lines are skipped. Each item is either a decoded document or the
/// error for that line; iteration continues after an error.
pub struct JsonLines<R> {
    lines: Lines<R>,
    line_number: usize,
}

/// Read newline-delimited Extended JSON documents from `reader`
pub fn read_json_lines<R: BufRead>(reader: R) -> JsonLines<R> {
    JsonLines {
        lines: reader.lines(),
        line_number: 0,
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<Document, InferenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let line_number = self.line_number;
            return Some(Document::from_json_str(&line).map_err(|e| match e {
                InferenceError::JsonParse(msg) => {
                    InferenceError::JsonParse(format!("line {}: {}", line_number, msg))
                }
                other => other,
            }));
        }
    }
}

fn decode_object(map: Map<String, JsonValue>) -> Result<Value, InferenceError> {
    if let Some(value) = decode_wrapper(&map)? {
        return Ok(value);
    }

    let mut doc = Document::new();
    for (key, value) in map {
        doc.insert(key, Value::from_extended_json(value)?);
    }
    Ok(Value::Document(doc))
}

/// Decode a `$`-keyed type wrapper, or return `None` for an ordinary object
fn decode_wrapper(map: &Map<String, JsonValue>) -> Result<Option<Value>, InferenceError> {
    if !map.keys().any(|k| k.starts_with('$')) {
        return Ok(None);
    }

    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();

    let value = match keys.as_slice() {
        ["$oid"] => Value::ObjectId(parse_object_id("$oid", &map["$oid"])?),
        ["$date"] => Value::DateTime(parse_date(&map["$date"])?),
        ["$numberInt"] => {
            let s = expect_str("$numberInt", &map["$numberInt"])?;
            Value::Int32(
                s.parse()
                    .map_err(|_| invalid("$numberInt", format!("not a 32-bit integer: {}", s)))?,
            )
        }
        ["$numberLong"] => Value::Int64(parse_long("$numberLong", &map["$numberLong"])?),
        ["$numberDouble"] => {
            let s = expect_str("$numberDouble", &map["$numberDouble"])?;
            Value::Double(parse_double(s)?)
        }
        ["$numberDecimal"] => {
            let s = expect_str("$numberDecimal", &map["$numberDecimal"])?;
            Value::Decimal128(s.to_string())
        }
        ["$binary"] => {
            let inner = expect_object("$binary", &map["$binary"])?;
            let data = inner
                .get("base64")
                .ok_or_else(|| invalid("$binary", "missing base64".to_string()))?;
            let subtype = inner
                .get("subType")
                .ok_or_else(|| invalid("$binary", "missing subType".to_string()))?;
            Value::Binary {
                subtype: parse_subtype(subtype)?,
                bytes: decode_base64(data)?,
            }
        }
        ["$binary", "$type"] => Value::Binary {
            subtype: parse_subtype(&map["$type"])?,
            bytes: decode_base64(&map["$binary"])?,
        },
        ["$minKey"] => Value::MinKey,
        ["$maxKey"] => Value::MaxKey,
        ["$regularExpression"] => {
            let inner = expect_object("$regularExpression", &map["$regularExpression"])?;
            Value::RegularExpression {
                pattern: field_str("$regularExpression", inner, "pattern")?,
                options: field_str("$regularExpression", inner, "options")?,
            }
        }
        ["$options", "$regex"] => Value::RegularExpression {
            pattern: expect_str("$regex", &map["$regex"])?.to_string(),
            options: expect_str("$options", &map["$options"])?.to_string(),
        },
        ["$code"] | ["$code", "$scope"] => {
            Value::JavaScript(expect_str("$code", &map["$code"])?.to_string())
        }
        ["$symbol"] => Value::Symbol(expect_str("$symbol", &map["$symbol"])?.to_string()),
        ["$timestamp"] => {
            let inner = expect_object("$timestamp", &map["$timestamp"])?;
            Value::Timestamp {
                time: field_u32("$timestamp", inner, "t")?,
                increment: field_u32("$timestamp", inner, "i")?,
            }
        }
        ["$undefined"] => Value::Undefined,
        ["$dbPointer"] => {
            let inner = expect_object("$dbPointer", &map["$dbPointer"])?;
            let id = inner
                .get("$id")
                .and_then(JsonValue::as_object)
                .and_then(|id| id.get("$oid"))
                .ok_or_else(|| invalid("$dbPointer", "missing $id.$oid".to_string()))?;
            Value::DbPointer {
                namespace: field_str("$dbPointer", inner, "$ref")?,
                id: parse_object_id("$dbPointer", id)?,
            }
        }
        // Anything else (e.g. a DBRef with $ref/$id) is an ordinary document
        _ => return Ok(None),
    };

    Ok(Some(value))
}

fn invalid(key: &str, reason: String) -> InferenceError {
    InferenceError::InvalidExtendedJson {
        key: key.to_string(),
        reason,
    }
}

fn expect_str<'a>(key: &str, value: &'a JsonValue) -> Result<&'a str, InferenceError> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, "expected a string".to_string()))
}

fn expect_object<'a>(
    key: &str,
    value: &'a JsonValue,
) -> Result<&'a Map<String, JsonValue>, InferenceError> {
    value
        .as_object()
        .ok_or_else(|| invalid(key, "expected an object".to_string()))
}

fn field_str(key: &str, map: &Map<String, JsonValue>, field: &str) -> Result<String, InferenceError> {
    map.get(field)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(key, format!("missing string field '{}'", field)))
}

fn field_u32(key: &str, map: &Map<String, JsonValue>, field: &str) -> Result<u32, InferenceError> {
    map.get(field)
        .and_then(JsonValue::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(key, format!("field '{}' must be a 32-bit unsigned integer", field)))
}

fn parse_object_id(key: &str, value: &JsonValue) -> Result<[u8; 12], InferenceError> {
    let s = expect_str(key, value)?;
    let mut bytes = [0u8; 12];
    hex::decode_to_slice(s, &mut bytes)
        .map_err(|e| invalid(key, format!("invalid object id '{}': {}", s, e)))?;
    Ok(bytes)
}

fn parse_long(key: &str, value: &JsonValue) -> Result<i64, InferenceError> {
    let s = expect_str(key, value)?;
    s.parse()
        .map_err(|_| invalid(key, format!("not a 64-bit integer: {}", s)))
}

fn parse_double(s: &str) -> Result<f64, InferenceError> {
    match s {
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => s
            .parse()
            .map_err(|_| invalid("$numberDouble", format!("not a double: {}", s))),
    }
}

fn parse_date(value: &JsonValue) -> Result<DateTime<Utc>, InferenceError> {
    let millis = match value {
        JsonValue::String(s) => {
            return DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid("$date", format!("invalid date '{}': {}", s, e)));
        }
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid("$date", "milliseconds must be an integer".to_string()))?,
        JsonValue::Object(inner) => {
            let long = inner
                .get("$numberLong")
                .ok_or_else(|| invalid("$date", "expected $numberLong".to_string()))?;
            parse_long("$date", long)?
        }
        _ => return Err(invalid("$date", "unsupported date representation".to_string())),
    };

    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| invalid("$date", format!("timestamp out of range: {}", millis)))
}

fn parse_subtype(value: &JsonValue) -> Result<u8, InferenceError> {
    let s = expect_str("$binary", value)?;
    u8::from_str_radix(s, 16).map_err(|_| invalid("$binary", format!("invalid subtype: {}", s)))
}

fn decode_base64(value: &JsonValue) -> Result<Vec<u8>, InferenceError> {
    let s = expect_str("$binary", value)?;
    BASE64
        .decode(s)
        .map_err(|e| invalid("$binary", format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ValueKind;
    use serde_json::json;

    fn kind_of(json: JsonValue) -> ValueKind {
        Value::from_extended_json(json).unwrap().kind()
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(kind_of(json!(42)), ValueKind::Int32);
        assert_eq!(kind_of(json!(5_000_000_000i64)), ValueKind::Int64);
        assert_eq!(kind_of(json!(1.5)), ValueKind::Double);
        assert_eq!(kind_of(json!(u64::MAX)), ValueKind::Double);
    }

    #[test]
    fn test_type_wrappers() {
        assert_eq!(
            kind_of(json!({"$oid": "5f1d7f3e9b1e8a3f1c2b4a5d"})),
            ValueKind::ObjectId
        );
        assert_eq!(
            kind_of(json!({"$date": "2024-01-15T10:30:00Z"})),
            ValueKind::DateTime
        );
        assert_eq!(
            kind_of(json!({"$date": {"$numberLong": "1705314600000"}})),
            ValueKind::DateTime
        );
        assert_eq!(kind_of(json!({"$numberLong": "7"})), ValueKind::Int64);
        assert_eq!(kind_of(json!({"$numberInt": "7"})), ValueKind::Int32);
        assert_eq!(kind_of(json!({"$numberDouble": "-Infinity"})), ValueKind::Double);
        assert_eq!(kind_of(json!({"$numberDecimal": "1.10"})), ValueKind::Decimal128);
        assert_eq!(kind_of(json!({"$minKey": 1})), ValueKind::MinKey);
        assert_eq!(kind_of(json!({"$maxKey": 1})), ValueKind::MaxKey);
        assert_eq!(kind_of(json!({"$undefined": true})), ValueKind::Undefined);
        assert_eq!(
            kind_of(json!({"$timestamp": {"t": 1, "i": 2}})),
            ValueKind::Timestamp
        );
        assert_eq!(
            kind_of(json!({"$regularExpression": {"pattern": "^a", "options": "i"}})),
            ValueKind::RegularExpression
        );
    }

    #[test]
    fn test_binary_forms() {
        let canonical =
            Value::from_extended_json(json!({"$binary": {"base64": "AQID", "subType": "00"}}))
                .unwrap();
        assert_eq!(
            canonical,
            Value::Binary {
                subtype: 0,
                bytes: vec![1, 2, 3]
            }
        );

        let legacy = Value::from_extended_json(json!({"$binary": "AQID", "$type": "05"})).unwrap();
        assert_eq!(
            legacy,
            Value::Binary {
                subtype: 5,
                bytes: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn test_dbref_is_a_document() {
        let value = Value::from_extended_json(json!({
            "$ref": "users",
            "$id": {"$oid": "5f1d7f3e9b1e8a3f1c2b4a5d"}
        }))
        .unwrap();

        let doc = value.as_document().unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["$ref", "$id"]);
        assert_eq!(doc.get("$id").unwrap().kind(), ValueKind::ObjectId);
    }

    #[test]
    fn test_field_order_preserved() {
        let doc = Document::from_json_str(r#"{"z": 1, "a": {"y": 2, "b": 3}}"#).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["z", "a"]);

        let nested = doc.get("a").unwrap().as_document().unwrap();
        assert_eq!(nested.keys().collect::<Vec<_>>(), vec!["y", "b"]);
    }

    #[test]
    fn test_invalid_wrappers() {
        let err = Value::from_extended_json(json!({"$oid": "nothex"})).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidExtendedJson { ref key, .. } if key == "$oid"));

        let err = Value::from_extended_json(json!({"$numberLong": 5})).unwrap_err();
        assert!(err.to_string().contains("$numberLong"));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = Document::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidStructure(_)));

        let err = Document::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, InferenceError::JsonParse(_)));
    }

    #[test]
    fn test_json_lines() {
        let input = "{\"_id\": 1}\n\n{\"_id\": 2}\n{broken\n";
        let results: Vec<_> = read_json_lines(input.as_bytes()).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        match &results[2] {
            Err(InferenceError::JsonParse(msg)) => assert!(msg.starts_with("line 4")),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }
}
