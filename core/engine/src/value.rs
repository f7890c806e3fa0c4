//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the tagged value stored under each field of a submission record.
//! CONTEXT: Submissions are schema-less, so a value can be any JSON primitive or a
//! nested structure. Every consumer (tabulation, cross-tab grouping) sees values only
//! through `to_display_string`, which is the single normalization step of the engine.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::EngineError;

/// A single field value within a submission record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`, kept exact.
    Unsigned(u64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the display form of the value.
    ///
    /// Scalars render as their plain text, null renders as an empty string and
    /// nested values render as compact JSON whose leaves are normalized the same
    /// way. Fails only for non-finite floats, which have no display form.
    pub fn to_display_string(&self) -> Result<String, EngineError> {
        let mut out = String::new();
        self.write_display(&mut out, false)?;
        Ok(out)
    }

    fn write_display(&self, out: &mut String, nested: bool) -> Result<(), EngineError> {
        match self {
            FieldValue::Null => {
                if nested {
                    out.push_str("\"\"");
                }
            }
            FieldValue::Bool(b) => {
                let s = if *b { "true" } else { "false" };
                push_leaf(out, s, nested);
            }
            FieldValue::Integer(n) => {
                let s = n.to_string();
                push_leaf(out, &s, nested);
            }
            FieldValue::Unsigned(n) => {
                let s = n.to_string();
                push_leaf(out, &s, nested);
            }
            FieldValue::Float(f) => {
                let s = format_float(*f)?;
                push_leaf(out, &s, nested);
            }
            FieldValue::Text(s) => push_leaf(out, s, nested),
            FieldValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_display(out, true)?;
                }
                out.push(']');
            }
            FieldValue::Map(entries) => {
                out.push('{');
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    push_quoted(out, key);
                    out.push(':');
                    item.write_display(out, true)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }
}

/// Leaves inside a nested value are quoted so the result stays valid JSON.
fn push_leaf(out: &mut String, s: &str, nested: bool) {
    if nested {
        push_quoted(out, s);
    } else {
        out.push_str(s);
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

fn format_float(f: f64) -> Result<String, EngineError> {
    if !f.is_finite() {
        return Err(EngineError::MalformedValue(format!(
            "non-finite number {}",
            f
        )));
    }
    // Display for f64 already drops a zero fraction ("2" for 2.0)
    Ok(format!("{}", f))
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => FieldValue::Unsigned(n),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Unsigned(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(entries) => FieldValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// SERDE
// ============================================================================

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Unsigned(n) => serializer.serialize_u64(*n),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Map(entries) => entries.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<FieldValue, D::Error> {
        FieldValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(FieldValue::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(FieldValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldValue, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, FieldValue>()? {
            entries.insert(key, value);
        }
        Ok(FieldValue::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        assert_eq!(FieldValue::text("north").to_display_string().unwrap(), "north");
        assert_eq!(FieldValue::Integer(42).to_display_string().unwrap(), "42");
        assert_eq!(FieldValue::Float(1.5).to_display_string().unwrap(), "1.5");
        assert_eq!(FieldValue::Float(2.0).to_display_string().unwrap(), "2");
        assert_eq!(FieldValue::Bool(true).to_display_string().unwrap(), "true");
        assert_eq!(FieldValue::Null.to_display_string().unwrap(), "");
    }

    #[test]
    fn test_nested_display_is_json() {
        let mut inner = BTreeMap::new();
        inner.insert("lat".to_string(), FieldValue::Float(9.5));
        inner.insert("note".to_string(), FieldValue::Null);
        let value = FieldValue::List(vec![FieldValue::Map(inner), FieldValue::Integer(3)]);

        assert_eq!(
            value.to_display_string().unwrap(),
            r#"[{"lat":"9.5","note":""},"3"]"#
        );
    }

    #[test]
    fn test_non_finite_float_is_malformed() {
        let err = FieldValue::Float(f64::NAN).to_display_string().unwrap_err();
        assert!(matches!(err, EngineError::MalformedValue(_)));

        let nested = FieldValue::List(vec![FieldValue::Float(f64::INFINITY)]);
        assert!(nested.to_display_string().is_err());
    }

    #[test]
    fn test_large_unsigned_stays_exact() {
        let json: serde_json::Value = serde_json::from_str("18446744073709551615").unwrap();
        let value = FieldValue::from(&json);
        assert_eq!(value, FieldValue::Unsigned(u64::MAX));
        assert_eq!(value.to_display_string().unwrap(), "18446744073709551615");

        let parsed: FieldValue = serde_json::from_str("[18446744073709551615, 7]").unwrap();
        assert_eq!(
            parsed,
            FieldValue::List(vec![FieldValue::Unsigned(u64::MAX), FieldValue::Integer(7)])
        );
        assert_eq!(parsed.to_display_string().unwrap(), r#"["18446744073709551615","7"]"#);
    }

    #[test]
    fn test_quoting_escapes_nested_text() {
        let value = FieldValue::List(vec![FieldValue::text("say \"hi\"")]);
        assert_eq!(value.to_display_string().unwrap(), r#"["say \"hi\""]"#);
    }

    #[test]
    fn test_deserialize_keeps_integers() {
        let value: FieldValue = serde_json::from_str(r#"{"a": 1, "b": 1.25, "c": [true, null]}"#).unwrap();
        match value {
            FieldValue::Map(entries) => {
                assert_eq!(entries["a"], FieldValue::Integer(1));
                assert_eq!(entries["b"], FieldValue::Float(1.25));
                assert_eq!(
                    entries["c"],
                    FieldValue::List(vec![FieldValue::Bool(true), FieldValue::Null])
                );
            }
            other => panic!("expected map, got {:?}", other),
        }
    }
}
