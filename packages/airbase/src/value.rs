use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single cell value as returned by the record store.
///
/// The remote schema is dynamic - columns appear and change without code
/// changes - so values stay untyped at the boundary and callers
/// pattern-match on the tag instead of duck-typing. Anything outside the
/// known shapes is carried through unchanged in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    TextList(Vec<String>),
    Attachments(Vec<Attachment>),
    Other(Value),
}

/// One attachment descriptor. The store guarantees at least a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::TextList(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_attachments(&self) -> Option<&[Attachment]> {
        match self {
            FieldValue::Attachments(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => convert_list(items),
            other => FieldValue::Other(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => json!(n),
            FieldValue::Text(s) => Value::String(s),
            FieldValue::TextList(items) => {
                Value::Array(items.into_iter().map(Value::String).collect())
            }
            FieldValue::Attachments(items) => {
                serde_json::to_value(items).unwrap_or(Value::Null)
            }
            FieldValue::Other(v) => v,
        }
    }
}

fn convert_list(items: Vec<Value>) -> FieldValue {
    if items.iter().all(Value::is_string) {
        let texts = items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        return FieldValue::TextList(texts);
    }

    if let Some(attachments) = items.iter().map(to_attachment).collect::<Option<Vec<_>>>() {
        return FieldValue::Attachments(attachments);
    }

    FieldValue::Other(Value::Array(items))
}

fn to_attachment(v: &Value) -> Option<Attachment> {
    let url = v.get("url")?.as_str()?.to_string();
    Some(Attachment {
        url,
        id: v.get("id").and_then(Value::as_str).map(str::to_string),
        filename: v.get("filename").and_then(Value::as_str).map(str::to_string),
        content_type: v.get("type").and_then(Value::as_str).map(str::to_string),
        size: v.get("size").and_then(Value::as_u64),
    })
}

#[cfg(test)]
mod field_value_tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(FieldValue::from(json!("hello")).as_str(), Some("hello"));
        assert_eq!(FieldValue::from(json!(3.5)).as_f64(), Some(3.5));
        assert_eq!(FieldValue::from(json!(true)).as_bool(), Some(true));
        assert!(FieldValue::from(json!("x")).as_f64().is_none());
    }

    #[test]
    fn test_string_list() {
        let v = FieldValue::from(json!(["Policy", "Equity"]));
        assert_eq!(
            v.as_text_list(),
            Some(["Policy".to_string(), "Equity".to_string()].as_slice())
        );
    }

    #[test]
    fn test_attachment_list() {
        let v = FieldValue::from(json!([
            { "id": "att1", "url": "https://example.org/a.png", "filename": "a.png", "size": 1024 },
            { "url": "https://example.org/b.pdf" }
        ]));
        let attachments = v.as_attachments().expect("should parse as attachments");
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].url, "https://example.org/a.png");
        assert_eq!(attachments[0].size, Some(1024));
        assert!(attachments[1].id.is_none());
    }

    #[test]
    fn test_mixed_list_passes_through() {
        let raw = json!([1, "two", { "x": 3 }]);
        let v = FieldValue::from(raw.clone());
        assert_eq!(v, FieldValue::Other(raw));
    }

    #[test]
    fn test_list_without_url_passes_through() {
        let raw = json!([{ "filename": "a.png" }]);
        assert_eq!(FieldValue::from(raw.clone()), FieldValue::Other(raw));
    }

    #[test]
    fn test_round_trip_to_json() {
        let original = json!(["a", "b"]);
        let back: Value = FieldValue::from(original.clone()).into();
        assert_eq!(back, original);
    }

    #[test]
    fn test_serializes_untagged() {
        let v = FieldValue::TextList(vec!["a".into()]);
        assert_eq!(serde_json::to_value(&v).unwrap(), json!(["a"]));
    }
}
