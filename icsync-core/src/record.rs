//! Records owned by the record store, and the attachment references stored on them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name -> value mapping, as returned by the record store.
pub type Fields = Map<String, Value>;

/// A record fetched from the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Record {
            id: id.into(),
            fields,
        }
    }

    /// Text value of a field.
    ///
    /// Strings and numbers are used as-is. Lookup fields come back as lists,
    /// so a list whose first element is a string is also accepted.
    pub fn text(&self, field: &str) -> Option<String> {
        let value = match self.fields.get(field)? {
            Value::Array(items) => items.first()?,
            other => other,
        };

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Current entries of an attachment field (empty if the field is unset).
    pub fn attachments(&self, field: &str) -> &[Value] {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}

/// Canonical pointer to the current attachment of a record.
///
/// Serializes to the shape the record store accepts in a field patch:
/// `{"id": ...}` keeps an attachment the store already holds, while
/// `{"url": ..., "filename": ...}` makes the store fetch the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachmentReference {
    Native { id: String },
    Hosted { url: String, filename: String },
}

impl AttachmentReference {
    /// Pull a usable reference out of one attachment entry.
    ///
    /// A store-native id wins; otherwise a URL is required, paired with the
    /// entry's filename or `default_filename` when the entry has none.
    pub fn from_entry(entry: &Value, default_filename: &str) -> Option<Self> {
        let obj = entry.as_object()?;

        if let Some(id) = non_empty_str(obj.get("id")) {
            return Some(AttachmentReference::Native { id: id.to_string() });
        }

        let url = non_empty_str(obj.get("url"))?;
        let filename = non_empty_str(obj.get("filename")).unwrap_or(default_filename);

        Some(AttachmentReference::Hosted {
            url: url.to_string(),
            filename: filename.to_string(),
        })
    }

    /// The single-element list written to the attachment field.
    pub fn as_field_value(&self) -> Value {
        Value::Array(vec![serde_json::to_value(self).unwrap_or(Value::Null)])
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
