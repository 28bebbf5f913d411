//! Probing an upload response for the attachment it created.
//!
//! The upload endpoint does not commit to one response shape. Each
//! candidate location is a strategy; they are tried in order and the first
//! one yielding a usable reference wins.

use serde_json::Value;

use crate::record::AttachmentReference;

/// One place an upload response may carry the new attachment.
pub trait ReferenceExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// The value found at this location, if present.
    fn locate<'a>(&self, response: &'a Value, field: &str) -> Option<&'a Value>;

    fn extract(
        &self,
        response: &Value,
        field: &str,
        default_filename: &str,
    ) -> Option<AttachmentReference> {
        let found = self.locate(response, field)?;
        let entry = match found {
            Value::Array(items) => items.last()?,
            other => other,
        };
        AttachmentReference::from_entry(entry, default_filename)
    }
}

/// `{"fields": {"<field>": [...]}}`
pub struct NestedFields;

impl ReferenceExtractor for NestedFields {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn locate<'a>(&self, response: &'a Value, field: &str) -> Option<&'a Value> {
        response.get("fields")?.get(field)
    }
}

/// `{"<field>": [...]}`
pub struct ByFieldName;

impl ReferenceExtractor for ByFieldName {
    fn name(&self) -> &'static str {
        "field"
    }

    fn locate<'a>(&self, response: &'a Value, field: &str) -> Option<&'a Value> {
        response.get(field)
    }
}

/// `{"attachments": [...]}`
pub struct AttachmentsList;

impl ReferenceExtractor for AttachmentsList {
    fn name(&self) -> &'static str {
        "attachments"
    }

    fn locate<'a>(&self, response: &'a Value, _field: &str) -> Option<&'a Value> {
        response.get("attachments")
    }
}

/// `{"attachment": {...}}`
pub struct SingleAttachment;

impl ReferenceExtractor for SingleAttachment {
    fn name(&self) -> &'static str {
        "attachment"
    }

    fn locate<'a>(&self, response: &'a Value, _field: &str) -> Option<&'a Value> {
        response.get("attachment")
    }
}

/// The response itself is the attachment.
pub struct BareResponse;

impl ReferenceExtractor for BareResponse {
    fn name(&self) -> &'static str {
        "bare"
    }

    fn locate<'a>(&self, response: &'a Value, _field: &str) -> Option<&'a Value> {
        Some(response)
    }

    fn extract(
        &self,
        response: &Value,
        _field: &str,
        default_filename: &str,
    ) -> Option<AttachmentReference> {
        let entry = match response {
            Value::Array(items) => items.last()?,
            other => other,
        };
        // A bare response carrying a record (`fields`) has an id, but it is
        // the record's id, not an attachment's.
        if entry.get("fields").is_some() {
            return None;
        }
        AttachmentReference::from_entry(entry, default_filename)
    }
}

/// Strategies in the order they are tried.
pub fn default_extractors() -> Vec<Box<dyn ReferenceExtractor>> {
    vec![
        Box::new(NestedFields),
        Box::new(ByFieldName),
        Box::new(AttachmentsList),
        Box::new(SingleAttachment),
        Box::new(BareResponse),
    ]
}

/// Run the strategies in order; returns the matching strategy's name with the reference.
pub fn extract_reference(
    extractors: &[Box<dyn ReferenceExtractor>],
    response: &Value,
    field: &str,
    default_filename: &str,
) -> Option<(&'static str, AttachmentReference)> {
    extractors.iter().find_map(|extractor| {
        extractor
            .extract(response, field, default_filename)
            .map(|reference| (extractor.name(), reference))
    })
}
