//! Record store access.
//!
//! The store owns records; icsync only reads them and patches the
//! attachment and processed-marker fields. No retries happen at this
//! layer: the reconciler decides what a failure means.

mod airtable;

use async_trait::async_trait;
use serde_json::Value;

use crate::artifact::Artifact;
use crate::error::IcsyncResult;
use crate::record::Fields;

pub use airtable::AirtableClient;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current fields of a record.
    async fn fetch(&self, record_id: &str) -> IcsyncResult<Fields>;

    /// Overwrite the given fields, returning the record's updated fields.
    async fn patch(&self, record_id: &str, fields: Fields) -> IcsyncResult<Fields>;

    /// Upload an artifact into an attachment field.
    ///
    /// The raw response is returned untouched: its shape is not stable
    /// enough to decode here.
    async fn upload_attachment(
        &self,
        record_id: &str,
        field: &str,
        artifact: &Artifact,
    ) -> IcsyncResult<Value>;
}

/// Decode a successful upload body.
///
/// An empty body becomes `Null` and a body that is not JSON is kept as a
/// string, so neither carries a reference and the caller re-reads the record.
pub(crate) fn upload_response(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Upload response is not JSON");
        Value::String(body.to_string())
    })
}
