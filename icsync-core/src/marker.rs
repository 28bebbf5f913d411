//! Processed marker: tells the producer this change has been handled.
//!
//! The marker column may be a date-time, a date, or plain text, and which
//! one is not known up front. Candidate encodings are tried from most to
//! least precise until the store accepts one.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{IcsyncError, IcsyncResult};
use crate::record::Fields;
use crate::store::RecordStore;

/// One way of writing the processed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEncoding {
    Timestamp,
    DateOnly,
}

impl MarkerEncoding {
    /// Order in which encodings are tried.
    pub const CANDIDATES: [MarkerEncoding; 2] = [MarkerEncoding::Timestamp, MarkerEncoding::DateOnly];

    pub fn encode(self, at: DateTime<Utc>) -> String {
        match self {
            MarkerEncoding::Timestamp => at.to_rfc3339_opts(SecondsFormat::Secs, true),
            MarkerEncoding::DateOnly => at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Write the processed marker to `field`, returning the value the store accepted.
pub async fn mark_processed<S: RecordStore + ?Sized>(
    store: &S,
    record_id: &str,
    field: &str,
    at: DateTime<Utc>,
) -> IcsyncResult<String> {
    let mut attempted = Vec::new();

    for encoding in MarkerEncoding::CANDIDATES {
        let value = encoding.encode(at);
        let mut fields = Fields::new();
        fields.insert(field.to_string(), Value::String(value.clone()));

        match store.patch(record_id, fields).await {
            Ok(_) => {
                info!(record_id, field, marker = %value, "Marked record as processed");
                return Ok(value);
            }
            Err(e) if e.is_value_rejected() => {
                debug!(record_id, field, ?encoding, "Marker value rejected, trying next encoding");
                attempted.push(value);
            }
            Err(e) => return Err(e),
        }
    }

    Err(IcsyncError::MarkerType {
        field: field.to_string(),
        attempted,
    })
}
