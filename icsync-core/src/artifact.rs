//! The calendar file produced for one record.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

/// MIME type declared when uploading artifacts.
pub const ICS_CONTENT_TYPE: &str = "text/calendar";

/// Encoded .ics file plus the identifiers derived from its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub uid: String,
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(record_id: &str, bytes: Vec<u8>) -> Self {
        Artifact {
            uid: uid_for_record(record_id),
            filename: filename_for_record(record_id),
            content_type: ICS_CONTENT_TYPE,
            bytes,
        }
    }

    /// Content as base64, the encoding the attachment upload endpoint expects.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

/// Stable event UID: depends on the record id only, so edits to the record
/// keep updating the same calendar event.
pub fn uid_for_record(record_id: &str) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes());
    format!("{uuid}@icsync")
}

pub fn filename_for_record(record_id: &str) -> String {
    let safe: String = record_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("event-{safe}.ics")
}
