//! Change notifications delivered for a record.

use serde::{Deserialize, Serialize};

use crate::error::{IcsyncError, IcsyncResult};

/// One change to process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default, alias = "recordId")]
    pub record_id: String,

    /// Profile key; only optional when a single profile is configured.
    #[serde(default, alias = "automation")]
    pub profile: Option<String>,

    /// Overrides the profile's table.
    #[serde(default)]
    pub table: Option<String>,
}

impl ChangeEvent {
    pub fn new(record_id: impl Into<String>) -> Self {
        ChangeEvent {
            record_id: record_id.into(),
            profile: None,
            table: None,
        }
    }

    pub fn from_json(json: &str) -> IcsyncResult<Self> {
        let event: ChangeEvent = serde_json::from_str(json)?;
        event.validate()
    }

    /// Trim the record id and reject an empty one.
    pub fn validate(mut self) -> IcsyncResult<Self> {
        self.record_id = self.record_id.trim().to_string();
        if self.record_id.is_empty() {
            return Err(IcsyncError::Validation("event has no record id".into()));
        }
        Ok(self)
    }
}
