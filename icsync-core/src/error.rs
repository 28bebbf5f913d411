//! Error types for icsync.

use thiserror::Error;

/// Error type reported by the record store when a value does not fit the column type.
const INVALID_VALUE_FOR_COLUMN: &str = "INVALID_VALUE_FOR_COLUMN";

/// Errors that can occur while turning a record into an attached calendar file.
#[derive(Error, Debug)]
pub enum IcsyncError {
    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Record store returned {status}: {body}")]
    Store { status: u16, body: String },

    #[error(
        "Upload to '{field}' on record {record_id} succeeded but the new attachment could not be confirmed"
    )]
    Reconciliation { record_id: String, field: String },

    #[error("Fallback host error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Fallback { status: Option<u16>, message: String },

    #[error("Field '{field}' rejected every processed-marker value (tried {})", .attempted.join(", "))]
    MarkerType { field: String, attempted: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IcsyncError {
    /// Whether a failure on the primary upload path should switch to the fallback host.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            IcsyncError::Store { .. } | IcsyncError::Reconciliation { .. } | IcsyncError::Http(_)
        )
    }

    /// Whether the record store refused a value because of the column's type.
    pub fn is_value_rejected(&self) -> bool {
        match self {
            IcsyncError::Store { status, body } => {
                *status == 422 && body.contains(INVALID_VALUE_FOR_COLUMN)
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            IcsyncError::Store { status, .. } => *status == 404,
            IcsyncError::Fallback { status, .. } => *status == Some(404),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for IcsyncError {
    fn from(e: serde_json::Error) -> Self {
        IcsyncError::Serialization(e.to_string())
    }
}

/// Result type alias for icsync operations.
pub type IcsyncResult<T> = Result<T, IcsyncError>;
