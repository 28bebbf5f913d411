//! Core of icsync.
//!
//! Turns a changed record into an .ics attachment on that record:
//! - `ics` builds the calendar artifact from record fields
//! - `reconcile` uploads it to the record store and collapses the field to one attachment
//! - `fallback` hosts it elsewhere when the primary upload fails
//! - `marker` records that the change was handled
//! - `pipeline` chains the steps for one event

pub mod artifact;
pub mod config;
pub mod error;
pub mod event;
pub mod fallback;
pub mod ics;
pub mod marker;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod store;

#[cfg(test)]
mod testing;

pub use artifact::Artifact;
pub use error::{IcsyncError, IcsyncResult};
pub use event::ChangeEvent;
pub use pipeline::{Pipeline, RunOutcome, UploadPath, render_record};
pub use record::{AttachmentReference, Record};
