//! ICS file generation.
//!
//! Builds the calendar artifact for a record according to RFC 5545.

mod generate;
mod text;

pub use generate::{EventInput, generate_ics, generate_ics_at};
pub use text::{FOLD_WIDTH, escape_text, fold_line};
