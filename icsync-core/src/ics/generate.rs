//! ICS file generation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};

use crate::artifact::{Artifact, uid_for_record};
use crate::config::FieldNames;
use crate::error::{IcsyncError, IcsyncResult};
use crate::ics::text::{escape_text, fold_line};
use crate::record::Record;

const PRODID: &str = "-//icsync//EN";
const ICS_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Raw event inputs read from a record, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInput {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventInput {
    pub fn from_record(record: &Record, names: &FieldNames) -> Self {
        EventInput {
            title: record.text(&names.title),
            start: record.text(&names.start),
            end: record.text(&names.end),
            location: record.text(&names.location),
            description: record.text(&names.description),
        }
    }
}

/// Build the .ics artifact for a record, stamped with the current time.
pub fn generate_ics(record_id: &str, input: &EventInput) -> IcsyncResult<Artifact> {
    generate_ics_at(record_id, input, Utc::now())
}

/// Build the .ics artifact with an explicit DTSTAMP.
pub fn generate_ics_at(
    record_id: &str,
    input: &EventInput,
    generated_at: DateTime<Utc>,
) -> IcsyncResult<Artifact> {
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| IcsyncError::Validation(format!("record {record_id} has no title")))?;

    let start = parse_timestamp("start", input.start.as_deref())?;
    let end = parse_timestamp("end", input.end.as_deref())?;

    if end <= start {
        return Err(IcsyncError::Validation(format!(
            "record {record_id} ends ({}) before or when it starts ({})",
            end.format(ICS_TIMESTAMP_FORMAT),
            start.format(ICS_TIMESTAMP_FORMAT)
        )));
    }

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", uid_for_record(record_id)),
        format!("DTSTAMP:{}", generated_at.format(ICS_TIMESTAMP_FORMAT)),
        format!("DTSTART:{}", start.format(ICS_TIMESTAMP_FORMAT)),
        format!("DTEND:{}", end.format(ICS_TIMESTAMP_FORMAT)),
        format!("SUMMARY:{}", escape_text(title)),
    ];

    if let Some(location) = non_blank(input.location.as_deref()) {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }

    if let Some(description) = non_blank(input.description.as_deref()) {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }

    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut output = String::new();
    for line in &lines {
        output.push_str(&fold_line(line));
        output.push_str("\r\n");
    }

    Ok(Artifact::new(record_id, output.into_bytes()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a record timestamp into UTC, truncated to whole seconds.
///
/// Accepts RFC 3339 with any offset, a naive date-time (taken as UTC),
/// or a bare date (midnight UTC).
fn parse_timestamp(name: &str, value: Option<&str>) -> IcsyncResult<DateTime<Utc>> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IcsyncError::Validation(format!("missing {name} time")))?;

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").map(|dt| dt.and_utc()))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| IcsyncError::Validation(format!("unparseable {name} time: {raw}")))?;

    Ok(parsed.trunc_subsecs(0))
}
