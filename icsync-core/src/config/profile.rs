//! Automation profiles: which record fields feed the artifact and where results go.

use serde::{Deserialize, Serialize};

fn default_title() -> String {
    "Title".to_string()
}

fn default_start() -> String {
    "Start".to_string()
}

fn default_end() -> String {
    "End".to_string()
}

fn default_location() -> String {
    "Location".to_string()
}

fn default_description() -> String {
    "Description".to_string()
}

/// Record field names read when building the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_description")]
    pub description: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            title: default_title(),
            start: default_start(),
            end: default_end(),
            location: default_location(),
            description: default_description(),
        }
    }
}

/// One `[profiles.<key>]` entry of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationProfile {
    pub base_id: String,
    pub table: String,
    pub attachment_field: String,
    pub marker_field: String,
    /// Release tag used as the container on the fallback host.
    pub fallback_tag: String,
    #[serde(default)]
    pub fields: FieldNames,
}

impl AutomationProfile {
    /// Copy of this profile with the table replaced, when an event names one.
    pub fn with_table_override(&self, table: Option<&str>) -> Self {
        let mut profile = self.clone();
        if let Some(table) = table.map(str::trim).filter(|t| !t.is_empty()) {
            profile.table = table.to_string();
        }
        profile
    }
}
