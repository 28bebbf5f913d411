pub mod render;
pub mod run;

use anyhow::Result;
use icsync_core::ChangeEvent;
use icsync_core::config::{AppConfig, AutomationProfile};

/// The profile an event resolves to, with the event's table override applied.
pub fn resolve_profile(config: &AppConfig, event: &ChangeEvent) -> Result<AutomationProfile> {
    let profile = config.profile(event.profile.as_deref())?;
    Ok(profile.with_table_override(event.table.as_deref()))
}
