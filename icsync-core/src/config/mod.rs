//! Configuration types for icsync.

mod app_config;
mod profile;

pub use app_config::{AppConfig, FallbackSettings, RecordStoreSettings, token_from_env};
pub use profile::{AutomationProfile, FieldNames};
