//! Global icsync configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::config::AutomationProfile;
use crate::error::{IcsyncError, IcsyncResult};

static DEFAULT_STORE_API_URL: &str = "https://api.airtable.com/v0";
static DEFAULT_STORE_CONTENT_URL: &str = "https://content.airtable.com/v0";
static DEFAULT_STORE_TOKEN_ENV: &str = "AIRTABLE_TOKEN";
static DEFAULT_FALLBACK_API_URL: &str = "https://api.github.com";
static DEFAULT_FALLBACK_TOKEN_ENV: &str = "GITHUB_TOKEN";

fn default_store_api_url() -> String {
    DEFAULT_STORE_API_URL.to_string()
}

fn default_store_content_url() -> String {
    DEFAULT_STORE_CONTENT_URL.to_string()
}

fn default_store_token_env() -> String {
    DEFAULT_STORE_TOKEN_ENV.to_string()
}

fn default_fallback_api_url() -> String {
    DEFAULT_FALLBACK_API_URL.to_string()
}

fn default_fallback_token_env() -> String {
    DEFAULT_FALLBACK_TOKEN_ENV.to_string()
}

/// `[record_store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStoreSettings {
    #[serde(default = "default_store_api_url")]
    pub api_url: String,
    /// Host serving the attachment upload endpoint.
    #[serde(default = "default_store_content_url")]
    pub content_url: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_store_token_env")]
    pub token_env: String,
}

impl Default for RecordStoreSettings {
    fn default() -> Self {
        RecordStoreSettings {
            api_url: default_store_api_url(),
            content_url: default_store_content_url(),
            token_env: default_store_token_env(),
        }
    }
}

/// `[fallback]` section: the repository whose releases hold fallback assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSettings {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_fallback_api_url")]
    pub api_url: String,
    #[serde(default = "default_fallback_token_env")]
    pub token_env: String,
}

/// Configuration at ~/.config/icsync/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub record_store: RecordStoreSettings,

    pub fallback: FallbackSettings,

    #[serde(default)]
    pub profiles: BTreeMap<String, AutomationProfile>,
}

impl AppConfig {
    pub fn default_path() -> IcsyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| IcsyncError::Config("Could not determine config directory".into()))?
            .join("icsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, with `ICSYNC__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> IcsyncResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Err(IcsyncError::Config(format!(
                "Config file not found at {}\n\n\
                Create it with at least:\n\n\
                [fallback]\n\
                owner = \"your-github-user\"\n\
                repo = \"calendar-files\"\n\n\
                [profiles.meetings]\n\
                base_id = \"appXXXXXXXXXXXXXX\"\n\
                table = \"Meetings\"\n\
                attachment_field = \"Invite\"\n\
                marker_field = \"Last Synced\"\n\
                fallback_tag = \"ics-meetings\"",
                path.display()
            )));
        }

        Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("ICSYNC").separator("__"))
            .build()
            .map_err(|e| IcsyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| IcsyncError::Config(e.to_string()))
    }

    /// Pick the profile for an event.
    ///
    /// A key must name a configured profile. Without a key, resolution only
    /// succeeds when exactly one profile exists.
    pub fn profile(&self, key: Option<&str>) -> IcsyncResult<&AutomationProfile> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => self.profiles.get(key).ok_or_else(|| {
                IcsyncError::Config(format!(
                    "Profile '{}' not found. Available: {}",
                    key,
                    self.profile_names().join(", ")
                ))
            }),
            None => {
                let mut profiles = self.profiles.values();
                match (profiles.next(), profiles.next()) {
                    (Some(only), None) => Ok(only),
                    (None, _) => Err(IcsyncError::Config("No profiles configured".into())),
                    (Some(_), Some(_)) => Err(IcsyncError::Config(format!(
                        "Several profiles configured, pick one with --profile: {}",
                        self.profile_names().join(", ")
                    ))),
                }
            }
        }
    }

    fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

/// Read an API token from the environment variable named in config.
pub fn token_from_env(var: &str) -> IcsyncResult<String> {
    std::env::var(var)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| IcsyncError::Config(format!("Environment variable {var} is not set")))
}
