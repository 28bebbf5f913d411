use std::path::Path;

use anyhow::{Context, Result};
use icsync_core::ChangeEvent;
use icsync_core::config::AppConfig;
use icsync_core::pipeline::render_record;
use icsync_core::store::AirtableClient;
use owo_colors::OwoColorize;

use crate::commands::resolve_profile;

pub async fn run(config: &AppConfig, event: ChangeEvent, output: Option<&Path>) -> Result<()> {
    let profile = resolve_profile(config, &event)?;

    let store = AirtableClient::for_profile(&config.record_store, &profile)?;
    let artifact = render_record(&store, &event.record_id, &profile)
        .await
        .with_context(|| format!("Failed to render record {}", event.record_id))?;

    match output {
        Some(path) => {
            std::fs::write(path, &artifact.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {} {}",
                "✓".green(),
                artifact.filename,
                format!("→ {}", path.display()).dimmed()
            );
        }
        None => print!("{}", artifact.as_str()),
    }

    Ok(())
}
