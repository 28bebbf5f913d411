use anyhow::{Context, Result};
use icsync_core::ChangeEvent;
use icsync_core::config::AppConfig;
use icsync_core::fallback::GithubReleases;
use icsync_core::pipeline::Pipeline;
use icsync_core::store::AirtableClient;

use crate::commands::resolve_profile;
use crate::render::Render;

pub async fn run(config: &AppConfig, event: ChangeEvent) -> Result<()> {
    let profile = resolve_profile(config, &event)?;

    let store = AirtableClient::for_profile(&config.record_store, &profile)?;
    let host = GithubReleases::from_settings(&config.fallback)?;

    let outcome = Pipeline::new(&store, &host)
        .run(&event.record_id, &profile)
        .await
        .with_context(|| {
            format!(
                "Failed to process record {} in {}/{}",
                event.record_id, profile.base_id, profile.table
            )
        })?;

    println!("{}", outcome.render());

    Ok(())
}
