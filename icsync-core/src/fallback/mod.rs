//! Fallback path: host the artifact elsewhere and hand back a durable URL.
//!
//! Containers are named groups of assets (GitHub releases, keyed by tag).
//! Uploading replaces any asset already stored under the same filename, so
//! a container never holds two copies of one record's file.

mod github;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::error::{IcsyncError, IcsyncResult};

pub use github::GithubReleases;

/// A named asset container on the fallback host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Container {
    pub id: u64,
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Upload endpoint, possibly an RFC 6570 template (`...{?name,label}`).
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default, rename = "browser_download_url")]
    pub download_url: Option<String>,
}

#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Look up a container; a missing one is a `Fallback` error with status 404.
    async fn find_container(&self, tag: &str) -> IcsyncResult<Container>;

    async fn create_container(&self, tag: &str) -> IcsyncResult<Container>;

    async fn delete_asset(&self, asset_id: u64) -> IcsyncResult<()>;

    async fn upload_asset(
        &self,
        container: &Container,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> IcsyncResult<Asset>;
}

/// Store `artifact` in the container tagged `tag` and return its download URL.
pub async fn upload_via_fallback<H: AssetHost + ?Sized>(
    host: &H,
    tag: &str,
    artifact: &Artifact,
) -> IcsyncResult<String> {
    let container = match host.find_container(tag).await {
        Ok(container) => container,
        Err(e) if e.is_not_found() => {
            info!(tag, "Creating fallback container");
            host.create_container(tag).await?
        }
        Err(e) => return Err(e),
    };

    for stale in container.assets.iter().filter(|a| a.name == artifact.filename) {
        debug!(tag, asset_id = stale.id, name = %stale.name, "Replacing existing asset");
        match host.delete_asset(stale.id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    let asset = host
        .upload_asset(
            &container,
            &artifact.filename,
            artifact.content_type,
            artifact.bytes.clone(),
        )
        .await?;

    asset
        .download_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| IcsyncError::Fallback {
            status: None,
            message: format!("uploaded {} but no download URL was returned", asset.name),
        })
}
