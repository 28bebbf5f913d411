//! GitHub Releases as the fallback asset host.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::{FallbackSettings, token_from_env};
use crate::error::{IcsyncError, IcsyncResult};
use crate::fallback::{Asset, AssetHost, Container};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = concat!("icsync/", env!("CARGO_PKG_VERSION"));

pub struct GithubReleases {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubReleases {
    pub fn new(settings: &FallbackSettings, token: String) -> Self {
        GithubReleases {
            http: reqwest::Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            token,
        }
    }

    pub fn from_settings(settings: &FallbackSettings) -> IcsyncResult<Self> {
        let token = token_from_env(&settings.token_env)?;
        Ok(Self::new(settings, token))
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        request.headers(headers).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> IcsyncResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(IcsyncError::Fallback {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| IcsyncError::Fallback {
            status: Some(status.as_u16()),
            message: format!("unexpected response: {e}"),
        })
    }
}

/// Transport failures on the fallback path are fatal fallback errors.
fn transport_error(e: reqwest::Error) -> IcsyncError {
    IcsyncError::Fallback {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

/// Strip the `{?name,label}` template from a release's upload URL and add the asset name.
fn asset_upload_url(upload_url: &str, filename: &str) -> IcsyncResult<Url> {
    let base = upload_url.split('{').next().unwrap_or(upload_url);
    let mut url = Url::parse(base).map_err(|e| IcsyncError::Fallback {
        status: None,
        message: format!("invalid upload URL {upload_url}: {e}"),
    })?;
    url.query_pairs_mut().append_pair("name", filename);
    Ok(url)
}

#[async_trait]
impl AssetHost for GithubReleases {
    async fn find_container(&self, tag: &str) -> IcsyncResult<Container> {
        let url = self.repo_url(&format!("releases/tags/{tag}"));
        self.send(self.http.get(url)).await
    }

    async fn create_container(&self, tag: &str) -> IcsyncResult<Container> {
        let body = json!({
            "tag_name": tag,
            "name": tag,
            "body": "Calendar files published by icsync.",
        });
        self.send(self.http.post(self.repo_url("releases")).json(&body))
            .await
    }

    async fn delete_asset(&self, asset_id: u64) -> IcsyncResult<()> {
        let url = self.repo_url(&format!("releases/assets/{asset_id}"));
        let response = self
            .authorized(self.http.delete(url))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        Err(IcsyncError::Fallback {
            status: Some(status.as_u16()),
            message: response.text().await.unwrap_or_default(),
        })
    }

    async fn upload_asset(
        &self,
        container: &Container,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> IcsyncResult<Asset> {
        let url = asset_upload_url(&container.upload_url, filename)?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes);

        self.send(request).await
    }
}
