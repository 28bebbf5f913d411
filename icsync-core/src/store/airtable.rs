//! Airtable REST client.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::debug;

use crate::artifact::Artifact;
use crate::config::{AutomationProfile, RecordStoreSettings, token_from_env};
use crate::error::{IcsyncError, IcsyncResult};
use crate::record::Fields;
use crate::store::{RecordStore, upload_response};

pub struct AirtableClient {
    http: reqwest::Client,
    api_url: String,
    content_url: String,
    token: String,
    base_id: String,
    table: String,
}

impl AirtableClient {
    pub fn new(settings: &RecordStoreSettings, token: String, base_id: &str, table: &str) -> Self {
        AirtableClient {
            http: reqwest::Client::new(),
            api_url: settings.api_url.clone(),
            content_url: settings.content_url.clone(),
            token,
            base_id: base_id.to_string(),
            table: table.to_string(),
        }
    }

    /// Client for a profile's base and table, with the token read from the environment.
    pub fn for_profile(
        settings: &RecordStoreSettings,
        profile: &AutomationProfile,
    ) -> IcsyncResult<Self> {
        let token = token_from_env(&settings.token_env)?;
        Ok(Self::new(settings, token, &profile.base_id, &profile.table))
    }

    fn record_url(&self, record_id: &str) -> IcsyncResult<Url> {
        build_url(&self.api_url, &[&self.base_id, &self.table, record_id])
    }

    fn upload_url(&self, record_id: &str, field: &str) -> IcsyncResult<Url> {
        build_url(
            &self.content_url,
            &[&self.base_id, record_id, field, "uploadAttachment"],
        )
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn fetch(&self, record_id: &str) -> IcsyncResult<Fields> {
        let response = self
            .http
            .get(self.record_url(record_id)?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(record_fields(read_json(response).await?))
    }

    async fn patch(&self, record_id: &str, fields: Fields) -> IcsyncResult<Fields> {
        debug!(record_id, fields = ?fields.keys().collect::<Vec<_>>(), "Patching record");

        let response = self
            .http
            .patch(self.record_url(record_id)?)
            .bearer_auth(&self.token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        Ok(record_fields(read_json(response).await?))
    }

    async fn upload_attachment(
        &self,
        record_id: &str,
        field: &str,
        artifact: &Artifact,
    ) -> IcsyncResult<Value> {
        debug!(record_id, field, filename = %artifact.filename, "Uploading attachment");

        let response = self
            .http
            .post(self.upload_url(record_id, field)?)
            .bearer_auth(&self.token)
            .json(&json!({
                "contentType": artifact.content_type,
                "file": artifact.base64(),
                "filename": artifact.filename,
            }))
            .send()
            .await?;

        Ok(upload_response(&read_body(response).await?))
    }
}

/// Join percent-encoded path segments onto a base URL.
fn build_url(base: &str, segments: &[&str]) -> IcsyncResult<Url> {
    let mut url =
        Url::parse(base).map_err(|e| IcsyncError::Config(format!("Invalid URL {base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| IcsyncError::Config(format!("URL cannot take a path: {base}")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// The body of a success response; any other status becomes a store error.
async fn read_body(response: reqwest::Response) -> IcsyncResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(IcsyncError::Store {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

async fn read_json(response: reqwest::Response) -> IcsyncResult<Value> {
    let body = read_body(response).await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

fn record_fields(record: Value) -> Fields {
    match record {
        Value::Object(mut obj) => match obj.remove("fields") {
            Some(Value::Object(fields)) => fields,
            _ => Fields::new(),
        },
        _ => Fields::new(),
    }
}
