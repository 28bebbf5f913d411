//! In-memory record store and asset host for tests.
//!
//! `FakeStore` mimics the record store's attachment semantics: uploads
//! append to the field, and patching an attachment field rebuilds it from
//! the given references (existing ids are kept, URLs become new entries).
//! `FakeHost` mimics release containers keyed by tag.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::artifact::Artifact;
use crate::error::{IcsyncError, IcsyncResult};
use crate::fallback::{Asset, AssetHost, Container};
use crate::record::Fields;
use crate::store::{RecordStore, upload_response};

/// How the fake upload endpoint answers.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadBehavior {
    NestedFields,
    ByFieldName,
    AttachmentsList,
    SingleAttachment,
    Bare,
    /// Stores the file but answers with nothing usable.
    Unrecognised,
    /// Answers with nothing usable and the file never shows up.
    UnrecognisedAndDropped,
    /// Stores the file and answers 2xx with a body that is not JSON.
    PlainText(&'static str),
    Fail(u16),
}

/// Type of a column, deciding which marker strings it accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    DateTime,
    DateOnly,
    Text,
    Checkbox,
}

impl ColumnType {
    fn accepts(self, value: &Value) -> bool {
        let Some(s) = value.as_str() else {
            return matches!(self, ColumnType::Checkbox) && value.is_boolean();
        };
        let is_date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
        match self {
            ColumnType::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok() || is_date,
            ColumnType::DateOnly => is_date,
            ColumnType::Text => true,
            ColumnType::Checkbox => false,
        }
    }
}

struct StoreState {
    records: HashMap<String, Fields>,
    columns: HashMap<String, ColumnType>,
    failing_fields: HashMap<String, u16>,
    upload_behavior: UploadBehavior,
    next_attachment: u32,
    fetches: usize,
    patches: usize,
    uploads: usize,
}

impl StoreState {
    fn new_entry(&mut self, url: Option<&str>, filename: &str) -> Value {
        self.next_attachment += 1;
        let id = format!("att{}", self.next_attachment);
        let url = url
            .map(String::from)
            .unwrap_or_else(|| format!("https://store.test/{id}/{filename}"));
        json!({ "id": id, "url": url, "filename": filename, "type": "text/calendar" })
    }

    fn record_mut(&mut self, record_id: &str) -> IcsyncResult<&mut Fields> {
        self.records.get_mut(record_id).ok_or_else(|| IcsyncError::Store {
            status: 404,
            body: r#"{"error":"NOT_FOUND"}"#.into(),
        })
    }
}

pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn with_record(record_id: &str, fields: Value) -> Self {
        let mut records = HashMap::new();
        records.insert(
            record_id.to_string(),
            fields.as_object().cloned().unwrap_or_default(),
        );

        FakeStore {
            state: Mutex::new(StoreState {
                records,
                columns: HashMap::new(),
                failing_fields: HashMap::new(),
                upload_behavior: UploadBehavior::NestedFields,
                next_attachment: 0,
                fetches: 0,
                patches: 0,
                uploads: 0,
            }),
        }
    }

    pub fn seed_attachments(&self, record_id: &str, field: &str, filenames: &[&str]) {
        let mut state = self.state.lock().unwrap();
        let entries: Vec<Value> = filenames.iter().map(|f| state.new_entry(None, f)).collect();
        let record = state.record_mut(record_id).unwrap();
        record.insert(field.to_string(), Value::Array(entries));
    }

    pub fn set_upload_behavior(&self, behavior: UploadBehavior) {
        self.state.lock().unwrap().upload_behavior = behavior;
    }

    pub fn set_column_type(&self, field: &str, column: ColumnType) {
        self.state
            .lock()
            .unwrap()
            .columns
            .insert(field.to_string(), column);
    }

    /// Make every patch touching `field` fail with `status`.
    pub fn fail_patch(&self, field: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failing_fields
            .insert(field.to_string(), status);
    }

    pub fn attachments(&self, record_id: &str, field: &str) -> Vec<Value> {
        match self.field(record_id, field) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn field(&self, record_id: &str, field: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.records.get(record_id)?.get(field).cloned()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn patch_count(&self) -> usize {
        self.state.lock().unwrap().patches
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads
    }
}

fn is_attachment_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => {
            !items.is_empty()
                && items
                    .iter()
                    .all(|i| i.get("id").is_some() || i.get("url").is_some())
        }
        _ => false,
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn fetch(&self, record_id: &str) -> IcsyncResult<Fields> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        Ok(state.record_mut(record_id)?.clone())
    }

    async fn patch(&self, record_id: &str, fields: Fields) -> IcsyncResult<Fields> {
        let mut state = self.state.lock().unwrap();
        state.patches += 1;

        for (name, value) in &fields {
            if let Some(status) = state.failing_fields.get(name) {
                return Err(IcsyncError::Store {
                    status: *status,
                    body: "patch refused".into(),
                });
            }
            if let Some(column) = state.columns.get(name) {
                if !column.accepts(value) {
                    return Err(IcsyncError::Store {
                        status: 422,
                        body: format!(
                            r#"{{"error":{{"type":"INVALID_VALUE_FOR_COLUMN","message":"Field \"{name}\" cannot accept the provided value"}}}}"#
                        ),
                    });
                }
            }
        }

        let mut updates = Vec::new();
        for (name, value) in fields {
            if !is_attachment_list(&value) {
                updates.push((name, value));
                continue;
            }

            let current = state.record_mut(record_id)?.get(&name).cloned();
            let existing = match current {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };

            let mut rebuilt = Vec::new();
            for reference in value.as_array().into_iter().flatten() {
                if let Some(id) = reference.get("id").and_then(Value::as_str) {
                    let kept = existing
                        .iter()
                        .find(|e| e.get("id").and_then(Value::as_str) == Some(id))
                        .cloned()
                        .ok_or_else(|| IcsyncError::Store {
                            status: 422,
                            body: format!("unknown attachment {id}"),
                        })?;
                    rebuilt.push(kept);
                } else {
                    let url = reference.get("url").and_then(Value::as_str);
                    let filename = reference
                        .get("filename")
                        .and_then(Value::as_str)
                        .unwrap_or("file");
                    rebuilt.push(state.new_entry(url, filename));
                }
            }
            updates.push((name, Value::Array(rebuilt)));
        }

        let record = state.record_mut(record_id)?;
        for (name, value) in updates {
            record.insert(name, value);
        }
        Ok(record.clone())
    }

    async fn upload_attachment(
        &self,
        record_id: &str,
        field: &str,
        artifact: &Artifact,
    ) -> IcsyncResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.uploads += 1;

        let behavior = state.upload_behavior.clone();
        if let UploadBehavior::Fail(status) = behavior {
            return Err(IcsyncError::Store {
                status,
                body: "upload failed".into(),
            });
        }

        let entry = state.new_entry(None, &artifact.filename);
        if behavior != UploadBehavior::UnrecognisedAndDropped {
            let record = state.record_mut(record_id)?;
            match record
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(entry.clone()),
                other => *other = Value::Array(vec![entry.clone()]),
            }
        }

        let list = state.record_mut(record_id)?.get(field).cloned();
        Ok(match behavior {
            UploadBehavior::NestedFields => json!({
                "id": record_id,
                "createdTime": "2024-01-01T00:00:00.000Z",
                "fields": { field: list },
            }),
            UploadBehavior::ByFieldName => json!({ field: list }),
            UploadBehavior::AttachmentsList => json!({ "attachments": list }),
            UploadBehavior::SingleAttachment => json!({ "attachment": entry }),
            UploadBehavior::Bare => entry,
            UploadBehavior::PlainText(body) => upload_response(body),
            _ => json!({ "ok": true }),
        })
    }
}

#[derive(Default)]
struct HostState {
    containers: HashMap<String, Container>,
    next_id: u64,
    find_status: Option<u16>,
    delete_status: Option<u16>,
    omit_download_url: bool,
    calls: usize,
    created: usize,
    deleted: usize,
    uploads: usize,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn container(&mut self, tag: &str) -> Container {
        let id = self.next_id();
        Container {
            id,
            tag: tag.to_string(),
            upload_url: format!("https://uploads.test/releases/{id}/assets{{?name,label}}"),
            assets: Vec::new(),
        }
    }

    fn asset(&mut self, tag: &str, name: &str) -> Asset {
        Asset {
            id: self.next_id(),
            name: name.to_string(),
            download_url: Some(format!("https://host.test/download/{tag}/{name}")),
        }
    }
}

fn host_error(status: u16) -> IcsyncError {
    IcsyncError::Fallback {
        status: Some(status),
        message: format!("fake host returned {status}"),
    }
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn seed_container(&self, tag: &str, asset_names: &[&str]) {
        let mut state = self.state.lock().unwrap();
        let mut container = state.container(tag);
        for name in asset_names {
            let asset = state.asset(tag, name);
            container.assets.push(asset);
        }
        state.containers.insert(tag.to_string(), container);
    }

    /// Status returned by container lookups instead of the normal answer.
    pub fn set_find_status(&self, status: Option<u16>) {
        self.state.lock().unwrap().find_status = status;
    }

    pub fn set_delete_status(&self, status: Option<u16>) {
        self.state.lock().unwrap().delete_status = status;
    }

    pub fn set_omit_download_url(&self, omit: bool) {
        self.state.lock().unwrap().omit_download_url = omit;
    }

    pub fn asset_names(&self, tag: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .containers
            .get(tag)
            .map(|c| c.assets.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn deleted_count(&self) -> usize {
        self.state.lock().unwrap().deleted
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads
    }
}

#[async_trait]
impl AssetHost for FakeHost {
    async fn find_container(&self, tag: &str) -> IcsyncResult<Container> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(status) = state.find_status {
            return Err(host_error(status));
        }
        state.containers.get(tag).cloned().ok_or_else(|| host_error(404))
    }

    async fn create_container(&self, tag: &str) -> IcsyncResult<Container> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.created += 1;
        let container = state.container(tag);
        state.containers.insert(tag.to_string(), container.clone());
        Ok(container)
    }

    async fn delete_asset(&self, asset_id: u64) -> IcsyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if let Some(status) = state.delete_status {
            return Err(host_error(status));
        }
        for container in state.containers.values_mut() {
            container.assets.retain(|a| a.id != asset_id);
        }
        state.deleted += 1;
        Ok(())
    }

    async fn upload_asset(
        &self,
        container: &Container,
        filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> IcsyncResult<Asset> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.uploads += 1;

        let mut asset = state.asset(&container.tag, filename);
        let stored = state
            .containers
            .get_mut(&container.tag)
            .ok_or_else(|| host_error(404))?;
        if stored.assets.iter().any(|a| a.name == filename) {
            return Err(host_error(422));
        }
        stored.assets.push(asset.clone());

        if state.omit_download_url {
            asset.download_url = None;
        }
        Ok(asset)
    }
}
