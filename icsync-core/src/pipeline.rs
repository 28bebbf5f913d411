//! One run for one changed record: build, upload, reconcile, mark.
//!
//! Runs are sequential and hold no state between calls. Callers must not
//! run two invocations for the same record at once; repeated runs for a
//! record converge on a single attachment.

use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use crate::artifact::Artifact;
use crate::config::AutomationProfile;
use crate::error::IcsyncResult;
use crate::fallback::{AssetHost, upload_via_fallback};
use crate::ics::{EventInput, generate_ics};
use crate::marker::mark_processed;
use crate::reconcile::{Reconciler, write_single_attachment};
use crate::record::{AttachmentReference, Record};
use crate::store::RecordStore;

/// Which path ended up storing the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPath {
    Primary,
    Fallback { url: String },
}

impl fmt::Display for UploadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadPath::Primary => write!(f, "primary"),
            UploadPath::Fallback { .. } => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub record_id: String,
    pub path: UploadPath,
    pub attachment: AttachmentReference,
    pub filename: String,
    pub marker: String,
}

/// Fetch the record and build its artifact without uploading anything.
pub async fn render_record<S: RecordStore + ?Sized>(
    store: &S,
    record_id: &str,
    profile: &AutomationProfile,
) -> IcsyncResult<Artifact> {
    let record = Record::new(record_id, store.fetch(record_id).await?);
    generate_ics(record_id, &EventInput::from_record(&record, &profile.fields))
}

pub struct Pipeline<'a, S: ?Sized, H: ?Sized> {
    store: &'a S,
    host: &'a H,
    reconciler: Reconciler,
}

impl<'a, S, H> Pipeline<'a, S, H>
where
    S: RecordStore + ?Sized,
    H: AssetHost + ?Sized,
{
    pub fn new(store: &'a S, host: &'a H) -> Self {
        Pipeline {
            store,
            host,
            reconciler: Reconciler::default(),
        }
    }

    pub async fn run(
        &self,
        record_id: &str,
        profile: &AutomationProfile,
    ) -> IcsyncResult<RunOutcome> {
        let artifact = render_record(self.store, record_id, profile).await?;
        let field = profile.attachment_field.as_str();

        let (path, attachment) = match self
            .reconciler
            .reconcile(self.store, record_id, &artifact, field)
            .await
        {
            Ok(reference) => (UploadPath::Primary, reference),
            Err(e) if e.triggers_fallback() => {
                warn!(record_id, error = %e, "Primary upload failed, using fallback host");
                self.upload_fallback(record_id, profile, &artifact).await?
            }
            Err(e) => return Err(e),
        };

        let marker = mark_processed(self.store, record_id, &profile.marker_field, Utc::now()).await?;

        match &path {
            UploadPath::Primary => info!(record_id, path = %path, "Attachment stored"),
            UploadPath::Fallback { url } => {
                info!(record_id, path = %path, url = %url, "Attachment stored")
            }
        }

        Ok(RunOutcome {
            record_id: record_id.to_string(),
            path,
            attachment,
            filename: artifact.filename,
            marker,
        })
    }

    async fn upload_fallback(
        &self,
        record_id: &str,
        profile: &AutomationProfile,
        artifact: &Artifact,
    ) -> IcsyncResult<(UploadPath, AttachmentReference)> {
        let url = upload_via_fallback(self.host, &profile.fallback_tag, artifact).await?;

        let reference = AttachmentReference::Hosted {
            url: url.clone(),
            filename: artifact.filename.clone(),
        };
        write_single_attachment(self.store, record_id, &profile.attachment_field, &reference)
            .await?;

        Ok((UploadPath::Fallback { url }, reference))
    }
}
