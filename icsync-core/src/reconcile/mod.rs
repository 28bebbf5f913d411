//! Primary upload path: upload to the record store, confirm the new
//! attachment, and collapse the field to exactly that attachment.

mod extract;

use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::error::{IcsyncError, IcsyncResult};
use crate::record::{AttachmentReference, Fields, Record};
use crate::store::RecordStore;

pub use extract::{
    AttachmentsList, BareResponse, ByFieldName, NestedFields, ReferenceExtractor, SingleAttachment,
    default_extractors, extract_reference,
};

pub struct Reconciler {
    extractors: Vec<Box<dyn ReferenceExtractor>>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler {
            extractors: default_extractors(),
        }
    }
}

impl Reconciler {
    pub fn with_extractors(extractors: Vec<Box<dyn ReferenceExtractor>>) -> Self {
        Reconciler { extractors }
    }

    /// Upload `artifact` into `field` and leave the field holding only the new attachment.
    ///
    /// Every error returned here means the primary path failed; callers
    /// decide whether to switch to the fallback host.
    pub async fn reconcile<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        record_id: &str,
        artifact: &Artifact,
        field: &str,
    ) -> IcsyncResult<AttachmentReference> {
        let response = store.upload_attachment(record_id, field, artifact).await?;

        let reference = match extract_reference(
            &self.extractors,
            &response,
            field,
            &artifact.filename,
        ) {
            Some((strategy, reference)) => {
                debug!(record_id, strategy, "Found new attachment in upload response");
                reference
            }
            None => {
                debug!(record_id, "Upload response unrecognised, re-reading record");
                self.latest_attachment(store, record_id, artifact, field)
                    .await?
            }
        };

        write_single_attachment(store, record_id, field, &reference).await?;
        info!(record_id, field, "Attachment field reconciled");

        Ok(reference)
    }

    /// The last attachment currently on the record, trusting the store over the response.
    async fn latest_attachment<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        record_id: &str,
        artifact: &Artifact,
        field: &str,
    ) -> IcsyncResult<AttachmentReference> {
        let record = Record::new(record_id, store.fetch(record_id).await?);

        record
            .attachments(field)
            .last()
            .and_then(|entry| AttachmentReference::from_entry(entry, &artifact.filename))
            .ok_or_else(|| IcsyncError::Reconciliation {
                record_id: record_id.to_string(),
                field: field.to_string(),
            })
    }
}

/// Overwrite `field` with a one-element list holding `reference`.
///
/// Stale entries, however many, are dropped by this write.
pub async fn write_single_attachment<S: RecordStore + ?Sized>(
    store: &S,
    record_id: &str,
    field: &str,
    reference: &AttachmentReference,
) -> IcsyncResult<Fields> {
    let mut fields = Fields::new();
    fields.insert(field.to_string(), reference.as_field_value());
    store.patch(record_id, fields).await
}
