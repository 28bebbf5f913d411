//! Terminal rendering for run results.

use icsync_core::{AttachmentReference, RunOutcome, UploadPath};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for UploadPath {
    fn render(&self) -> String {
        match self {
            UploadPath::Primary => self.to_string().green().to_string(),
            UploadPath::Fallback { .. } => self.to_string().yellow().to_string(),
        }
    }
}

impl Render for AttachmentReference {
    fn render(&self) -> String {
        match self {
            AttachmentReference::Native { id } => format!("attachment {id}"),
            AttachmentReference::Hosted { url, .. } => url.clone(),
        }
    }
}

impl Render for RunOutcome {
    fn render(&self) -> String {
        let lines = [
            format!("{} {} via {}", "✓".green(), self.record_id, self.path.render()),
            format!("   {} {}", self.filename, self.attachment.render().dimmed()),
            format!("   {}", format!("marked processed: {}", self.marker).dimmed()),
        ];
        lines.join("\n")
    }
}
