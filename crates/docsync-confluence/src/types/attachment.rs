//! Confluence attachment types.

use serde::Deserialize;

use super::Version;

/// Confluence attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Attachment ID.
    pub id: String,
    /// Attachment title/filename.
    pub title: String,
    /// Latest version (present with `expand=version`).
    #[serde(default)]
    pub version: Option<Version>,
}

impl Attachment {
    /// Change comment of the latest version.
    #[must_use]
    pub fn version_message(&self) -> Option<&str> {
        self.version.as_ref()?.message.as_deref()
    }
}

/// Attachments API response.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentList {
    /// List of attachments.
    pub results: Vec<Attachment>,
}
