//! Upload of files referenced by synchronized pages.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::SyncError;
use super::directory::PageDirectory;
use super::fingerprint::Fingerprint;
use crate::api::{AttachmentUpload, ConfluenceApi};

/// Result of synchronizing one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Created,
    Updated,
    /// Remote version already carries this content.
    Unchanged,
    /// Owning page does not exist on the remote.
    PageMissing,
}

/// Local file loaded for upload.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub page_title: String,
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub fingerprint: Fingerprint,
}

impl AttachmentFile {
    /// Read a file and fingerprint its content.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the file cannot be read.
    pub fn load(page_title: &str, path: &Path) -> Result<Self, SyncError> {
        let data = fs::read(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            page_title: page_title.to_owned(),
            path: path.to_path_buf(),
            fingerprint: Fingerprint::of_bytes(&data),
            data,
        })
    }

    /// Attachment name on the remote.
    #[must_use]
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned()
    }
}

/// Find the file for a path referenced in markdown.
///
/// An existing absolute path is used as is. A relative reference is first
/// resolved against `page_dir`, the owning page's source directory, inside
/// `site_dir`. Otherwise `site_dir` is searched recursively for files whose
/// path ends with `reference`, and the match sharing the longest directory
/// prefix with `page_dir` wins; ties go to the shallowest path.
#[must_use]
pub fn locate_file(site_dir: &Path, page_dir: &Path, reference: &Path) -> Option<PathBuf> {
    if reference.is_absolute() {
        return reference.is_file().then(|| reference.to_path_buf());
    }

    let beside_page = site_dir.join(page_dir).join(reference);
    if beside_page.is_file() {
        return Some(beside_page);
    }

    let mut found = Vec::new();
    collect_matches(site_dir, reference, &mut found);
    found.sort();
    found.into_iter().min_by_key(|path| {
        let relative = path.strip_prefix(site_dir).unwrap_or(path);
        let shared = relative
            .components()
            .zip(page_dir.components())
            .take_while(|(a, b)| a == b)
            .count();
        (Reverse(shared), relative.components().count())
    })
}

fn collect_matches(dir: &Path, reference: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_matches(&path, reference, found);
        } else if path.ends_with(reference) {
            found.push(path);
        }
    }
}

/// Uploads attachments, skipping content the remote already has.
pub struct AttachmentSynchronizer<'a, A: ?Sized> {
    directory: PageDirectory<'a, A>,
}

impl<'a, A: ConfluenceApi + ?Sized> AttachmentSynchronizer<'a, A> {
    pub fn new(directory: PageDirectory<'a, A>) -> Self {
        Self { directory }
    }

    /// Create or update `file` on its page.
    ///
    /// Content is compared through the fingerprint stored in the latest
    /// version comment.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] when a remote call fails.
    pub fn sync(&self, file: &AttachmentFile) -> Result<AttachmentOutcome, SyncError> {
        let Some(page) = self.directory.find(&file.page_title)? else {
            warn!(page = %file.page_title, "Page not found, skipping attachment");
            return Ok(AttachmentOutcome::PageMissing);
        };

        let api = self.directory.api();
        let filename = file.filename();
        let content_type = file.content_type();
        let comment = file.fingerprint.change_comment();
        let upload = AttachmentUpload {
            filename: &filename,
            content_type: &content_type,
            data: &file.data,
            comment: &comment,
        };

        let Some(existing) = api.find_attachment(&page.id, &filename)? else {
            if self.directory.is_dry_run() {
                info!(page = %file.page_title, filename = %filename, "Dry run: would upload attachment");
            } else {
                api.create_attachment(&page.id, &upload)?;
                info!(page = %file.page_title, filename = %filename, "Uploaded attachment");
            }
            return Ok(AttachmentOutcome::Created);
        };

        let remote = existing
            .version_message()
            .and_then(Fingerprint::from_change_comment);
        if remote.as_ref() == Some(&file.fingerprint) {
            debug!(page = %file.page_title, filename = %filename, "Attachment unchanged");
            return Ok(AttachmentOutcome::Unchanged);
        }

        if self.directory.is_dry_run() {
            info!(page = %file.page_title, filename = %filename, "Dry run: would update attachment");
        } else {
            api.update_attachment(&page.id, &existing.id, &upload)?;
            info!(page = %file.page_title, filename = %filename, "Updated attachment");
        }
        Ok(AttachmentOutcome::Updated)
    }
}
