//! Reconciliation of a local navigation tree with a Confluence space.
//!
//! [`Publisher`] drives one run: for every page node it renders the body,
//! resolves the ancestor titles, creates or updates the remote page through
//! [`PageSynchronizer`], and afterwards uploads referenced files through
//! [`AttachmentSynchronizer`].

mod attachments;
mod context;
mod directory;
mod fingerprint;
mod pages;
mod publisher;
mod resolver;
mod retry;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use attachments::{AttachmentFile, AttachmentOutcome, AttachmentSynchronizer, locate_file};
pub use context::{AttachmentRecord, Progress, RunContext, RunReport};
pub use directory::{PageDirectory, ParentLookup, RemotePageRef};
pub use fingerprint::Fingerprint;
pub use pages::{PageOutcome, PageSynchronizer};
pub use publisher::Publisher;
pub use resolver::{AncestorPlan, HierarchyResolver};
pub use retry::{RetryError, RetryPolicy};

use crate::error::ConfluenceError;

/// Error from synchronizing a single node.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Remote call failed.
    #[error("Confluence API error: {0}")]
    Transport(#[from] ConfluenceError),

    /// Page version changed between read and write.
    #[error("page '{title}' was modified concurrently (version {version} already taken)")]
    Conflict { title: String, version: u32 },

    /// Title lookup matched more than one page.
    #[error("{count} pages titled '{title}' in space {space}")]
    AmbiguousResult {
        title: String,
        space: String,
        count: usize,
    },

    /// Page expected to exist was not found.
    #[error("page '{0}' not found")]
    NotFound(String),

    /// Configured root page does not exist.
    #[error("main parent page '{0}' not found")]
    MainRootUnknown(String),

    /// Remote parent differs from the local navigation.
    #[error(
        "page '{title}' has parent '{}' on the remote, expected '{expected}'",
        .actual.as_deref().unwrap_or("<space root>")
    )]
    HierarchyMismatch {
        title: String,
        expected: String,
        actual: Option<String>,
    },

    /// Created page did not become searchable in time.
    #[error("page '{title}' not visible after {attempts} attempts")]
    NotVisible { title: String, attempts: u32 },

    /// Local file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
