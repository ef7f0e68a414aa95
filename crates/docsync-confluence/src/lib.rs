//! Confluence publishing for docsync.
//!
//! Mirrors a documentation navigation tree into a Confluence space:
//!
//! - [`ConfluenceClient`]: REST client with basic authentication
//! - [`ConfluenceApi`]: the remote operations the synchronizers rely on
//! - [`sync`]: title-keyed page directory, ancestor resolution, page and
//!   attachment synchronizers, and the [`Publisher`] hooks driving a run
//! - [`MockApi`] for testing (behind `mock` feature flag)

mod api;
mod client;
mod error;
pub mod sync;
pub mod types;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use api::{AttachmentUpload, ConfluenceApi, NewPage, PageUpdate};
pub use client::ConfluenceClient;
pub use error::ConfluenceError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{ApiCall, MockApi, MockAttachment, MockPage};
pub use sync::{Publisher, RetryPolicy, RunContext, RunReport, SyncError};
