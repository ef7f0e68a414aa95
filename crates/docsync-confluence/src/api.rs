//! Remote operations used by the synchronizers.
//!
//! [`ConfluenceClient`](crate::ConfluenceClient) talks to a real server; the
//! `mock` feature provides an in-memory implementation for tests.

use crate::error::ConfluenceError;
use crate::types::{Attachment, Content};

/// Page to create.
#[derive(Debug, Clone, Copy)]
pub struct NewPage<'a> {
    pub space: &'a str,
    pub title: &'a str,
    /// Parent page ID; `None` creates the page at the space root.
    pub parent_id: Option<&'a str>,
    /// Body in storage format.
    pub body: &'a str,
    pub message: Option<&'a str>,
}

/// Full replacement of an existing page.
#[derive(Debug, Clone, Copy)]
pub struct PageUpdate<'a> {
    pub id: &'a str,
    pub space: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    /// Version number to write (current version + 1).
    pub version: u32,
    pub message: Option<&'a str>,
}

/// Attachment file content with its change comment.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentUpload<'a> {
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
    pub comment: &'a str,
}

/// Confluence REST operations.
pub trait ConfluenceApi {
    /// Search pages by exact title within a space.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn find_pages(
        &self,
        space: &str,
        title: &str,
        expand: &[&str],
    ) -> Result<Vec<Content>, ConfluenceError>;

    /// Get page by ID with optional field expansion.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the page does not exist.
    fn get_page(&self, page_id: &str, expand: &[&str]) -> Result<Content, ConfluenceError>;

    /// Create a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn create_page(&self, page: &NewPage<'_>) -> Result<Content, ConfluenceError>;

    /// Replace a page body, writing `update.version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. A stale version is reported by
    /// the server as HTTP 409.
    fn update_page(&self, update: &PageUpdate<'_>) -> Result<Content, ConfluenceError>;

    /// Find an attachment by filename on a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError>;

    /// Upload a new attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn create_attachment(
        &self,
        page_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError>;

    /// Upload a new version of an existing attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn update_attachment(
        &self,
        page_id: &str,
        attachment_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError>;
}
