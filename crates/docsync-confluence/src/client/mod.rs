//! Confluence REST API client.
//!
//! Provides sync HTTP client for Confluence Server/Data Center and Cloud
//! REST API with basic authentication (username plus API token or password).

mod attachments;
mod pages;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ureq::{Agent, Body};

use crate::api::{AttachmentUpload, ConfluenceApi, NewPage, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Attachment, Content};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: Agent,
    base_url: String,
    auth_header: String,
}

impl ConfluenceClient {
    /// Create client for a Confluence host.
    ///
    /// # Arguments
    /// * `base_url` - Confluence server base URL
    /// * `username` - account name
    /// * `secret` - API token or password
    #[must_use]
    pub fn new(base_url: &str, username: &str, secret: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_header: basic_auth(username, secret),
        }
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }
}

fn basic_auth(username: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{secret}")))
}

/// Turn an error status into [`ConfluenceError::HttpResponse`].
fn check_status(response: ureq::http::Response<Body>) -> Result<Body, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body_reader)
}

impl ConfluenceApi for ConfluenceClient {
    fn find_pages(
        &self,
        space: &str,
        title: &str,
        expand: &[&str],
    ) -> Result<Vec<Content>, ConfluenceError> {
        self.search_pages(space, title, expand)
    }

    fn get_page(&self, page_id: &str, expand: &[&str]) -> Result<Content, ConfluenceError> {
        self.fetch_page(page_id, expand)
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<Content, ConfluenceError> {
        self.post_page(page)
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<Content, ConfluenceError> {
        self.put_page(update)
    }

    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        self.find_attachment_by_name(page_id, filename)
    }

    fn create_attachment(
        &self,
        page_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);
        self.upload(&url, upload)
    }

    fn update_attachment(
        &self,
        page_id: &str,
        attachment_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError> {
        let url = format!(
            "{}/content/{}/child/attachment/{}/data",
            self.api_url(),
            page_id,
            attachment_id
        );
        self.upload(&url, upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth("alice", "s3cret"), "Basic YWxpY2U6czNjcmV0");
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let client = ConfluenceClient::new("https://wiki.example.com/", "u", "p");
        assert_eq!(client.api_url(), "https://wiki.example.com/rest/api");
    }
}
