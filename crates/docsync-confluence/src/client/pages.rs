//! Page operations for Confluence API.

use serde_json::json;
use tracing::{debug, info};

use super::{ConfluenceClient, check_status};
use crate::api::{NewPage, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Content, ContentList};

impl ConfluenceClient {
    /// Search pages by title in a space.
    pub(crate) fn search_pages(
        &self,
        space: &str,
        title: &str,
        expand: &[&str],
    ) -> Result<Vec<Content>, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        debug!("Searching page '{}' in space {}", title, space);

        let mut request = self
            .agent
            .get(&url)
            .query("title", title)
            .query("spaceKey", space)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json");
        if !expand.is_empty() {
            request = request.query("expand", expand.join(","));
        }

        let list: ContentList = check_status(request.call()?)?.read_json()?;
        Ok(list.results)
    }

    /// Get page by ID with optional field expansion.
    pub(crate) fn fetch_page(
        &self,
        page_id: &str,
        expand: &[&str],
    ) -> Result<Content, ConfluenceError> {
        let mut url = format!("{}/content/{}", self.api_url(), page_id);

        if !expand.is_empty() {
            url.push_str("?expand=");
            url.push_str(&expand.join(","));
        }

        debug!("Getting page {}", page_id);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()?;

        Ok(check_status(response)?.read_json()?)
    }

    /// Create a page, optionally under a parent.
    pub(crate) fn post_page(&self, page: &NewPage<'_>) -> Result<Content, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        let mut payload = json!({
            "type": "page",
            "title": page.title,
            "space": {"key": page.space},
            "body": {
                "storage": {
                    "value": page.body,
                    "representation": "storage"
                }
            }
        });

        if let Some(parent_id) = page.parent_id {
            payload["ancestors"] = json!([{"id": parent_id}]);
        }
        if let Some(msg) = page.message {
            payload["version"] = json!({"number": 1, "message": msg});
        }

        info!(
            "Creating page '{}' under {}",
            page.title,
            page.parent_id.unwrap_or("space root")
        );

        let payload_bytes = serde_json::to_vec(&payload)?;

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        Ok(check_status(response)?.read_json()?)
    }

    /// Replace page body, writing the given version number.
    pub(crate) fn put_page(&self, update: &PageUpdate<'_>) -> Result<Content, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), update.id);

        let mut payload = json!({
            "id": update.id,
            "type": "page",
            "title": update.title,
            "space": {"key": update.space},
            "body": {
                "storage": {
                    "value": update.body,
                    "representation": "storage"
                }
            },
            "version": {"number": update.version}
        });

        if let Some(msg) = update.message {
            payload["version"]["message"] = json!(msg);
        }

        info!("Updating page {} to version {}", update.id, update.version);

        let payload_bytes = serde_json::to_vec(&payload)?;

        let response = self
            .agent
            .put(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        Ok(check_status(response)?.read_json()?)
    }
}
