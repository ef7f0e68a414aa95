//! Mock Confluence API for testing.
//!
//! Provides [`MockApi`], an in-memory page tree that records every call and
//! can simulate search index lag, transport failures and version conflicts.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::api::{AttachmentUpload, ConfluenceApi, NewPage, PageUpdate};
use crate::error::ConfluenceError;
use crate::types::{Ancestor, Attachment, Content, Version};

/// Recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FindPages {
        title: String,
    },
    GetPage {
        id: String,
    },
    CreatePage {
        title: String,
        parent_id: Option<String>,
    },
    UpdatePage {
        id: String,
        title: String,
        version: u32,
    },
    FindAttachment {
        page_id: String,
        filename: String,
    },
    CreateAttachment {
        page_id: String,
        filename: String,
    },
    UpdateAttachment {
        page_id: String,
        attachment_id: String,
        filename: String,
    },
}

impl ApiCall {
    /// Whether the call writes to the remote.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreatePage { .. }
                | Self::UpdatePage { .. }
                | Self::CreateAttachment { .. }
                | Self::UpdateAttachment { .. }
        )
    }
}

/// Page stored in the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPage {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub version: u32,
    pub version_message: Option<String>,
    pub body: String,
    /// Searches that still miss this page.
    hidden_for: u32,
}

/// Attachment stored in the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAttachment {
    pub id: String,
    pub page_id: String,
    pub filename: String,
    pub version: u32,
    pub comment: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    pages: Vec<MockPage>,
    attachments: Vec<MockAttachment>,
    calls: Vec<ApiCall>,
    next_id: u64,
    index_lag: u32,
    create_failures: HashMap<String, u32>,
    search_failures: HashMap<String, u32>,
    conflicts: HashSet<String>,
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        (100 + self.next_id).to_string()
    }

    fn page_by_title(&self, title: &str) -> Option<&MockPage> {
        self.pages.iter().find(|p| p.title == title)
    }

    fn content(&self, page: &MockPage) -> Content {
        let mut ancestors = Vec::new();
        let mut parent_id = page.parent_id.clone();
        while let Some(id) = parent_id {
            let Some(parent) = self.pages.iter().find(|p| p.id == id) else {
                break;
            };
            ancestors.push(Ancestor {
                id: parent.id.clone(),
                title: parent.title.clone(),
            });
            parent_id = parent.parent_id.clone();
        }
        ancestors.reverse();

        Content {
            id: page.id.clone(),
            title: page.title.clone(),
            version: Some(Version {
                number: page.version,
                message: page.version_message.clone(),
            }),
            ancestors,
        }
    }
}

fn http_error(status: u16, body: &str) -> ConfluenceError {
    ConfluenceError::HttpResponse {
        status,
        body: body.to_owned(),
    }
}

/// In-memory Confluence space for testing.
///
/// # Example
///
/// ```ignore
/// use docsync_confluence::{ConfluenceApi, MockApi};
///
/// let api = MockApi::new("DOCS")
///     .with_page("Docs Home", None)
///     .with_page("Guides", Some("Docs Home"));
///
/// let pages = api.find_pages("DOCS", "Guides", &["version"]).unwrap();
/// assert_eq!(api.parent_title("Guides").as_deref(), Some("Docs Home"));
/// ```
#[derive(Debug)]
pub struct MockApi {
    space: String,
    state: RwLock<MockState>,
}

impl MockApi {
    /// Create an empty space.
    #[must_use]
    pub fn new(space: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            state: RwLock::new(MockState::default()),
        }
    }

    /// Add an existing page at version 1.
    ///
    /// # Panics
    ///
    /// Panics if `parent` names a page that was not added before, or if the
    /// internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, title: &str, parent: Option<&str>) -> Self {
        {
            let mut state = self.state.write().unwrap();
            let parent_id = parent.map(|p| {
                state
                    .page_by_title(p)
                    .map(|page| page.id.clone())
                    .unwrap_or_else(|| panic!("parent page '{p}' must be added first"))
            });
            let id = state.allocate_id();
            state.pages.push(MockPage {
                id,
                title: title.to_owned(),
                parent_id,
                version: 1,
                version_message: None,
                body: String::new(),
                hidden_for: 0,
            });
        }
        self
    }

    /// Add an existing attachment at version 1.
    ///
    /// # Panics
    ///
    /// Panics if the page does not exist or the internal lock is poisoned.
    #[must_use]
    pub fn with_attachment(self, page_title: &str, filename: &str, comment: &str) -> Self {
        {
            let mut state = self.state.write().unwrap();
            let page_id = state
                .page_by_title(page_title)
                .map(|p| p.id.clone())
                .unwrap_or_else(|| panic!("page '{page_title}' must be added first"));
            let id = format!("att{}", state.allocate_id());
            state.attachments.push(MockAttachment {
                id,
                page_id,
                filename: filename.to_owned(),
                version: 1,
                comment: comment.to_owned(),
                data: Vec::new(),
            });
        }
        self
    }

    /// Make newly created pages invisible to the next `searches` title searches.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_index_lag(self, searches: u32) -> Self {
        self.state.write().unwrap().index_lag = searches;
        self
    }

    /// Fail the next `count` creations of `title` with HTTP 503.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_create_failures(self, title: &str, count: u32) -> Self {
        self.state
            .write()
            .unwrap()
            .create_failures
            .insert(title.to_owned(), count);
        self
    }

    /// Fail the next `count` title searches for `title` with HTTP 500.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_search_failures(self, title: &str, count: u32) -> Self {
        self.state
            .write()
            .unwrap()
            .search_failures
            .insert(title.to_owned(), count);
        self
    }

    /// Reject every update of `title` with HTTP 409.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_update_conflict(self, title: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .conflicts
            .insert(title.to_owned());
        self
    }

    /// All recorded calls in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Recorded calls that write to the remote.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear_calls(&self) {
        self.state.write().unwrap().calls.clear();
    }

    /// Stored page by title.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn page(&self, title: &str) -> Option<MockPage> {
        self.state.read().unwrap().page_by_title(title).cloned()
    }

    /// Title of the stored page's parent.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn parent_title(&self, title: &str) -> Option<String> {
        let state = self.state.read().unwrap();
        let parent_id = state.page_by_title(title)?.parent_id.clone()?;
        state
            .pages
            .iter()
            .find(|p| p.id == parent_id)
            .map(|p| p.title.clone())
    }

    /// Stored attachment by page title and filename.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn attachment(&self, page_title: &str, filename: &str) -> Option<MockAttachment> {
        let state = self.state.read().unwrap();
        let page_id = state.page_by_title(page_title)?.id.clone();
        state
            .attachments
            .iter()
            .find(|a| a.page_id == page_id && a.filename == filename)
            .cloned()
    }
}

impl ConfluenceApi for MockApi {
    fn find_pages(
        &self,
        space: &str,
        title: &str,
        _expand: &[&str],
    ) -> Result<Vec<Content>, ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::FindPages {
            title: title.to_owned(),
        });
        if let Some(remaining) = state.search_failures.get_mut(title)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(http_error(500, "Internal Server Error"));
        }
        if space != self.space {
            return Ok(Vec::new());
        }

        let mut visible = Vec::new();
        for page in state.pages.iter_mut().filter(|p| p.title == title) {
            if page.hidden_for > 0 {
                page.hidden_for -= 1;
            } else {
                visible.push(page.id.clone());
            }
        }
        Ok(visible
            .iter()
            .filter_map(|id| state.pages.iter().find(|p| &p.id == id))
            .map(|p| state.content(p))
            .collect())
    }

    fn get_page(&self, page_id: &str, _expand: &[&str]) -> Result<Content, ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::GetPage {
            id: page_id.to_owned(),
        });
        let page = state
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .ok_or_else(|| http_error(404, "No content found"))?;
        Ok(state.content(page))
    }

    fn create_page(&self, page: &NewPage<'_>) -> Result<Content, ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::CreatePage {
            title: page.title.to_owned(),
            parent_id: page.parent_id.map(str::to_owned),
        });

        if let Some(remaining) = state.create_failures.get_mut(page.title)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(http_error(503, "Service Unavailable"));
        }
        if state.page_by_title(page.title).is_some() {
            return Err(http_error(
                400,
                "A page with this title already exists in this space",
            ));
        }
        if let Some(parent_id) = page.parent_id
            && !state.pages.iter().any(|p| p.id == parent_id)
        {
            return Err(http_error(404, "Parent page not found"));
        }

        let id = state.allocate_id();
        let stored = MockPage {
            id,
            title: page.title.to_owned(),
            parent_id: page.parent_id.map(str::to_owned),
            version: 1,
            version_message: page.message.map(str::to_owned),
            body: page.body.to_owned(),
            hidden_for: state.index_lag,
        };
        let content = state.content(&stored);
        state.pages.push(stored);
        Ok(content)
    }

    fn update_page(&self, update: &PageUpdate<'_>) -> Result<Content, ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::UpdatePage {
            id: update.id.to_owned(),
            title: update.title.to_owned(),
            version: update.version,
        });

        let conflicting = state.conflicts.contains(update.title);
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == update.id)
            .ok_or_else(|| http_error(404, "No content found"))?;
        if conflicting || update.version != page.version + 1 {
            return Err(http_error(409, "Version must be incremented on update"));
        }
        page.version = update.version;
        page.version_message = update.message.map(str::to_owned);
        page.body = update.body.to_owned();

        let page = page.clone();
        Ok(state.content(&page))
    }

    fn find_attachment(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::FindAttachment {
            page_id: page_id.to_owned(),
            filename: filename.to_owned(),
        });
        Ok(state
            .attachments
            .iter()
            .find(|a| a.page_id == page_id && a.filename == filename)
            .map(|a| Attachment {
                id: a.id.clone(),
                title: a.filename.clone(),
                version: Some(Version {
                    number: a.version,
                    message: Some(a.comment.clone()),
                }),
            }))
    }

    fn create_attachment(
        &self,
        page_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::CreateAttachment {
            page_id: page_id.to_owned(),
            filename: upload.filename.to_owned(),
        });
        let id = format!("att{}", state.allocate_id());
        state.attachments.push(MockAttachment {
            id,
            page_id: page_id.to_owned(),
            filename: upload.filename.to_owned(),
            version: 1,
            comment: upload.comment.to_owned(),
            data: upload.data.to_vec(),
        });
        Ok(())
    }

    fn update_attachment(
        &self,
        page_id: &str,
        attachment_id: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError> {
        let mut state = self.state.write().unwrap();
        state.calls.push(ApiCall::UpdateAttachment {
            page_id: page_id.to_owned(),
            attachment_id: attachment_id.to_owned(),
            filename: upload.filename.to_owned(),
        });
        let attachment = state
            .attachments
            .iter_mut()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| http_error(404, "No attachment found"))?;
        attachment.version += 1;
        attachment.comment = upload.comment.to_owned();
        attachment.data = upload.data.to_vec();
        Ok(())
    }
}
