//! Confluence page types.

use serde::Deserialize;

/// Page as returned by content endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Version information (present with `expand=version`).
    #[serde(default)]
    pub version: Option<Version>,
    /// Ancestor chain from the space root down to the direct parent
    /// (present with `expand=ancestors`).
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
}

/// Page or attachment version.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
    /// Version message/comment.
    #[serde(default)]
    pub message: Option<String>,
}

/// Entry of a page's ancestor chain.
#[derive(Debug, Clone, Deserialize)]
pub struct Ancestor {
    /// Ancestor page ID.
    pub id: String,
    /// Ancestor page title.
    pub title: String,
}

/// Content search response.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentList {
    /// Matching pages.
    pub results: Vec<Content>,
}

impl Content {
    /// Title of the direct parent, the last entry of the ancestor chain.
    #[must_use]
    pub fn parent_title(&self) -> Option<&str> {
        self.ancestors.last().map(|a| a.title.as_str())
    }
}
