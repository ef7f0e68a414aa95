//! Navigation node types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Title used when a node has neither a declared title nor a path.
const UNTITLED: &str = "Untitled";

/// Kind of navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    /// A markdown page.
    Page,
    /// A grouping of pages and nested sections.
    Section,
}

/// One entry in the flattened navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Page or section.
    pub kind: NavKind,
    /// Title declared in the navigation config, if any.
    pub title: Option<String>,
    /// Docs-relative path: the markdown file for pages, the directory for
    /// sections discovered on disk.
    pub path: Option<PathBuf>,
    /// Nesting level, 0 for top-level entries.
    pub depth: usize,
}

impl NavNode {
    /// Create a page node.
    #[must_use]
    pub fn page(title: Option<&str>, path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            kind: NavKind::Page,
            title: title.map(str::to_owned),
            path: Some(path.into()),
            depth,
        }
    }

    /// Create a declared section node.
    #[must_use]
    pub fn section(title: &str, depth: usize) -> Self {
        Self {
            kind: NavKind::Section,
            title: Some(title.to_owned()),
            path: None,
            depth,
        }
    }

    /// Create a section that only exists as a directory on disk.
    #[must_use]
    pub fn directory(path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            kind: NavKind::Section,
            title: None,
            path: Some(path.into()),
            depth,
        }
    }

    /// Whether this node is a page.
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.kind == NavKind::Page
    }

    /// Whether the navigation config declares a title for this node.
    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.title.is_some()
    }

    /// Title used for the remote page.
    ///
    /// The declared title if present; otherwise the file name without its
    /// extension (pages) or the directory name (sections).
    #[must_use]
    pub fn display_title(&self) -> Cow<'_, str> {
        if let Some(title) = &self.title {
            return Cow::Borrowed(title);
        }
        self.path
            .as_deref()
            .and_then(|p| self.derived_name(p))
            .unwrap_or(Cow::Borrowed(UNTITLED))
    }

    fn derived_name<'a>(&self, path: &'a Path) -> Option<Cow<'a, str>> {
        let name = match self.kind {
            NavKind::Page => path.file_stem(),
            NavKind::Section => path.file_name(),
        }?;
        Some(name.to_string_lossy())
    }
}
