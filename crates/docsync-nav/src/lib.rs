//! Documentation navigation tree for docsync.
//!
//! A [`NavTree`] is the ordered, flattened navigation of a documentation
//! site: every entry is a [`NavNode`] tagged as a page or a section with its
//! nesting depth. Nesting is encoded by depth alone, so ancestors are found
//! by walking backwards from a node.
//!
//! Trees are built from the `nav:` section of an `mkdocs.yml` file, with
//! markdown files missing from the declared navigation appended as
//! undeclared ("orphan") pages.
//!
//! # Example
//!
//! ```
//! use docsync_nav::{NavNode, NavTree};
//!
//! let tree = NavTree::new(vec![
//!     NavNode::section("Guides", 0),
//!     NavNode::page(Some("Intro"), "guides/intro.md", 1),
//! ]);
//!
//! let ancestors: Vec<_> = tree.ancestors(1).map(|(_, n)| n.display_title()).collect();
//! assert_eq!(ancestors, ["Guides"]);
//! ```

mod mkdocs;
mod node;
mod scan;
mod tree;

pub use mkdocs::load_mkdocs_nav;
pub use node::{NavKind, NavNode};
pub use tree::{Ancestors, NavTree};

use std::path::PathBuf;

/// Error while building a navigation tree.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// I/O error reading the navigation source or docs directory.
    #[error("failed to read {}", .path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Navigation file is not valid YAML.
    #[error("invalid navigation file {}", .path.display())]
    Yaml {
        /// Path being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A `nav:` entry has an unsupported shape.
    #[error("unsupported nav entry: {0}")]
    InvalidEntry(String),
}
