//! Ancestor title resolution from the navigation tree.

use docsync_nav::NavTree;
use tracing::warn;

/// Remote titles a page should hang under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorPlan {
    /// Direct parent; the root title for top-level pages.
    pub immediate_parent_title: String,
    /// Parent of the direct parent; the root title when the tree is shallower.
    pub grandparent_title: String,
    /// Configured root page.
    pub root_title: String,
}

/// Derives [`AncestorPlan`]s from a navigation tree.
///
/// Only two ancestor levels are synchronized; anything above the grandparent
/// is expected to exist already.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyResolver<'a> {
    tree: &'a NavTree,
    root_title: &'a str,
}

impl<'a> HierarchyResolver<'a> {
    #[must_use]
    pub fn new(tree: &'a NavTree, root_title: &'a str) -> Self {
        Self { tree, root_title }
    }

    /// Resolve the ancestors of the node at `index`.
    #[must_use]
    pub fn resolve(&self, index: usize) -> AncestorPlan {
        let mut titles = self.tree.ancestors(index).take(2).map(|(_, node)| {
            if !node.is_declared() {
                warn!(
                    section = %node.display_title(),
                    "Section is missing from the nav config, using its directory name"
                );
            }
            node.display_title().into_owned()
        });

        let immediate_parent_title = titles.next().unwrap_or_else(|| self.root_title.to_owned());
        let grandparent_title = titles.next().unwrap_or_else(|| self.root_title.to_owned());

        AncestorPlan {
            immediate_parent_title,
            grandparent_title,
            root_title: self.root_title.to_owned(),
        }
    }
}
