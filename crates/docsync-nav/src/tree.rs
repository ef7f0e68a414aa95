//! Flattened navigation tree.

use crate::node::NavNode;

/// Ordered navigation entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavTree {
    nodes: Vec<NavNode>,
}

impl NavTree {
    /// Create a tree from nodes in document order.
    #[must_use]
    pub fn new(nodes: Vec<NavNode>) -> Self {
        Self { nodes }
    }

    /// All nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    /// Node at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&NavNode> {
        self.nodes.get(index)
    }

    /// Number of nodes, pages and sections alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Page nodes with their indices, in document order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &NavNode)> {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_page())
    }

    /// Number of page nodes.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    /// Ancestors of the node at `index`, nearest first.
    ///
    /// An ancestor is the closest preceding node with a smaller depth than
    /// the previous match.
    #[must_use]
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        let depth = self.nodes.get(index).map_or(0, |n| n.depth);
        Ancestors {
            nodes: &self.nodes,
            cursor: index.min(self.nodes.len()),
            depth,
        }
    }

    pub(crate) fn push(&mut self, node: NavNode) {
        self.nodes.push(node);
    }
}

/// Iterator over a node's ancestors. See [`NavTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    nodes: &'a [NavNode],
    cursor: usize,
    depth: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (usize, &'a NavNode);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor > 0 && self.depth > 0 {
            self.cursor -= 1;
            let node = &self.nodes[self.cursor];
            if node.depth < self.depth {
                self.depth = node.depth;
                return Some((self.cursor, node));
            }
        }
        None
    }
}
