//! Navigation tree — the display surface the controller writes to.
//!
//! ```text
//! [nav-tree]
//!   Inbox (3)
//!   Buy milk (2)
//!   Write paper (0)
//! ```
//!
//! Nodes keep their insertion position; relabeling never moves a node.

use tui_tree_widget::TreeItem;

/// Operations the navigation controller needs from a display surface.
pub trait DisplaySurface {
    /// Create the node if absent, otherwise relabel it in place.
    fn add_or_update_node(&mut self, key: &str, label: &str);
    /// Remove every node.
    fn clear(&mut self);
    /// Make this surface available in the layout region under `tag`.
    fn register_dock(&mut self, tag: &str);
    /// Bring the dock registered under `tag` to the front.
    fn switch_to(&mut self, tag: &str);
}

/// One displayed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub key: String,
    pub label: String,
}

/// In-memory navigation tree plus the dock region it lives in.
#[derive(Debug, Default, Clone)]
pub struct NavigationTree {
    nodes: Vec<TreeNode>,
    docks: Vec<String>,
    active_dock: Option<String>,
}

impl NavigationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.key == key)
            .map(|n| n.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn docks(&self) -> &[String] {
        &self.docks
    }

    pub fn active_dock(&self) -> Option<&str> {
        self.active_dock.as_deref()
    }

    /// Flat tree items for tui-tree-widget, keyed by node key.
    pub fn to_tree_items<'a>(&self) -> Vec<TreeItem<'a, String>> {
        self.nodes
            .iter()
            .map(|n| TreeItem::new_leaf(n.key.clone(), n.label.clone()))
            .collect()
    }
}

impl DisplaySurface for NavigationTree {
    fn add_or_update_node(&mut self, key: &str, label: &str) {
        match self.nodes.iter_mut().find(|n| n.key == key) {
            Some(node) => node.label = label.to_string(),
            None => self.nodes.push(TreeNode {
                key: key.to_string(),
                label: label.to_string(),
            }),
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn register_dock(&mut self, tag: &str) {
        if !self.docks.iter().any(|d| d == tag) {
            self.docks.push(tag.to_string());
        }
    }

    fn switch_to(&mut self, tag: &str) {
        self.active_dock = Some(tag.to_string());
    }
}
