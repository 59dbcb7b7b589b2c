//! Menu tree nodes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Label of the first entry of every default menu.
pub const HOME_LABEL: &str = "Home";

/// One entry of a navigation menu.
///
/// Folders carry children; documents are leaves. A node without `href` is
/// not navigable (a folder without an index file, or a custom menu link that
/// does not resolve) and is marked `inactive`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    /// Display label.
    pub label: String,
    /// Site path (extensionless for documents).
    pub path: String,
    /// Link target, `None` when not navigable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Whether the node is non-navigable.
    #[serde(default)]
    pub inactive: bool,
    /// Whether `children` is non-empty.
    #[serde(default)]
    pub has_children: bool,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl MenuNode {
    /// A navigable leaf.
    #[must_use]
    pub fn link(label: impl Into<String>, path: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            href: Some(href.into()),
            inactive: false,
            has_children: false,
            children: Vec::new(),
            icon: None,
        }
    }

    /// A non-navigable node.
    #[must_use]
    pub fn inactive(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            href: None,
            inactive: true,
            has_children: false,
            children: Vec::new(),
            icon: None,
        }
    }

    /// Replace children, keeping `has_children` in sync.
    #[must_use]
    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.set_children(children);
        self
    }

    /// Set the icon URL.
    #[must_use]
    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    /// Replace children, keeping `has_children` in sync.
    pub fn set_children(&mut self, children: Vec<MenuNode>) {
        self.has_children = !children.is_empty();
        self.children = children;
    }

    /// Append one child, keeping `has_children` in sync.
    pub fn push_child(&mut self, child: MenuNode) {
        self.children.push(child);
        self.has_children = true;
    }
}

/// Order nodes with children first, then by label (case-sensitive).
fn menu_order(a: &MenuNode, b: &MenuNode) -> Ordering {
    b.has_children
        .cmp(&a.has_children)
        .then_with(|| a.label.cmp(&b.label))
}

/// Sort one level of a menu in place.
pub fn sort_menu(nodes: &mut [MenuNode]) {
    nodes.sort_by(menu_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn folder(label: &str) -> MenuNode {
        MenuNode::inactive(label, format!("/{label}"))
            .with_children(vec![MenuNode::link("x", "/x", "/x.html")])
    }

    #[test]
    fn test_sort_folders_first_then_case_sensitive() {
        let mut nodes = vec![
            MenuNode::link("beta", "/beta", "/beta.html"),
            folder("Zeta"),
            MenuNode::link("alpha", "/alpha", "/alpha.html"),
            folder("Alpha"),
        ];

        sort_menu(&mut nodes);

        let labels: Vec<_> = nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Zeta", "alpha", "beta"]);
    }

    #[test]
    fn test_uppercase_sorts_before_lowercase() {
        let mut nodes = vec![
            MenuNode::link("apple", "/apple", "/apple.html"),
            MenuNode::link("Banana", "/Banana", "/Banana.html"),
        ];
        sort_menu(&mut nodes);
        assert_eq!(nodes[0].label, "Banana");
    }

    #[test]
    fn test_children_flag_tracks_children() {
        let mut node = MenuNode::inactive("a", "/a");
        assert!(!node.has_children);
        node.push_child(MenuNode::link("b", "/a/b", "/a/b.html"));
        assert!(node.has_children);
        node.set_children(Vec::new());
        assert!(!node.has_children);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let node = folder("Docs");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["hasChildren"], true);
        assert_eq!(json["inactive"], true);
        assert!(json.get("href").is_none());
        assert_eq!(json["children"][0]["href"], "/x.html");
    }
}
