//! Per-folder custom menus.
//!
//! A folder may hold a menu override file (`_menu.md` or `_menu.wiki`). Its
//! body is a nested list of links, one per line, in either syntax:
//!
//! ```text
//! - [Getting started](start)
//!   - [Install](install)
//! * [[reference|API reference]]
//! ** [[reference/types]]
//! ```
//!
//! Indentation (or repeated list markers) sets the depth. The frontmatter
//! may set `auto-generate: true` to build the menu from the folder contents,
//! spliced in where a `{{auto}}` line appears (or appended after the
//! hand-written entries when there is none), and
//! `position: top` to render the menu as a top bar.
//!
//! For any document, the override of the nearest enclosing folder wins.

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::LazyLock;

use quire_source::{SourceTree, parse_frontmatter};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::folder::FolderConfigs;
use crate::links::{ValidPathSet, resolve_href};
use crate::menu::MenuNode;
use crate::tree::MenuBuilder;

/// Line that marks where the auto-generated menu is inserted.
const PLACEHOLDER: &str = "{{auto}}";

/// Width of a tab when measuring indentation.
const TAB_WIDTH: usize = 4;

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([-*+]+)\s+\[([^\]]*)\]\(\s*([^)\s]*)\s*\)\s*$").unwrap()
});

static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([-*+#]*)\s*\[\[([^\]|]+)(?:\|([^\]]*))?\]\]\s*$").unwrap()
});

static PLAIN_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-*+]+)\s+(\S.*?)\s*$").unwrap());

/// Where a custom menu is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuPosition {
    /// Side tree (default).
    #[default]
    Side,
    /// Top navigation bar.
    Top,
}

impl MenuPosition {
    /// Lowercase name used in templates and artifacts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Side => "side",
            Self::Top => "top",
        }
    }
}

/// A resolved custom menu attached to one folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMenu {
    /// Menu tree.
    pub menu_data: Vec<MenuNode>,
    /// Presentation.
    pub menu_position: MenuPosition,
}

/// One classified line of an override body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuLine {
    /// A list item, with or without a link target.
    Link {
        /// Indentation level (larger is deeper).
        indent: usize,
        /// Display label.
        label: String,
        /// Link target; `None` for a plain text item.
        target: Option<String>,
    },
    /// The auto-generated menu goes here.
    Placeholder,
    /// Empty line.
    Blank,
    /// Anything else; skipped.
    Unrecognized,
}

impl MenuLine {
    /// Classify one line.
    #[must_use]
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        if trimmed == PLACEHOLDER {
            return Self::Placeholder;
        }
        if let Some(caps) = MARKDOWN_LINK_RE.captures(line) {
            return Self::Link {
                indent: indent_level(&caps[1], &caps[2]),
                label: caps[3].trim().to_owned(),
                target: Some(caps[4].to_owned()).filter(|t| !t.is_empty()),
            };
        }
        if let Some(caps) = WIKI_LINK_RE.captures(line) {
            let target = caps[3].trim().to_owned();
            let label = caps
                .get(4)
                .map(|l| l.as_str().trim().to_owned())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| target.clone());
            return Self::Link {
                indent: indent_level(&caps[1], &caps[2]),
                label,
                target: Some(target),
            };
        }
        if let Some(caps) = PLAIN_ITEM_RE.captures(line) {
            return Self::Link {
                indent: indent_level(&caps[1], &caps[2]),
                label: caps[3].to_owned(),
                target: None,
            };
        }
        Self::Unrecognized
    }
}

/// Indentation width plus two levels per extra list marker (`**`, `--`).
fn indent_level(whitespace: &str, markers: &str) -> usize {
    let width: usize = whitespace
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    width + markers.chars().count().saturating_sub(1) * 2
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverrideFrontmatter {
    #[serde(rename = "auto-generate", alias = "auto_generate")]
    auto_generate: bool,
    position: Option<MenuPosition>,
}

/// Parsed override file, before auto-generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedOverride {
    /// Hand-written nodes.
    pub nodes: Vec<MenuNode>,
    /// Whether the folder contents should be added.
    pub auto_generate: bool,
    /// Requested presentation.
    pub position: MenuPosition,
    /// Top-level index of the `{{auto}}` line, if present.
    pub placeholder: Option<usize>,
}

/// Parse an override file living in the folder served at `folder_url`.
///
/// Links are resolved against the folder. A link that does not resolve
/// becomes an inactive leaf; parsing never fails.
#[must_use]
pub fn parse_override(content: &str, folder_url: &str, valid: &ValidPathSet) -> ParsedOverride {
    let (frontmatter, body): (OverrideFrontmatter, _) = parse_frontmatter(content);
    let current = format!("{}/index.html", folder_url.trim_end_matches('/'));

    let mut roots: Vec<MenuNode> = Vec::new();
    // Open items, each with the indentation it was found at
    let mut stack: Vec<(usize, MenuNode)> = Vec::new();
    let mut placeholder = None;

    for line in body.lines() {
        match MenuLine::classify(line) {
            MenuLine::Link {
                indent,
                label,
                target,
            } => {
                close_frames(&mut stack, &mut roots, Some(indent));
                stack.push((indent, resolve_node(label, target.as_deref(), &current, valid)));
            }
            MenuLine::Placeholder => {
                close_frames(&mut stack, &mut roots, None);
                placeholder = Some(roots.len());
            }
            MenuLine::Blank => {}
            MenuLine::Unrecognized => {
                tracing::debug!(line, "Skipping unrecognized menu line");
            }
        }
    }
    close_frames(&mut stack, &mut roots, None);

    ParsedOverride {
        nodes: roots,
        auto_generate: frontmatter.auto_generate,
        position: frontmatter.position.unwrap_or_default(),
        placeholder,
    }
}

/// Pop frames at or deeper than `indent` (all frames when `None`), attaching
/// each to its parent frame or to the roots.
fn close_frames(stack: &mut Vec<(usize, MenuNode)>, roots: &mut Vec<MenuNode>, indent: Option<usize>) {
    while let Some((top, _)) = stack.last() {
        if indent.is_some_and(|i| *top < i) {
            break;
        }
        let Some((_, node)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((_, parent)) => parent.push_child(node),
            None => roots.push(node),
        }
    }
}

fn resolve_node(label: String, target: Option<&str>, current: &str, valid: &ValidPathSet) -> MenuNode {
    let Some(target) = target else {
        return MenuNode::inactive(label, String::new());
    };
    let resolved = resolve_href(target, current, valid);
    if resolved.external {
        return MenuNode::link(label, target, target);
    }
    if resolved.active {
        let path = site_path(&resolved.href);
        return MenuNode::link(label, path, resolved.href);
    }
    MenuNode::inactive(label, site_path(&resolved.href))
}

/// Strip query, fragment, and `.html` from an href.
fn site_path(href: &str) -> String {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    let path = &href[..end];
    path.strip_suffix(".html").unwrap_or(path).to_owned()
}

/// Custom menus keyed by folder path relative to the source root (`""` for
/// the root, `a/b` for nested folders).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomMenus {
    menus: BTreeMap<String, CustomMenu>,
}

impl CustomMenus {
    /// Read and resolve every override found by the scanner.
    ///
    /// `valid` must be complete: override links are resolved against it.
    #[must_use]
    pub fn build(tree: &SourceTree, configs: &FolderConfigs, valid: &ValidPathSet) -> Self {
        let builder = MenuBuilder::new(tree, configs);
        let mut menus = BTreeMap::new();

        for dir in tree.directories.values() {
            let Some(path) = &dir.menu_override else {
                continue;
            };
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read menu override");
                    continue;
                }
            };

            let parsed = parse_override(&content, &dir.url_path, valid);
            let mut nodes = parsed.nodes;
            if parsed.auto_generate {
                let generated = builder.children_of(&dir.relative);
                match parsed.placeholder {
                    Some(at) => {
                        nodes.splice(at..at, generated);
                    }
                    None => nodes.extend(generated),
                }
            }

            tracing::debug!(folder = %dir.url_path, nodes = nodes.len(), "Built custom menu");
            menus.insert(
                folder_key(&dir.relative),
                CustomMenu {
                    menu_data: nodes,
                    menu_position: parsed.position,
                },
            );
        }

        Self { menus }
    }

    /// Restore from persisted `(folder, menu)` pairs.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, CustomMenu)>) -> Self {
        Self {
            menus: entries.into_iter().collect(),
        }
    }

    /// `(folder, menu)` pairs in folder order.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, CustomMenu)> {
        self.menus
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Iterate `(folder, menu)` pairs in folder order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomMenu)> {
        self.menus.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.menus.len()
    }

    /// Whether there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    /// The override governing a document, by its path relative to the source
    /// root. Walks up from the document's folder; the first match wins.
    #[must_use]
    pub fn nearest(&self, document: &Path) -> Option<(&str, &CustomMenu)> {
        let folder = document.parent().unwrap_or(Path::new(""));
        folder.ancestors().find_map(|dir| {
            self.menus
                .get_key_value(&folder_key(dir))
                .map(|(k, v)| (k.as_str(), v))
        })
    }
}

fn folder_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
