//! Default navigation tree.
//!
//! The default menu mirrors the source tree. A folder is navigable when it
//! has an index document; a folder without one still groups its children
//! but is marked inactive. Folders with nothing to show are left out.

use std::path::Path;

use quire_source::{SourceDir, SourceTree};

use crate::folder::FolderConfigs;
use crate::menu::{HOME_LABEL, MenuNode, sort_menu};

/// Builds [`MenuNode`] trees from a scanned source tree.
pub struct MenuBuilder<'a> {
    tree: &'a SourceTree,
    configs: &'a FolderConfigs,
}

impl<'a> MenuBuilder<'a> {
    /// Create a builder over a scan and its folder configs.
    #[must_use]
    pub fn new(tree: &'a SourceTree, configs: &'a FolderConfigs) -> Self {
        Self { tree, configs }
    }

    /// Build the site-wide menu: `Home` first, then the root's children.
    #[must_use]
    pub fn build(&self) -> Vec<MenuNode> {
        let root = self.tree.root_dir();
        let home = match root.and_then(|d| d.index.as_ref()) {
            Some(index) => {
                let href = self
                    .tree
                    .file(index)
                    .map_or_else(|| "/index.html".to_owned(), quire_source::SourceFile::href);
                MenuNode::link(HOME_LABEL, "/", href)
            }
            None => MenuNode::inactive(HOME_LABEL, "/"),
        };

        let mut menu = vec![home];
        menu.extend(self.children_of(Path::new("")));
        menu
    }

    /// Sorted menu nodes for the contents of one directory.
    ///
    /// Used for the root menu and for auto-generated custom menus.
    #[must_use]
    pub fn children_of(&self, relative: &Path) -> Vec<MenuNode> {
        let Some(dir) = self.tree.dir(relative) else {
            return Vec::new();
        };

        let mut nodes: Vec<MenuNode> = dir
            .subdirs
            .iter()
            .filter(|sub| !self.configs.is_hidden(sub))
            .filter_map(|sub| self.tree.dir(sub))
            .filter_map(|sub| self.folder_node(sub))
            .collect();

        for doc in &dir.documents {
            if dir.index.as_ref() == Some(doc) {
                continue;
            }
            let Some(file) = self.tree.file(doc) else {
                continue;
            };
            let label = doc
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            nodes.push(MenuNode::link(label, file.url_path.clone(), file.href()));
        }

        sort_menu(&mut nodes);
        nodes
    }

    fn folder_node(&self, dir: &SourceDir) -> Option<MenuNode> {
        let children = self.children_of(&dir.relative);
        let index = dir.index.as_ref().and_then(|i| self.tree.file(i));
        if index.is_none() && children.is_empty() {
            return None;
        }

        let label = self
            .configs
            .label(&dir.relative)
            .map_or_else(|| dir.name(), str::to_owned);
        let node = match index {
            Some(file) => MenuNode::link(label, dir.url_path.clone(), file.href()),
            None => MenuNode::inactive(label, dir.url_path.clone()),
        };
        Some(
            node.with_children(children)
                .with_icon(self.icon_for(dir)),
        )
    }

    fn icon_for(&self, dir: &SourceDir) -> Option<String> {
        self.configs
            .icon_url(&dir.relative, &dir.url_path)
            .or_else(|| {
                let icon = dir.icon.as_ref()?;
                let rel = self.tree.relative_of(icon)?;
                self.tree.file(&rel).map(|f| f.url_path.clone())
            })
    }
}
