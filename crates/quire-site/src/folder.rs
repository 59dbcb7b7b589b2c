//! Per-folder configuration.
//!
//! Folder config files (`meta.yaml` by default) may rename a folder in the
//! menu, give it an icon, or hide it. [`FolderConfigs`] reads every config
//! file found by the scanner exactly once per build; every later question
//! about a folder is answered from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quire_source::SourceTree;
use serde::Deserialize;

/// Settings from one folder config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    /// Menu label replacing the folder name.
    pub label: Option<String>,
    /// Icon path, relative to the folder unless absolute.
    pub icon: Option<String>,
    /// Explicit hidden flag.
    pub hidden: Option<bool>,
}

/// Folder configs keyed by directory path relative to the source root.
#[derive(Clone, Debug, Default)]
pub struct FolderConfigs {
    configs: HashMap<PathBuf, FolderConfig>,
}

impl FolderConfigs {
    /// Read the config file of every scanned directory.
    ///
    /// Unreadable or malformed files are logged and treated as empty.
    #[must_use]
    pub fn load(tree: &SourceTree) -> Self {
        let configs = tree
            .directories
            .values()
            .filter_map(|dir| {
                let path = dir.config.as_ref()?;
                Some((dir.relative.clone(), read_config(path)))
            })
            .collect();
        Self { configs }
    }

    /// Build from already-parsed configs.
    #[must_use]
    pub fn from_configs(configs: HashMap<PathBuf, FolderConfig>) -> Self {
        Self { configs }
    }

    /// Config of exactly this directory.
    #[must_use]
    pub fn get(&self, relative: &Path) -> Option<&FolderConfig> {
        self.configs.get(relative)
    }

    /// Menu label override for this directory.
    #[must_use]
    pub fn label(&self, relative: &Path) -> Option<&str> {
        self.get(relative)?.label.as_deref()
    }

    /// Whether the directory is hidden from navigation.
    ///
    /// The nearest ancestor (including the directory itself) with an
    /// explicit `hidden` value decides.
    #[must_use]
    pub fn is_hidden(&self, relative: &Path) -> bool {
        relative
            .ancestors()
            .find_map(|dir| self.get(dir).and_then(|c| c.hidden))
            .unwrap_or(false)
    }

    /// Icon URL for this directory, if its config sets one.
    ///
    /// Relative icons are resolved against the folder's site path.
    #[must_use]
    pub fn icon_url(&self, relative: &Path, dir_url: &str) -> Option<String> {
        let icon = self.get(relative)?.icon.as_deref()?;
        if icon.starts_with('/') || icon.contains("://") {
            return Some(icon.to_owned());
        }
        let base = dir_url.trim_end_matches('/');
        Some(format!("{base}/{}", icon.trim_start_matches("./")))
    }
}

fn read_config(path: &Path) -> FolderConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read folder config");
            return FolderConfig::default();
        }
    };
    if content.trim().is_empty() {
        return FolderConfig::default();
    }
    serde_yaml::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Invalid folder config, ignoring");
        FolderConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_source::Scanner;

    fn configs(entries: &[(&str, FolderConfig)]) -> FolderConfigs {
        FolderConfigs::from_configs(
            entries
                .iter()
                .map(|(p, c)| (PathBuf::from(p), c.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_load_reads_each_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("a/meta.yaml"), "label: Alpha\nicon: logo.svg\n").unwrap();
        std::fs::write(root.join("a/b/meta.yaml"), "hidden: true\n").unwrap();

        let tree = Scanner::new(root.to_path_buf(), "meta.yaml").scan().unwrap();
        let configs = FolderConfigs::load(&tree);

        assert_eq!(configs.label(Path::new("a")), Some("Alpha"));
        assert!(configs.is_hidden(Path::new("a/b")));
        assert!(!configs.is_hidden(Path::new("a")));
        assert_eq!(
            configs.icon_url(Path::new("a"), "/a"),
            Some("/a/logo.svg".to_owned())
        );
    }

    #[test]
    fn test_malformed_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("meta.yaml"), "label: [unclosed").unwrap();

        let tree = Scanner::new(root.to_path_buf(), "meta.yaml").scan().unwrap();
        let configs = FolderConfigs::load(&tree);

        assert_eq!(configs.get(Path::new("")), Some(&FolderConfig::default()));
    }

    #[test]
    fn test_hidden_nearest_ancestor_wins() {
        let hidden = FolderConfig {
            hidden: Some(true),
            ..FolderConfig::default()
        };
        let shown = FolderConfig {
            hidden: Some(false),
            ..FolderConfig::default()
        };
        let configs = configs(&[("a", hidden), ("a/b/c", shown)]);

        assert!(configs.is_hidden(Path::new("a")));
        assert!(configs.is_hidden(Path::new("a/b")));
        assert!(!configs.is_hidden(Path::new("a/b/c")));
        assert!(!configs.is_hidden(Path::new("z")));
    }

    #[test]
    fn test_icon_url_absolute_kept() {
        let configs = configs(&[(
            "a",
            FolderConfig {
                icon: Some("/static/a.svg".to_owned()),
                ..FolderConfig::default()
            },
        )]);
        assert_eq!(
            configs.icon_url(Path::new("a"), "/a"),
            Some("/static/a.svg".to_owned())
        );
        assert_eq!(configs.icon_url(Path::new("b"), "/b"), None);
    }
}
