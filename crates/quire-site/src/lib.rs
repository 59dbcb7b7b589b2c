//! Navigation model and link resolution for quire.
//!
//! This crate turns a scanned [`SourceTree`](quire_source::SourceTree) into
//! the site's navigational structure:
//!
//! - [`ValidPathSet`] and [`resolve_href`] decide whether an internal link
//!   points at a real page, and [`rewrite_links`] applies that to rendered
//!   HTML
//! - [`MenuBuilder`] produces the default [`MenuNode`] tree
//! - [`CustomMenus`] holds per-folder menu overrides and picks the nearest
//!   one for a document
//! - [`FolderConfigs`] reads every folder config file once per build
//! - [`render_menu_html`] turns a menu tree into HTML

mod custom;
mod folder;
mod html;
mod links;
mod menu;
mod tree;

pub use custom::{CustomMenu, CustomMenus, MenuLine, MenuPosition, ParsedOverride, parse_override};
pub use folder::{FolderConfig, FolderConfigs};
pub use html::{escape_html, render_menu_html};
pub use links::{LinkStats, ResolvedLink, ValidPathSet, resolve_href, rewrite_links};
pub use menu::{HOME_LABEL, MenuNode, sort_menu};
pub use tree::MenuBuilder;
