//! Incremental site builds for quire.
//!
//! [`SiteBuilder`] turns a source tree into a static site: one HTML page per
//! document, copies of static assets, search indexes and menu data. Every
//! run reuses what the previous one left behind where it can:
//!
//! - Navigation (menus and valid link targets) is restored from the cache
//!   while no navigation-relevant file changed.
//! - A document is rendered again only when its content or the environment
//!   it is rendered in (templates, footer, menus, valid paths) changed.
//! - A static asset is copied again only when its `(mtime, size)` changed.
//!
//! A file that fails to read, render, template or write is recorded in the
//! report and in `build-errors.json`; the rest of the site is still built.
//!
//! In dev mode the server feeds file events through [`classify`] and calls
//! [`SiteBuilder::rebuild_file`] or [`SiteBuilder::copy_static`] for changes
//! that do not touch navigation.
//!
//! # Example
//!
//! ```no_run
//! use quire_build::{BuildOptions, SiteBuilder};
//!
//! # async fn run() -> Result<(), quire_build::RunError> {
//! let mut builder = SiteBuilder::new(BuildOptions::new("docs", "site"))?;
//! let report = builder.build().await?;
//! println!("{} pages rendered", report.rendered);
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod builder;
mod classify;
mod context;
mod error;
mod io;
mod observer;
mod options;

pub use artifacts::{FULLTEXT_INDEX_NAME, MENU_DATA_NAME, SEARCH_INDEX_NAME, custom_menu_file_name};
pub use builder::SiteBuilder;
pub use classify::{PendingActions, RebuildAction, SiteLayout, classify};
pub use context::{BuildContext, PageMenu};
pub use error::{BuildError, ERROR_REPORT_NAME, ErrorReport, Phase, RunError};
pub use observer::{BuildEvent, BuildObserver, NoopObserver};
pub use options::{BuildOptions, BuildReport};
