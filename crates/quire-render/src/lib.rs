//! Document rendering for quire.
//!
//! - [`Renderer`]: the collaborator that turns one document body into HTML,
//!   dispatched on the closed [`RenderKind`] enum. [`DefaultRenderer`] covers
//!   wiki, markdown and component documents with pulldown-cmark.
//! - [`parse_document`]: frontmatter and title extraction.
//! - [`Templates`]: page templates and footer from the meta directory.
//! - [`RenderCoordinator`]: renders batches of documents on a fixed pool of
//!   parallel lanes. A panic or error in one document never affects the
//!   rest of its batch.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quire_render::{DefaultRenderer, RenderContext, RenderCoordinator, RenderKind, RenderTask};
//!
//! let coordinator = RenderCoordinator::new(Arc::new(DefaultRenderer::new()), 2, 8).unwrap();
//! let task = RenderTask::new(0, "# Hi", RenderKind::Markdown, RenderContext::new("/docs", "hi.md"));
//! let outcomes = coordinator.render_batch(vec![task]);
//! assert!(outcomes[0].result.as_ref().unwrap().contains("<h1>Hi</h1>"));
//! ```

mod coordinator;
mod document;
mod error;
mod renderer;
mod template;

pub use coordinator::{RenderCoordinator, RenderOutcome, RenderTask};
pub use document::{DocumentMeta, ParsedDocument, parse_document};
pub use error::RenderError;
pub use quire_source::RenderKind;
pub use renderer::{DefaultRenderer, RenderContext, Renderer};
pub use template::{BUILTIN_TEMPLATE, PageContext, Template, Templates};
