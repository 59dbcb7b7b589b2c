//! Render errors.

use quire_source::RenderKind;

/// Failure to render one document.
///
/// None of these abort a build: the orchestrator turns them into per-file
/// error records.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The markup could not be rendered.
    #[error("{kind} render failed: {message}")]
    Markup {
        /// Kind of document.
        kind: RenderKind,
        /// Renderer message.
        message: String,
    },

    /// The renderer panicked.
    #[error("renderer panicked: {0}")]
    Panicked(String),

    /// The renderer has no implementation for this kind.
    #[error("no renderer for {0} documents")]
    Unsupported(RenderKind),

    /// A template named in frontmatter does not exist.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The lane pool could not be created.
    #[error("failed to create render pool: {0}")]
    Pool(String),

    /// A lane finished without reporting a result.
    #[error("render lane dropped task")]
    Lost,
}
