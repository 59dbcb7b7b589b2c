//! Search indexes for quire.
//!
//! Two indexes are built from the same [`SearchDocument`]s:
//!
//! - [`TitleIndex`]: one entry per document, matched by substring against
//!   title and path (`search-index.json`)
//! - [`FulltextIndex`]: an inverted index `word -> postings`, capped per word
//!   and updatable in place when only some documents changed
//!   (`fulltext-index.json`)
//!
//! [`search`] combines both: title matches always rank above body-only
//! matches.

mod fulltext;
mod query;
mod title;
mod tokenize;

pub use fulltext::{FulltextIndex, MAX_POSTINGS, Posting, TITLE_WEIGHT};
pub use query::{SearchHit, search};
pub use title::{SNIPPET_CHARS, TitleEntry, TitleIndex};
pub use tokenize::{is_stop_word, plain_text, tokenize};

/// A document fed to the indexes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchDocument {
    /// Extensionless site path (`/guide/start`).
    pub path: String,
    /// Link target (`/guide/start.html`).
    pub url: String,
    /// Display title.
    pub title: String,
    /// Source text, markup included.
    pub raw_content: String,
}

impl SearchDocument {
    /// Create a document.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        raw_content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            title: title.into(),
            raw_content: raw_content.into(),
        }
    }
}
