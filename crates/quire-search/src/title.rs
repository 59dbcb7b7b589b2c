//! Title/path index (`search-index.json`).

use serde::{Deserialize, Serialize};

use crate::SearchDocument;
use crate::tokenize::plain_text;

/// Characters of plain text kept as the entry snippet.
pub const SNIPPET_CHARS: usize = 200;

const EXACT_TITLE: u32 = 100;
const PREFIX_TITLE: u32 = 75;
const SUBSTRING_TITLE: u32 = 50;
const PATH_MATCH: u32 = 25;
const WORD_MATCH: u32 = 10;
const TITLE_WORD_BONUS: u32 = 5;

/// One document in the title index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleEntry {
    /// Display title.
    pub title: String,
    /// Extensionless site path.
    pub path: String,
    /// Link target.
    pub url: String,
    /// Plain-text snippet of the document.
    pub content: String,
}

impl TitleEntry {
    /// Score this entry against a query, `None` when it does not match.
    ///
    /// Every query word must occur in the title or the path. The whole query
    /// then scores by tier (exact title, title prefix, title substring, path
    /// substring, word match) plus a bonus per query word found in the title.
    #[must_use]
    pub fn score(&self, query: &str) -> Option<u32> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let title = self.title.to_lowercase();
        let path = self.path.to_lowercase();

        let words: Vec<&str> = query.split_whitespace().collect();
        if !words
            .iter()
            .all(|w| title.contains(w) || path.contains(w))
        {
            return None;
        }

        let tier = if title == query {
            EXACT_TITLE
        } else if title.starts_with(&query) {
            PREFIX_TITLE
        } else if title.contains(&query) {
            SUBSTRING_TITLE
        } else if path.contains(&query) {
            PATH_MATCH
        } else {
            WORD_MATCH
        };
        let bonus = words.iter().filter(|w| title.contains(**w)).count();
        Some(tier + TITLE_WORD_BONUS * u32::try_from(bonus).unwrap_or(u32::MAX / TITLE_WORD_BONUS))
    }
}

/// All documents, ordered by path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleIndex {
    entries: Vec<TitleEntry>,
}

impl TitleIndex {
    /// Build entries for every document.
    #[must_use]
    pub fn build(documents: &[SearchDocument]) -> Self {
        let mut entries: Vec<TitleEntry> = documents.iter().map(entry_for).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Self { entries }
    }

    /// Insert or replace the entry of one document.
    pub fn upsert(&mut self, document: &SearchDocument) {
        let entry = entry_for(document);
        match self.entries.binary_search_by(|e| e.path.cmp(&entry.path)) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Remove the entry with this path.
    pub fn remove(&mut self, path: &str) {
        self.entries.retain(|e| e.path != path);
    }

    /// Entry by site path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&TitleEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[TitleEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_for(doc: &SearchDocument) -> TitleEntry {
    TitleEntry {
        title: doc.title.clone(),
        path: doc.path.clone(),
        url: doc.url.clone(),
        content: plain_text(&doc.raw_content)
            .chars()
            .take(SNIPPET_CHARS)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(title: &str, path: &str) -> TitleEntry {
        TitleEntry {
            title: title.to_owned(),
            path: path.to_owned(),
            url: format!("{path}.html"),
            content: String::new(),
        }
    }

    #[test]
    fn test_score_tiers() {
        let exact = entry("Foo", "/x").score("foo").unwrap();
        let prefix = entry("Foobar", "/x").score("foo").unwrap();
        let substring = entry("Barfoo", "/x").score("foo").unwrap();
        let path = entry("Other", "/foo/x").score("foo").unwrap();

        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > path);
        assert_eq!(entry("Bar", "/x").score("foo"), None);
        assert_eq!(entry("Bar", "/x").score("  "), None);
    }

    #[test]
    fn test_all_words_required() {
        let e = entry("Install guide", "/setup/install");
        assert!(e.score("install setup").is_some());
        assert!(e.score("install missing").is_none());
    }

    #[test]
    fn test_title_word_bonus() {
        let both = entry("Server install", "/a").score("install server").unwrap();
        let one = entry("Install", "/server").score("install server").unwrap();
        assert!(both > one);
    }

    #[test]
    fn test_build_sorted_with_snippet() {
        let long_body = format!("# Title\n\n{}", "word ".repeat(100));
        let index = TitleIndex::build(&[
            SearchDocument::new("/b", "/b.html", "B", "plain"),
            SearchDocument::new("/a", "/a.html", "A", long_body),
        ]);

        assert_eq!(index.entries()[0].path, "/a");
        assert_eq!(index.entries()[0].content.chars().count(), SNIPPET_CHARS);
        assert!(index.entries()[0].content.starts_with("Title word"));
        assert_eq!(index.get("/b").unwrap().content, "plain");
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut index = TitleIndex::build(&[SearchDocument::new("/a", "/a.html", "A", "")]);

        index.upsert(&SearchDocument::new("/a", "/a.html", "A2", ""));
        index.upsert(&SearchDocument::new("/0", "/0.html", "Zero", ""));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("/a").unwrap().title, "A2");
        assert_eq!(index.entries()[0].path, "/0");

        index.remove("/a");
        assert!(index.get("/a").is_none());
    }
}
