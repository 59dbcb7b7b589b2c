//! Full-text inverted index.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::SearchDocument;
use crate::tokenize::tokenize;

/// Postings kept per word.
pub const MAX_POSTINGS: usize = 100;

/// Score of one title token; body tokens score 1.
pub const TITLE_WEIGHT: u32 = 10;

/// One `(document, score)` entry of a word's postings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document site path.
    #[serde(rename = "p")]
    pub path: String,
    /// Accumulated score.
    #[serde(rename = "s")]
    pub score: u32,
}

/// Inverted index: `word -> postings`, each list sorted by descending score
/// (path ascending on ties) and capped at [`MAX_POSTINGS`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FulltextIndex {
    words: BTreeMap<String, Vec<Posting>>,
}

impl FulltextIndex {
    /// Index every document from scratch.
    #[must_use]
    pub fn build(documents: &[SearchDocument]) -> Self {
        let mut index = Self::default();
        for doc in documents {
            index.add_document(doc);
        }
        index.finalize(None);
        tracing::debug!(
            documents = documents.len(),
            words = index.words.len(),
            "Built full-text index"
        );
        index
    }

    /// Re-index only `changed` documents and drop `removed` paths.
    ///
    /// Postings of every changed or removed document are removed, the
    /// changed documents are indexed again, and the affected words are
    /// re-sorted and re-capped. The postings of a changed document end up
    /// exactly as a full rebuild would produce them.
    pub fn update(&mut self, changed: &[SearchDocument], removed: &[String]) {
        let stale: HashSet<&str> = changed
            .iter()
            .map(|d| d.path.as_str())
            .chain(removed.iter().map(String::as_str))
            .collect();
        if stale.is_empty() {
            return;
        }

        let mut touched: HashSet<String> = HashSet::new();
        self.words.retain(|word, postings| {
            let before = postings.len();
            postings.retain(|p| !stale.contains(p.path.as_str()));
            if postings.len() != before {
                touched.insert(word.clone());
            }
            !postings.is_empty()
        });

        for doc in changed {
            touched.extend(self.add_document(doc));
        }
        self.finalize(Some(&touched));
        tracing::debug!(
            changed = changed.len(),
            removed = removed.len(),
            words = touched.len(),
            "Updated full-text index"
        );
    }

    /// Postings of one word.
    #[must_use]
    pub fn postings(&self, word: &str) -> &[Posting] {
        self.words.get(word).map_or(&[], Vec::as_slice)
    }

    /// Sum of scores per document for every token of `query`.
    #[must_use]
    pub fn scores(&self, query: &str) -> HashMap<String, u32> {
        let mut scores: HashMap<String, u32> = HashMap::new();
        for token in tokenize(query) {
            for posting in self.postings(&token) {
                *scores.entry(posting.path.clone()).or_default() += posting.score;
            }
        }
        scores
    }

    /// Every document path that still has at least one posting.
    #[must_use]
    pub fn documents(&self) -> BTreeSet<&str> {
        self.words
            .values()
            .flatten()
            .map(|p| p.path.as_str())
            .collect()
    }

    /// Number of indexed words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append unsorted postings for one document; returns the words touched.
    fn add_document(&mut self, doc: &SearchDocument) -> Vec<String> {
        let scores = document_scores(doc);
        let words: Vec<String> = scores.keys().cloned().collect();
        for (word, score) in scores {
            self.words.entry(word).or_default().push(Posting {
                path: doc.path.clone(),
                score,
            });
        }
        words
    }

    /// Sort and cap the given words (all words when `None`).
    fn finalize(&mut self, only: Option<&HashSet<String>>) {
        for (word, postings) in &mut self.words {
            if only.is_some_and(|set| !set.contains(word)) {
                continue;
            }
            postings.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
            postings.truncate(MAX_POSTINGS);
        }
    }
}

/// Per-word score of one document: title tokens weigh [`TITLE_WEIGHT`],
/// body tokens 1.
fn document_scores(doc: &SearchDocument) -> HashMap<String, u32> {
    let mut scores: HashMap<String, u32> = HashMap::new();
    for token in tokenize(&doc.title) {
        *scores.entry(token).or_default() += TITLE_WEIGHT;
    }
    for token in tokenize(&doc.raw_content) {
        *scores.entry(token).or_default() += 1;
    }
    scores
}
