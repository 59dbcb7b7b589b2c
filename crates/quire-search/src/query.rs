//! Combined title and full-text search.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::fulltext::FulltextIndex;
use crate::title::TitleIndex;

/// One search result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Document title.
    pub title: String,
    /// Extensionless site path.
    pub path: String,
    /// Link target.
    pub url: String,
    /// Title/path score, 0 for body-only matches.
    pub title_score: u32,
    /// Full-text score.
    pub text_score: u32,
}

impl SearchHit {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .title_score
            .cmp(&self.title_score)
            .then_with(|| other.text_score.cmp(&self.text_score))
            .then_with(|| self.title.cmp(&other.title))
    }
}

/// Search both indexes and return at most `limit` hits.
///
/// Hits are ordered by title score, then full-text score, then title. A
/// document matching only in its body always ranks below any title match.
#[must_use]
pub fn search(titles: &TitleIndex, fulltext: &FulltextIndex, query: &str, limit: usize) -> Vec<SearchHit> {
    let text_scores = fulltext.scores(query);
    let mut hits: HashMap<&str, SearchHit> = HashMap::new();

    for entry in titles.entries() {
        if let Some(score) = entry.score(query) {
            hits.insert(
                &entry.path,
                SearchHit {
                    title: entry.title.clone(),
                    path: entry.path.clone(),
                    url: entry.url.clone(),
                    title_score: score,
                    text_score: text_scores.get(&entry.path).copied().unwrap_or(0),
                },
            );
        }
    }

    for (path, score) in &text_scores {
        if hits.contains_key(path.as_str()) {
            continue;
        }
        // Postings may outlive a document until the next rebuild
        let Some(entry) = titles.get(path) else {
            continue;
        };
        hits.insert(
            &entry.path,
            SearchHit {
                title: entry.title.clone(),
                path: entry.path.clone(),
                url: entry.url.clone(),
                title_score: 0,
                text_score: *score,
            },
        );
    }

    let mut hits: Vec<SearchHit> = hits.into_values().collect();
    hits.sort_by(SearchHit::rank);
    hits.truncate(limit);
    hits
}
