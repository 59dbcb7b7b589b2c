//! Text normalization for indexing.

use std::sync::LazyLock;

use regex::Regex;

const MIN_TOKEN_CHARS: usize = 2;
const MAX_TOKEN_CHARS: usize = 50;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "do", "does", "for",
    "from", "had", "has", "have", "he", "her", "his", "how", "if", "in", "into", "is", "it", "its",
    "no", "not", "of", "on", "or", "our", "she", "so", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "to", "was", "we", "were", "what",
    "when", "where", "which", "who", "why", "will", "with", "you", "your",
];

static FENCED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?(?:```|\z)|~~~.*?(?:~~~|\z)").unwrap());

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").unwrap());

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap());

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^\]|]*\|)?([^\]]*)\]\]").unwrap());

static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A\u{feff}?---\r?\n.*?\r?\n---[ \t]*(?:\r?\n|\z)").unwrap());

static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[#*_>~|=\[\]{}()!`]+").unwrap());

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Reduce marked-up source to plain words.
///
/// Frontmatter, code blocks, inline code and HTML tags are removed; link
/// syntax keeps only the link text; remaining markup characters become
/// spaces and whitespace is collapsed.
#[must_use]
pub fn plain_text(raw: &str) -> String {
    let text = FRONTMATTER_RE.replace(raw, "");
    let text = FENCED_CODE_RE.replace_all(&text, " ");
    let text = INLINE_CODE_RE.replace_all(&text, " ");
    let text = HTML_TAG_RE.replace_all(&text, " ");
    let text = WIKI_LINK_RE.replace_all(&text, "$1");
    let text = MD_LINK_RE.replace_all(&text, "$1");
    let text = MARKUP_RE.replace_all(&text, " ");
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Split text into index tokens.
///
/// Tokens are lowercase, split on whitespace and hyphens, and stripped of
/// surrounding punctuation. Tokens shorter than 2 or longer than 50
/// characters, numbers and stop words are dropped.
#[must_use]
pub fn tokenize(raw: &str) -> Vec<String> {
    plain_text(raw)
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| keep_token(t))
        .map(str::to_owned)
        .collect()
}

fn keep_token(token: &str) -> bool {
    let len = token.chars().count();
    (MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&len)
        && !token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && !is_stop_word(token)
}

/// Whether a lowercase word is ignored by the index.
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let raw = "---\ntitle: X\n---\n# Heading\n\nSee [the guide](guide.md) and [[api|API docs]].\n\n```rust\nlet hidden = 1;\n```\n<b>bold</b> `code` **strong**";

        assert_eq!(
            plain_text(raw),
            "Heading See the guide and API docs. bold strong"
        );
    }

    #[test]
    fn test_tokenize_filters() {
        let tokens = tokenize("The Quick-Brown fox, 2024 a x jumped! over_the_dog");

        assert_eq!(tokens, vec!["quick", "brown", "fox", "jumped", "over", "dog"]);
    }

    #[test]
    fn test_tokenize_drops_long_tokens() {
        let long = "a".repeat(51);
        let ok = "b".repeat(50);
        let tokens = tokenize(&format!("{long} {ok}"));
        assert_eq!(tokens, vec![ok]);
    }

    #[test]
    fn test_tokenize_ignores_code() {
        assert_eq!(tokenize("Use `secret_fn` here\n```\ncompile me\n```"), vec!["use", "here"]);
    }
}
