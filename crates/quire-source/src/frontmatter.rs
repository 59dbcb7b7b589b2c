//! YAML frontmatter at the top of source documents.
//!
//! A frontmatter block is delimited by `---` lines and must start on the
//! first line of the file. Documents without one are all body.

use serde::de::DeserializeOwned;

/// Split a document into frontmatter text and body.
#[must_use]
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Parse frontmatter into `T`, falling back to `T::default()`.
///
/// Malformed YAML is logged and ignored. Returns the parsed value and the
/// body without the frontmatter block.
#[must_use]
pub fn parse_frontmatter<T: DeserializeOwned + Default>(content: &str) -> (T, &str) {
    let (yaml, body) = split_frontmatter(content);
    let Some(yaml) = yaml.filter(|y| !y.trim().is_empty()) else {
        return (T::default(), body);
    };
    match serde_yaml::from_str(yaml) {
        Ok(value) => (value, body),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed frontmatter");
            (T::default(), body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Meta {
        title: Option<String>,
    }

    #[test]
    fn test_split_frontmatter() {
        let (yaml, body) = split_frontmatter("---\ntitle: Hi\n---\n# Body\n");
        assert_eq!(yaml, Some("title: Hi\n"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just body\n---\n";
        let (yaml, body) = split_frontmatter(content);
        assert_eq!(yaml, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_unterminated_frontmatter_is_body() {
        let content = "---\ntitle: Hi\n";
        assert_eq!(split_frontmatter(content), (None, content));
    }

    #[test]
    fn test_parse_frontmatter() {
        let (meta, body): (Meta, _) = parse_frontmatter("---\ntitle: Hello\n---\ntext");
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(body, "text");
    }

    #[test]
    fn test_parse_malformed_frontmatter_defaults() {
        let (meta, body): (Meta, _) = parse_frontmatter("---\ntitle: [x\n---\ntext");
        assert_eq!(meta, Meta::default());
        assert_eq!(body, "text");
    }
}
