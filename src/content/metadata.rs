//! Metadata validation and coercion

use serde_yaml::Value;
use std::path::Path;

use super::frontmatter::RawFrontMatter;

const TITLE_MAX: usize = 100;
const SUMMARY_MAX: usize = 500;
const TAGS_MAX: usize = 10;

/// Validated post metadata, safe to render
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

/// Validate and sanitize front-matter metadata.
///
/// Degrades to safe defaults instead of failing: a missing or null title
/// is derived from the filename, non-string scalars are coerced, and a
/// tags field of any unexpected type becomes an empty list.
pub fn validate(raw: &RawFrontMatter, filename: &str) -> PostMeta {
    let title = match raw.get("title").and_then(coerce_string) {
        Some(t) if !t.is_empty() => t,
        _ => title_from_filename(filename),
    };
    let title: String = title.chars().take(TITLE_MAX).collect();
    // The title renders outside the sanitized-HTML pipeline, so strip
    // markup-significant characters here.
    let title: String = title.chars().filter(|c| !matches!(c, '<' | '>' | '"' | '\'')).collect();

    let summary = raw
        .get("summary")
        .and_then(coerce_string)
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(SUMMARY_MAX).collect());

    let tags = match raw.get("tags") {
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(TAGS_MAX)
            .collect(),
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(coerce_string)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(TAGS_MAX)
            .collect(),
        _ => Vec::new(),
    };

    PostMeta { title, summary, tags }
}

/// Derive a display title from a filename stem: separators become spaces,
/// each word is title-cased.
fn title_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled");

    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Coerce a YAML scalar to a string; sequences and mappings yield None.
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn raw(pairs: &[(&str, Value)]) -> RawFrontMatter {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_title_defaults_from_filename() {
        let meta = validate(&RawFrontMatter::new(), "my_post.md");
        assert_eq!(meta.title, "My Post");
    }

    #[test]
    fn test_title_defaults_from_hyphenated_filename() {
        let meta = validate(&RawFrontMatter::new(), "rust-for-BLOGGERS.md");
        assert_eq!(meta.title, "Rust For Bloggers");
    }

    #[test]
    fn test_title_strips_markup_characters() {
        let m = raw(&[("title", Value::String("<b>\"Click\" 'here'</b>".into()))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.title, "bClick here/b");
    }

    #[test]
    fn test_title_truncated() {
        let long = "a".repeat(300);
        let m = raw(&[("title", Value::String(long))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.title.chars().count(), 100);
    }

    #[test]
    fn test_numeric_title_coerced() {
        let m = raw(&[("title", Value::Number(42.into()))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.title, "42");
    }

    #[test]
    fn test_summary_truncated() {
        let m = raw(&[("summary", Value::String("s".repeat(900)))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.summary.unwrap().chars().count(), 500);
    }

    #[test]
    fn test_tags_from_comma_string() {
        let m = raw(&[("tags", Value::String("rust, web , blog".into()))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.tags, vec!["rust", "web", "blog"]);
    }

    #[test]
    fn test_tags_from_sequence_capped() {
        let seq: Vec<Value> = (0..15).map(|i| Value::String(format!("t{i}"))).collect();
        let m = raw(&[("tags", Value::Sequence(seq))]);
        let meta = validate(&m, "x.md");
        assert_eq!(meta.tags.len(), 10);
        assert_eq!(meta.tags[0], "t0");
    }

    #[test]
    fn test_tags_of_wrong_type_are_empty() {
        for v in [
            Value::Number(7.into()),
            Value::Bool(true),
            Value::Mapping(Default::default()),
            Value::Null,
        ] {
            let m = raw(&[("tags", v)]);
            let meta = validate(&m, "x.md");
            assert!(meta.tags.is_empty());
        }
    }

    #[test]
    fn test_never_panics_on_odd_inputs() {
        let m = raw(&[
            ("title", Value::Null),
            ("summary", Value::Sequence(vec![])),
            ("tags", Value::String(",,,".into())),
        ]);
        let meta = validate(&m, "Weird__name--file.md");
        assert_eq!(meta.title, "Weird Name File");
        assert!(meta.summary.is_none());
        assert!(meta.tags.is_empty());
    }
}
