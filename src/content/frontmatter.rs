//! Front-matter parsing
//!
//! Posts begin with an optional YAML block delimited by `---` lines.
//! The block is parsed into a loosely-typed key-value map; coercion into
//! typed metadata happens in the validator, never here.

use std::collections::HashMap;
use thiserror::Error;

/// Raw front-matter: whatever keys the YAML block carried
pub type RawFrontMatter = HashMap<String, serde_yaml::Value>;

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("invalid front-matter block: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Split a document into its front-matter map and Markdown body.
///
/// Returns `(front_matter, body)`. A document without a leading `---`
/// block yields an empty map and the full content as body. A `---` block
/// that never closes is treated the same way. A closed block that is not
/// valid YAML is an error; callers decide whether to skip the file.
pub fn parse(content: &str) -> Result<(RawFrontMatter, &str), FrontMatterError> {
    let trimmed = content.trim_start_matches('\u{feff}');

    let Some(rest) = trimmed.strip_prefix("---") else {
        return Ok((RawFrontMatter::new(), trimmed));
    };
    let rest = rest.trim_start_matches(['\n', '\r']);

    let Some(end_pos) = rest.find("\n---") else {
        // No closing delimiter, treat as no front-matter
        return Ok((RawFrontMatter::new(), trimmed));
    };

    let yaml_block = &rest[..end_pos];
    let body = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

    if yaml_block.trim().is_empty() {
        return Ok((RawFrontMatter::new(), body));
    }

    let map: RawFrontMatter = serde_yaml::from_str(yaml_block)?;
    Ok((map, body))
}
