//! Slug generation from filenames

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use thiserror::Error;

lazy_static! {
    /// Characters that cannot appear in a slug at all
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s_-]").unwrap();
    /// Separator runs that collapse into a single hyphen
    static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
}

/// Errors from slug generation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("filename must be a non-empty string")]
    InvalidInput,
    #[error("generated slug is empty")]
    EmptySlug,
}

/// Derive a URL-friendly slug from a filename.
///
/// Takes the filename's stem, lower-cases it, drops everything outside
/// `[a-z0-9 _-]`, collapses separator runs into single hyphens, and trims
/// leading/trailing hyphens. Deterministic: the same filename always
/// yields the same slug.
pub fn make_slug(filename: &str) -> Result<String, SlugError> {
    if filename.is_empty() {
        return Err(SlugError::InvalidInput);
    }

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if stem.is_empty() {
        return Err(SlugError::InvalidInput);
    }

    let lowered = stem.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(&stripped, "-");
    let slug = joined.trim_matches('-').to_string();

    if slug.is_empty() {
        return Err(SlugError::EmptySlug);
    }

    Ok(slug)
}
