//! Post models
//!
//! Two distinct shapes for the two queries: `PostSummary` carries the raw
//! Markdown body for listings, `RenderedPost` carries sanitized HTML for
//! the detail view. The raw front-matter map never reaches either.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Words per minute assumed for the read-time estimate
const READ_WPM: usize = 200;

/// A post as it appears in the index listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// URL-friendly identifier, derived from the filename
    pub slug: String,

    /// Original source filename, kept for diagnostics
    pub filename: String,

    /// Display title, validated and non-empty
    pub title: String,

    /// Optional short summary
    pub summary: Option<String>,

    /// Post tags (at most ten)
    pub tags: Vec<String>,

    /// Resolved publication timestamp
    pub date: DateTime<Local>,

    /// Raw Markdown body
    pub raw: String,

    /// Whitespace-delimited token count of the raw body
    pub word_count: usize,

    /// Estimated reading time in minutes
    pub read_time: usize,
}

/// A fully rendered post for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPost {
    pub slug: String,
    pub filename: String,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub date: DateTime<Local>,

    /// Rendered, sanitized, image-optimized HTML
    pub content: String,

    /// Table-of-contents fragment
    pub toc: String,

    pub word_count: usize,
    pub read_time: usize,
}

/// Count whitespace-delimited tokens in a Markdown body.
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

/// Reading time in minutes, never below one.
pub fn read_time(words: usize) -> usize {
    (words / READ_WPM).max(1)
}
