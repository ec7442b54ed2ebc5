//! mdblog: a small self-hosted blog server for Markdown files
//!
//! Posts are plain Markdown files with YAML front-matter in a content
//! directory. The crate loads, validates, and renders them through a
//! sanitizing pipeline and serves the results behind a TTL cache.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod server;

use anyhow::Result;
use std::path::Path;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Directory holding the Markdown posts
    pub content_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("blog.yml");

        let config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            config::BlogConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);

        Ok(Self { config, base_dir, content_dir })
    }
}
