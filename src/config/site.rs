//! Blog configuration (blog.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding the admin secret token
pub const ADMIN_TOKEN_ENV: &str = "MDBLOG_ADMIN_TOKEN";
/// Environment variable holding the shared cache endpoint
pub const SHARED_CACHE_URL_ENV: &str = "MDBLOG_SHARED_CACHE_URL";

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub description: String,

    // Content
    pub content_dir: String,
    pub highlight_theme: String,

    // Pagination
    pub per_page: usize,

    // Caching
    pub cache: CacheConfig,
}

/// TTLs and capacities for the two in-process caches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub list_ttl_secs: u64,
    pub list_capacity: usize,
    pub post_ttl_secs: u64,
    pub post_capacity: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: "A simple, file-based blog".to_string(),
            content_dir: "content/posts".to_string(),
            highlight_theme: "base16-ocean.dark".to_string(),
            per_page: 10,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: 600,
            list_capacity: 100,
            post_ttl_secs: 1200,
            post_capacity: 50,
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: BlogConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Admin token from the environment; absent means the cache-clear
    /// operation is always denied.
    pub fn admin_token() -> Option<String> {
        std::env::var(ADMIN_TOKEN_ENV).ok().filter(|t| !t.is_empty())
    }

    /// Shared cache endpoint from the environment; absent means
    /// in-process caching only.
    pub fn shared_cache_url() -> Option<String> {
        std::env::var(SHARED_CACHE_URL_ENV).ok().filter(|u| !u.is_empty())
    }
}
