//! Optional shared cache tier
//!
//! A deployment with several workers can point them at a common HTTP
//! key-value store. The shared tier is strictly best-effort: every
//! failure is logged and swallowed, and the content pipeline never
//! depends on it.

use std::time::Duration;

/// A shared cache backend holding text values under string keys.
///
/// Implementations must never panic; errors are theirs to log.
pub trait SharedCache: Send + Sync {
    /// Fetch a value, or `None` on miss or any backend error.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a time-to-live. Best effort.
    fn set(&self, key: &str, value: &str, ttl: Duration);

    /// Drop all entries. Best effort.
    fn flush(&self);
}

/// Shared cache over a plain HTTP key-value endpoint:
/// `GET {base}/{key}`, `PUT {base}/{key}?ttl={secs}`, `DELETE {base}`.
pub struct HttpSharedCache {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSharedCache {
    /// Connect to the endpoint. Returns `None` when the client cannot be
    /// built; the caller then runs with in-process caching only.
    pub fn connect(base_url: &str) -> Option<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(2))
            .build();
        match client {
            Ok(client) => Some(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            }),
            Err(e) => {
                tracing::warn!("shared cache client unavailable: {}", e);
                None
            }
        }
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

impl SharedCache for HttpSharedCache {
    fn get(&self, key: &str) -> Option<String> {
        let response = self.client.get(self.key_url(key)).send();
        match response {
            Ok(resp) if resp.status().is_success() => resp.text().ok(),
            Ok(resp) => {
                tracing::debug!("shared cache miss for {:?}: {}", key, resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("shared cache get failed for {:?}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        let url = format!("{}?ttl={}", self.key_url(key), ttl.as_secs());
        if let Err(e) = self.client.put(url).body(value.to_string()).send() {
            tracing::warn!("shared cache set failed for {:?}: {}", key, e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.client.delete(&self.base_url).send() {
            tracing::warn!("shared cache flush failed: {}", e);
        }
    }
}
