//! Cache module
//!
//! Two bounded, time-expiring in-process caches sit between the query
//! surface and the content repository: one for the aggregate post
//! listing (cheap to rebuild, short TTL) and one for individually
//! rendered posts (render + sanitize cost, longer TTL). An optional
//! shared tier is consulted first when configured; its failures are
//! never allowed to surface.

pub mod shared;

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::content::{PostSummary, RenderedPost};
pub use shared::{HttpSharedCache, SharedCache};

/// Key for the aggregate listing in both cache tiers
const ALL_POSTS_KEY: &str = "blog:posts:all";

fn post_key(slug: &str) -> String {
    format!("blog:post:{}", slug)
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A bounded LRU cache whose entries expire after a fixed TTL.
///
/// Expired entries are dropped on read; eviction beyond that is the
/// LRU policy of the backing map.
pub struct TtlCache<K: Hash + Eq, V: Clone> {
    inner: LruCache<K, Entry<V>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { inner: LruCache::new(capacity), ttl }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.inner.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.pop(key);
        }
        None
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.inner.put(key, Entry { value, inserted_at: Instant::now() });
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Cache service wrapping the content repository queries.
///
/// Constructed once at startup with its configuration and an optional
/// shared backend; callers hold it behind an `Arc`. A race between a
/// read and `clear` at worst causes one extra recompute.
pub struct CacheService {
    listing: Mutex<TtlCache<String, Vec<PostSummary>>>,
    posts: Mutex<TtlCache<String, RenderedPost>>,
    list_ttl: Duration,
    post_ttl: Duration,
    shared: Option<Box<dyn SharedCache>>,
}

impl CacheService {
    pub fn new(config: &CacheConfig, shared: Option<Box<dyn SharedCache>>) -> Self {
        let list_ttl = Duration::from_secs(config.list_ttl_secs);
        let post_ttl = Duration::from_secs(config.post_ttl_secs);
        Self {
            listing: Mutex::new(TtlCache::new(list_ttl, config.list_capacity)),
            posts: Mutex::new(TtlCache::new(post_ttl, config.post_capacity)),
            list_ttl,
            post_ttl,
            shared,
        }
    }

    /// The post listing, computed through `load` on a cache miss.
    pub fn list_posts<F>(&self, load: F) -> Vec<PostSummary>
    where
        F: FnOnce() -> Vec<PostSummary>,
    {
        let key = ALL_POSTS_KEY.to_string();

        if let Some(posts) = self.shared_get::<Vec<PostSummary>>(&key) {
            tracing::debug!("post listing served from shared cache");
            return posts;
        }
        if let Some(posts) = lock(&self.listing).get(&key) {
            tracing::debug!("post listing served from in-process cache");
            return posts;
        }

        let posts = load();
        lock(&self.listing).insert(key.clone(), posts.clone());
        self.shared_set(&key, &posts, self.list_ttl);
        posts
    }

    /// A rendered post by slug, computed through `load` on a cache miss.
    /// Absent posts are not cached.
    pub fn get_post<F>(&self, slug: &str, load: F) -> Option<RenderedPost>
    where
        F: FnOnce() -> Option<RenderedPost>,
    {
        let key = post_key(slug);

        if let Some(post) = self.shared_get::<RenderedPost>(&key) {
            tracing::debug!("post {:?} served from shared cache", slug);
            return Some(post);
        }
        if let Some(post) = lock(&self.posts).get(&key) {
            tracing::debug!("post {:?} served from in-process cache", slug);
            return Some(post);
        }

        let post = load()?;
        lock(&self.posts).insert(key.clone(), post.clone());
        self.shared_set(&key, &post, self.post_ttl);
        Some(post)
    }

    /// Empty both in-process caches and flush the shared tier.
    /// Idempotent.
    pub fn clear(&self) {
        lock(&self.listing).clear();
        lock(&self.posts).clear();
        if let Some(shared) = &self.shared {
            shared.flush();
        }
        tracing::info!("caches cleared");
    }

    fn shared_get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.shared.as_ref()?.get(key)?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("discarding undecodable shared cache entry {:?}: {}", key, e);
                None
            }
        }
    }

    fn shared_set<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        match serde_json::to_string(value) {
            Ok(text) => shared.set(key, &text, ttl),
            Err(e) => tracing::warn!("cannot serialize cache entry {:?}: {}", key, e),
        }
    }
}

/// Mutex poisoning only happens if a panic escaped while holding the
/// lock; the cached data itself stays valid, so keep serving it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(list_ttl: u64, post_ttl: u64) -> CacheConfig {
        CacheConfig {
            list_ttl_secs: list_ttl,
            list_capacity: 100,
            post_ttl_secs: post_ttl,
            post_capacity: 50,
        }
    }

    fn summary(slug: &str) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            filename: format!("{slug}.md"),
            title: slug.to_string(),
            summary: None,
            tags: vec![],
            date: Local::now(),
            raw: "body".to_string(),
            word_count: 1,
            read_time: 1,
        }
    }

    fn rendered(slug: &str) -> RenderedPost {
        RenderedPost {
            slug: slug.to_string(),
            filename: format!("{slug}.md"),
            title: slug.to_string(),
            summary: None,
            tags: vec![],
            date: Local::now(),
            content: "<p>body</p>".to_string(),
            toc: String::new(),
            word_count: 1,
            read_time: 1,
        }
    }

    #[test]
    fn test_listing_cached_within_ttl() {
        let service = CacheService::new(&config(600, 1200), None);
        let calls = AtomicUsize::new(0);

        let load = || {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![summary("a")]
        };

        let first = service.list_posts(load);
        let second = service.list_posts(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![summary("a")]
        });

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listing_recomputed_after_expiry() {
        let service = CacheService::new(&config(0, 1200), None);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            service.list_posts(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![summary("a")]
            });
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_post_cache_and_absent_not_cached() {
        let service = CacheService::new(&config(600, 1200), None);
        let calls = AtomicUsize::new(0);

        assert!(service
            .get_post("ghost", || {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            })
            .is_none());
        assert!(service
            .get_post("ghost", || {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            })
            .is_none());
        // Misses are recomputed every time
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let post = service.get_post("real", || Some(rendered("real"))).unwrap();
        let again = service
            .get_post("real", || panic!("should be cached"))
            .unwrap();
        assert_eq!(post, again);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let service = CacheService::new(&config(600, 1200), None);
        let calls = AtomicUsize::new(0);

        service.list_posts(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![]
        });
        service.clear();
        service.clear(); // idempotent
        service.list_posts(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![]
        });

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ttl_cache_capacity_evicts() {
        let mut cache: TtlCache<String, usize> = TtlCache::new(Duration::from_secs(60), 3);
        for i in 0..5 {
            cache.insert(format!("k{i}"), i);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&"k0".to_string()).is_none());
        assert_eq!(cache.get(&"k4".to_string()), Some(4));
    }

    /// Shared backend fake recording traffic
    #[derive(Default)]
    struct FakeShared {
        store: Mutex<HashMap<String, String>>,
        gets: AtomicUsize,
    }

    impl SharedCache for FakeShared {
        fn get(&self, key: &str) -> Option<String> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.store.lock().unwrap().get(key).cloned()
        }
        fn set(&self, key: &str, value: &str, _ttl: Duration) {
            self.store.lock().unwrap().insert(key.to_string(), value.to_string());
        }
        fn flush(&self) {
            self.store.lock().unwrap().clear();
        }
    }

    /// Shared backend that always fails
    struct BrokenShared;

    impl SharedCache for BrokenShared {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) {}
        fn flush(&self) {}
    }

    #[test]
    fn test_shared_tier_hit_bypasses_loader() {
        let shared = Box::<FakeShared>::default();
        let posts = vec![summary("warm")];
        shared.set(ALL_POSTS_KEY, &serde_json::to_string(&posts).unwrap(), Duration::from_secs(60));

        let service = CacheService::new(&config(600, 1200), Some(shared));
        let result = service.list_posts(|| panic!("loader must not run"));
        assert_eq!(result[0].slug, "warm");
    }

    #[test]
    fn test_shared_tier_populated_on_miss() {
        let service = CacheService::new(&config(600, 1200), Some(Box::<FakeShared>::default()));
        service.get_post("a", || Some(rendered("a")));

        // A second service sharing the same backend would see the entry;
        // here it is enough that the local path still works.
        let again = service.get_post("a", || panic!("cached")).unwrap();
        assert_eq!(again.slug, "a");
    }

    #[test]
    fn test_broken_shared_tier_is_harmless() {
        let service = CacheService::new(&config(600, 1200), Some(Box::new(BrokenShared)));
        let posts = service.list_posts(|| vec![summary("a")]);
        assert_eq!(posts.len(), 1);
        let posts = service.list_posts(|| panic!("in-process cache should hit"));
        assert_eq!(posts.len(), 1);
        service.clear();
    }

    #[test]
    fn test_undecodable_shared_entry_discarded() {
        let shared = Box::<FakeShared>::default();
        shared.set(ALL_POSTS_KEY, "not json at all", Duration::from_secs(60));

        let service = CacheService::new(&config(600, 1200), Some(shared));
        let posts = service.list_posts(|| vec![summary("fresh")]);
        assert_eq!(posts[0].slug, "fresh");
    }
}
