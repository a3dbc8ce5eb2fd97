//! In-memory cache implementation using moka
//!
//! Values are stored as JSON so any serializable type can be cached. Each
//! entry carries its own TTL, enforced through a moka `Expiry` policy.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::{future::Cache, Expiry};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CacheEntry {
    /// JSON-serialized value
    data: Arc<String>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// Expires every entry after the TTL it was written with
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    /// TTL callers use when they have no better value
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// 10,000 entries, five minute default TTL
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self { cache, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Glob-style key matching: `*` matches any run of characters, `?` exactly one.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern: Vec<char> = pattern.chars().collect();
        let key: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern, &key)
    }

    fn glob_match(pattern: &[char], key: &[char]) -> bool {
        match pattern.split_first() {
            None => key.is_empty(),
            Some(('*', rest)) => {
                Self::glob_match(rest, key)
                    || (!key.is_empty() && Self::glob_match(pattern, &key[1..]))
            }
            Some(('?', rest)) => !key.is_empty() && Self::glob_match(rest, &key[1..]),
            Some((c, rest)) => key.first() == Some(c) && Self::glob_match(rest, &key[1..]),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Full scan; fine for the key counts an admin backend produces.
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache
            .set("posts:item:1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("posts:item:1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();
        let result: Option<String> = cache.get("missing").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("k", &1u32, Duration::from_secs(60)).await.unwrap();
        cache.delete("k").await.unwrap();
        let result: Option<u32> = cache.get("k").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_pattern_star() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("posts:list:1:10:all:all:", &1u32, ttl).await.unwrap();
        cache.set("posts:list:2:10:all:all:", &2u32, ttl).await.unwrap();
        cache.set("posts:item:7", &7u32, ttl).await.unwrap();

        cache.delete_pattern("posts:list:*").await.unwrap();

        assert_eq!(cache.get::<u32>("posts:list:1:10:all:all:").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("posts:list:2:10:all:all:").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("posts:item:7").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &1u32, Duration::from_secs(60)).await.unwrap();
        cache.set("b", &2u32, Duration::from_secs(60)).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get::<u32>("a").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let cache = MemoryCache::with_capacity_and_ttl(100, Duration::from_secs(3600));
        cache.set("short", &1u32, Duration::from_millis(20)).await.unwrap();
        cache.set("long", &2u32, Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.cache.run_pending_tasks().await;

        assert_eq!(cache.get::<u32>("short").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("long").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_overwrite_existing_key() {
        let cache = MemoryCache::new();
        cache.set("k", &"old", Duration::from_secs(60)).await.unwrap();
        cache.set("k", &"new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<String>("k").await.unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("posts:*", "posts:item:1"));
        assert!(MemoryCache::pattern_matches("posts:item:?", "posts:item:1"));
        assert!(!MemoryCache::pattern_matches("posts:item:?", "posts:item:12"));
        assert!(MemoryCache::pattern_matches("*", ""));
        assert!(!MemoryCache::pattern_matches("posts:list:*", "posts:item:1"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// A value written with a short TTL is readable at once and gone afterwards.
        #[test]
        fn prop_entries_expire_after_their_ttl(key in "[a-z]{1,10}", value in "[a-z]{1,100}") {
            tokio_test::block_on(async {
                let cache = MemoryCache::new();
                let ttl = Duration::from_millis(10);
                cache.set(&key, &value, ttl).await.unwrap();

                let fresh: Option<String> = cache.get(&key).await.unwrap();
                prop_assert_eq!(fresh, Some(value.clone()));

                tokio::time::sleep(Duration::from_millis(50)).await;
                cache.cache.run_pending_tasks().await;

                let stale: Option<String> = cache.get(&key).await.unwrap();
                prop_assert_eq!(stale, None);
                Ok(())
            })?;
        }
    }
}
