// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU backend with per-entry TTL.
//!
//! Used when no Redis URL is configured and in tests.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::{KvBackend, StoreError, StoreValue};

/// Default number of keys kept before the least recently used is evicted.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Cached value plus its expiry deadline.
struct Entry {
    value: StoreValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// LRU-bounded in-memory key/value backend.
pub struct MemoryBackend {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryBackend {
    /// Create a backend holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
            // Expired, drop it
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &StoreValue, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.clone(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.lock()?.put(key.to_owned(), entry);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        let expired = match entries.get_mut(key) {
            None => return Ok(false),
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                false
            }
        };
        if expired {
            entries.pop(key);
        }
        Ok(!expired)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.pop(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn set_and_get() {
        let backend = MemoryBackend::default();
        assert!(backend.get("k").await.unwrap().is_none());

        backend.set("k", &StoreValue::from("v"), None).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(StoreValue::from("v")));
    }

    #[tokio::test]
    async fn stores_flat_maps() {
        let backend = MemoryBackend::default();
        let map: BTreeMap<String, String> = [("name".to_string(), "yeldos".to_string())].into();
        backend.set("m", &StoreValue::Map(map.clone()), None).await.unwrap();
        assert_eq!(backend.get("m").await.unwrap(), Some(StoreValue::Map(map)));
    }

    #[tokio::test]
    async fn ttl_expiry() {
        let backend = MemoryBackend::default();
        backend
            .set("k", &StoreValue::from("v"), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        assert!(backend.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expire_applies_to_existing_keys_only() {
        let backend = MemoryBackend::default();
        assert!(!backend.expire("missing", Duration::from_secs(1)).await.unwrap());

        backend.set("k", &StoreValue::from("v"), None).await.unwrap();
        assert!(backend.expire("k", Duration::from_millis(5)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryBackend::default();
        backend.set("k", &StoreValue::from("v"), None).await.unwrap();
        backend.delete("k").await.unwrap();
        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let backend = MemoryBackend::new(2);
        backend.set("a", &StoreValue::from("1"), None).await.unwrap();
        backend.set("b", &StoreValue::from("2"), None).await.unwrap();
        backend.get("a").await.unwrap();
        backend.set("c", &StoreValue::from("3"), None).await.unwrap();

        assert!(backend.get("a").await.unwrap().is_some());
        assert!(backend.get("b").await.unwrap().is_none());
        assert!(backend.get("c").await.unwrap().is_some());
    }
}
