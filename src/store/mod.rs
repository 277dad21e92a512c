// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key/Value Store
//!
//! [`Store`] wraps a [`KvBackend`] with a bounded [`RetryPolicy`] and
//! exposes two flavours of access:
//!
//! | Access | Used by | On connection failure |
//! |--------|---------|-----------------------|
//! | `get` / `set` / `expire` / `delete` | interests lookup | `StoreError::Connection` after retries |
//! | `cache_get` / `cache_set` | score memoization | logged, reported as `CacheRead::Unavailable` |
//!
//! ## Backends
//!
//! - [`RedisBackend`] - shared Redis instance (production)
//! - [`MemoryBackend`] - in-process LRU with TTL (development, tests)

pub mod memory;
pub mod redis;
pub mod retry;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;
pub use self::retry::RetryPolicy;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A single attempt could not reach the backend. Retried.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The backend stayed unreachable for every retry attempt.
    #[error("store connection failed after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },
    /// Value cannot be stored (only text, numbers and flat maps are).
    #[error("unsupported value type: {0}")]
    UnsupportedValue(&'static str),
    /// Backend rejected the command or returned unexpected data.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Connection { .. }
        )
    }
}

/// A stored value: plain text or a flat string mapping.
///
/// Numbers are stored as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    Text(String),
    Map(BTreeMap<String, String>),
}

impl StoreValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoreValue::Text(text) => Some(text),
            StoreValue::Map(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            StoreValue::Text(text) => Some(text),
            StoreValue::Map(_) => None,
        }
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        StoreValue::Text(value.to_owned())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        StoreValue::Text(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        StoreValue::Text(value.to_string())
    }
}

impl From<f64> for StoreValue {
    fn from(value: f64) -> Self {
        StoreValue::Text(value.to_string())
    }
}

impl From<BTreeMap<String, String>> for StoreValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        StoreValue::Map(value)
    }
}

impl TryFrom<&Value> for StoreValue {
    type Error = StoreError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(StoreValue::Text(text.clone())),
            Value::Number(number) => Ok(StoreValue::Text(number.to_string())),
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| match item {
                    Value::String(text) => Ok((key.clone(), text.clone())),
                    Value::Number(number) => Ok((key.clone(), number.to_string())),
                    _ => Err(StoreError::UnsupportedValue("nested value")),
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(StoreValue::Map),
            Value::Array(_) => Err(StoreError::UnsupportedValue("array")),
            Value::Bool(_) => Err(StoreError::UnsupportedValue("bool")),
            Value::Null => Err(StoreError::UnsupportedValue("null")),
        }
    }
}

/// Raw key/value operations implemented by each backend.
///
/// Implementations report transient connection failures as
/// [`StoreError::Unavailable`] so [`Store`] can retry them.
#[async_trait]
pub trait KvBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError>;

    /// Write `value`, applying `ttl` atomically with the write.
    async fn set(&self, key: &str, value: &StoreValue, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Set a TTL on an existing key. Returns false when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Remove `key`. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Shared, retrying handle to the key/value backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
    retry: RetryPolicy,
}

impl Store {
    pub fn new(backend: impl KvBackend + 'static, retry: RetryPolicy) -> Self {
        Self {
            backend: Arc::new(backend),
            retry,
        }
    }

    /// In-memory store with the given capacity and no retry delay.
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(MemoryBackend::new(capacity), RetryPolicy::none())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        self.retry.run("get", || self.backend.get(key)).await
    }

    /// `get` for keys holding plain text.
    pub async fn get_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get(key).await? {
            Some(StoreValue::Text(text)) => Ok(Some(text)),
            Some(StoreValue::Map(_)) => Err(StoreError::Backend(format!(
                "key {key} holds a map, expected text"
            ))),
            None => Ok(None),
        }
    }

    pub async fn set(
        &self,
        key: &str,
        value: impl Into<StoreValue>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let value = value.into();
        self.retry
            .run("set", || self.backend.set(key, &value, ttl))
            .await
    }

    /// `set` for arbitrary JSON, rejecting values that cannot be stored.
    pub async fn set_json(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        let value = StoreValue::try_from(value)?;
        self.set(key, value, ttl).await
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.retry
            .run("expire", || self.backend.expire(key, ttl))
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.retry.run("delete", || self.backend.delete(key)).await
    }

    /// Single-attempt health probe.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }

    /// Cache read that never fails. A store failure is reported as
    /// [`CacheRead::Unavailable`] so callers can skip the write-back.
    pub async fn cache_get(&self, key: &str) -> CacheRead {
        match self.get_text(key).await {
            Ok(Some(value)) => CacheRead::Hit(value),
            Ok(None) => CacheRead::Miss,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed, treating as miss");
                CacheRead::Unavailable
            }
        }
    }

    /// Cache write that logs and drops failures.
    pub async fn cache_set(&self, key: &str, value: impl Into<StoreValue>, ttl: Duration) {
        if let Err(e) = self.set(key, value, Some(ttl)).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }
}

/// Outcome of [`Store::cache_get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRead {
    Hit(String),
    Miss,
    /// The store could not be reached after retrying.
    Unavailable,
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory(memory::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backend for exercising retry and degradation paths.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Fails the first `failures` calls with `Unavailable`, then delegates
    /// to an in-memory backend.
    pub struct FlakyBackend {
        failures: u32,
        calls: Arc<AtomicU32>,
        inner: MemoryBackend,
    }

    impl FlakyBackend {
        pub fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Arc::new(AtomicU32::new(0)),
                inner: MemoryBackend::default(),
            }
        }

        pub fn down() -> Self {
            Self::new(u32::MAX)
        }

        /// Shared call counter, readable after the backend moves into a `Store`.
        pub fn calls(&self) -> Arc<AtomicU32> {
            Arc::clone(&self.calls)
        }

        fn attempt(&self) -> Result<(), StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(StoreError::Unavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KvBackend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
            self.attempt()?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &StoreValue, ttl: Option<Duration>) -> Result<(), StoreError> {
            self.attempt()?;
            self.inner.set(key, value, ttl).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
            self.attempt()?;
            self.inner.expire(key, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.attempt()?;
            self.inner.delete(key).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.attempt()
        }
    }

    pub fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_millis(1))
    }
}
