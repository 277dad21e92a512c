// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redis backend.
//!
//! Text values are stored as Redis strings, maps as hashes. TTLs are applied
//! in the same `MULTI`/`EXEC` transaction as the write.

use std::collections::BTreeMap;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Client, RedisError};
use async_trait::async_trait;

use super::{KvBackend, StoreError, StoreValue};

/// Redis-backed key/value store sharing one multiplexed connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Open a managed connection to `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { conn })
    }
}

/// Classify a Redis error: connection problems are retryable.
fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

/// TTL in milliseconds, at least one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl KvBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        let mut conn = self.conn.clone();
        let kind: String = ::redis::cmd("TYPE")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        match kind.as_str() {
            "none" => Ok(None),
            "string" => {
                let value: Option<String> = ::redis::cmd("GET")
                    .arg(key)
                    .query_async(&mut conn)
                    .await
                    .map_err(map_redis_error)?;
                Ok(value.map(StoreValue::Text))
            }
            "hash" => {
                let map: BTreeMap<String, String> = ::redis::cmd("HGETALL")
                    .arg(key)
                    .query_async(&mut conn)
                    .await
                    .map_err(map_redis_error)?;
                // The key may have expired between TYPE and HGETALL
                Ok((!map.is_empty()).then_some(StoreValue::Map(map)))
            }
            other => Err(StoreError::Backend(format!(
                "key {key} holds unsupported redis type {other}"
            ))),
        }
    }

    async fn set(&self, key: &str, value: &StoreValue, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut pipe = ::redis::pipe();
        pipe.atomic();

        match value {
            StoreValue::Text(text) => {
                let cmd = pipe.cmd("SET").arg(key).arg(text);
                if let Some(ttl) = ttl {
                    cmd.arg("PX").arg(ttl_millis(ttl));
                }
                cmd.ignore();
            }
            StoreValue::Map(map) => {
                pipe.cmd("DEL").arg(key).ignore();
                if !map.is_empty() {
                    let cmd = pipe.cmd("HSET").arg(key);
                    for (field, item) in map {
                        cmd.arg(field).arg(item);
                    }
                    cmd.ignore();
                    if let Some(ttl) = ttl {
                        pipe.cmd("PEXPIRE").arg(key).arg(ttl_millis(ttl)).ignore();
                    }
                }
            }
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let updated: i64 = ::redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(updated == 1)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = ::redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}
