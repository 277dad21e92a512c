// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend Operations
//!
//! - [`get_score`] - weighted score over the supplied contact fields,
//!   memoized in the cache under `uid:<md5>`
//! - [`get_interests`] - interests list stored as a JSON array under
//!   `i:<client id>`

use std::time::Duration;

use chrono::NaiveDate;
use md5::{Digest, Md5};

use crate::schema::Gender;
use crate::store::{CacheRead, Store, StoreError};

/// How long a computed score stays cached.
pub const SCORE_TTL: Duration = Duration::from_secs(60 * 60);

/// Score returned to admin callers without touching the cache.
pub const ADMIN_SCORE: u32 = 42;

/// Cache key for a memoized score.
pub fn score_key(first_name: Option<&str>, last_name: Option<&str>, birthday: Option<NaiveDate>) -> String {
    let birthday = birthday
        .map(|date| date.format("%Y%m%d").to_string())
        .unwrap_or_default();
    let seed = format!(
        "{}{}{}",
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default(),
        birthday
    );
    format!("uid:{}", hex::encode(Md5::digest(seed.as_bytes())))
}

/// Store key holding the interests of `client_id`.
pub fn interests_key(client_id: i64) -> String {
    format!("i:{client_id}")
}

/// Compute the score for the given contact fields.
///
/// Cache failures never fail scoring: an unreachable cache is treated as a
/// miss, the score is recomputed and the write-back is skipped.
pub async fn get_score(
    store: &Store,
    phone: Option<&str>,
    email: Option<&str>,
    birthday: Option<NaiveDate>,
    gender: Option<Gender>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> f64 {
    let key = score_key(first_name, last_name, birthday);
    let cached = store.cache_get(&key).await;
    if let CacheRead::Hit(value) = &cached {
        match value.parse::<f64>() {
            Ok(score) => return score,
            Err(_) => tracing::warn!(key, value = %value, "ignoring malformed cached score"),
        }
    }

    let mut score = 0.0;
    if phone.is_some() {
        score += 1.5;
    }
    if email.is_some() {
        score += 1.5;
    }
    if birthday.is_some() && gender.is_some() {
        score += 1.5;
    }
    if first_name.is_some() && last_name.is_some() {
        score += 0.5;
    }

    // One retry cycle per request when the store is down
    if cached != CacheRead::Unavailable {
        store.cache_set(&key, score, SCORE_TTL).await;
    }
    score
}

/// Look up the interests of one client. Missing clients have none.
pub async fn get_interests(store: &Store, client_id: i64) -> Result<Vec<String>, StoreError> {
    let key = interests_key(client_id);
    match store.get_text(&key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Backend(format!("malformed interests under {key}: {e}"))),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{fast_retry, FlakyBackend};
    use crate::store::RetryPolicy;
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    fn birthday() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(1990, 1, 1)
    }

    #[test]
    fn score_key_is_md5_of_names_and_birthday() {
        let key = score_key(Some("a"), Some("b"), birthday());
        let expected = hex::encode(Md5::digest(b"ab19900101"));
        assert_eq!(key, format!("uid:{expected}"));
        assert_eq!(score_key(None, None, None), format!("uid:{}", hex::encode(Md5::digest(b""))));
    }

    #[tokio::test]
    async fn phone_and_email_score() {
        let store = Store::default();
        let score = get_score(&store, Some("79175002040"), Some("a@b.com"), None, None, None, None).await;
        assert_eq!(score, 3.0);
    }

    #[tokio::test]
    async fn full_profile_score() {
        let store = Store::default();
        let score = get_score(
            &store,
            Some("79175002040"),
            Some("a@b.com"),
            birthday(),
            Some(Gender::Male),
            Some("a"),
            Some("b"),
        )
        .await;
        assert_eq!(score, 5.0);
    }

    #[tokio::test]
    async fn score_is_memoized() {
        let store = Store::default();
        let key = score_key(Some("a"), Some("b"), None);
        let score = get_score(&store, None, None, None, None, Some("a"), Some("b")).await;
        assert_eq!(score, 0.5);
        assert_eq!(store.cache_get(&key).await, CacheRead::Hit("0.5".into()));

        store.set(&key, "9.5", None).await.unwrap();
        let cached = get_score(&store, None, None, None, None, Some("a"), Some("b")).await;
        assert_eq!(cached, 9.5);
    }

    #[tokio::test]
    async fn score_survives_unavailable_cache() {
        let backend = FlakyBackend::down();
        let calls = backend.calls();
        let policy = fast_retry();
        let store = Store::new(backend, policy);
        let score = get_score(&store, Some("79175002040"), Some("a@b.com"), None, None, None, None).await;
        assert_eq!(score, 3.0);
        // The read exhausts its retries and the write-back is skipped
        assert_eq!(calls.load(Ordering::SeqCst), policy.max_attempts());
    }

    #[tokio::test]
    async fn unavailable_cache_costs_one_retry_cycle() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let store = Store::new(FlakyBackend::down(), policy);
        let started = Instant::now();
        let score = get_score(&store, Some("79175002040"), Some("a@b.com"), None, None, None, None).await;
        let elapsed = started.elapsed();
        assert_eq!(score, 3.0);
        assert!(elapsed >= policy.max_wait());
        assert!(elapsed < policy.max_wait() * 2, "took {elapsed:?}");
    }

    #[tokio::test]
    async fn interests_are_decoded_from_json() {
        let store = Store::default();
        store
            .set(&interests_key(1), r#"["books","hi-tech"]"#, None)
            .await
            .unwrap();
        assert_eq!(get_interests(&store, 1).await.unwrap(), vec!["books", "hi-tech"]);
        assert!(get_interests(&store, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn interests_propagate_connection_errors() {
        let store = Store::new(FlakyBackend::down(), fast_retry());
        let err = get_interests(&store, 1).await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn malformed_interests_are_an_error() {
        let store = Store::default();
        store.set(&interests_key(3), "not json", None).await.unwrap();
        assert!(matches!(get_interests(&store, 3).await, Err(StoreError::Backend(_))));
    }
}
