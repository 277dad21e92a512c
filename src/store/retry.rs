// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded retry for store operations.

use std::future::Future;
use std::time::Duration;

use super::StoreError;

/// Default number of attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fixed-delay retry policy applied to connection failures.
///
/// Only [`StoreError::Unavailable`] is retried. Once the attempts are used
/// up the last failure is returned as [`StoreError::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn max_wait(&self) -> Duration {
        self.delay * (self.max_attempts - 1)
    }

    /// Run `attempt` until it succeeds, fails with a non-connection error,
    /// or the attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(StoreError::Unavailable(message)) => {
                    if tries >= self.max_attempts {
                        tracing::error!(
                            operation,
                            attempts = tries,
                            error = %message,
                            "store unavailable, giving up"
                        );
                        return Err(StoreError::Connection {
                            attempts: tries,
                            message,
                        });
                    }
                    tracing::warn!(
                        operation,
                        attempt = tries,
                        max_attempts = self.max_attempts,
                        error = %message,
                        "store unavailable, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    tries += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}
