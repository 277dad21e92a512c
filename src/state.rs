// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::store::{MemoryBackend, RedisBackend, Store, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(store: Store, auth: Authenticator) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
        }
    }

    /// Build the state from configuration, connecting to Redis if configured.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let retry = config.retry_policy();
        let store = match &config.redis_url {
            Some(url) => {
                let backend = retry.run("connect", || RedisBackend::connect(url)).await?;
                Store::new(backend, retry)
            }
            None => Store::new(MemoryBackend::new(config.cache_capacity), retry),
        };
        tracing::info!(backend = store.backend_name(), "Store initialized");

        let auth = Authenticator::new(config.salt.clone(), config.admin_salt.clone());
        Ok(Self::new(store, auth))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Store::default(), Authenticator::default())
    }
}
