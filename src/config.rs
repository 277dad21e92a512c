// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Every option can be given as a command-line flag or an environment
//! variable. The parsed [`Config`] is built once in `main` and passed down
//! explicitly.
//!
//! ## Options
//!
//! | Flag | Variable | Description | Default |
//! |------|----------|-------------|---------|
//! | `-H`, `--host` | `HOST` | Server bind address | `127.0.0.1` |
//! | `-p`, `--port` | `PORT` | Server bind port | `8080` |
//! | `-l`, `--log` | `LOG_FILE` | Append logs to this file | stderr |
//! | `--log-format` | `LOG_FORMAT` | `pretty` or `json` | `pretty` |
//! | `--redis-url` | `REDIS_URL` | Redis store URL | in-memory store |
//! | `--store-retries` | `STORE_RETRIES` | Attempts per store operation | `5` |
//! | `--store-retry-delay-secs` | `STORE_RETRY_DELAY_SECS` | Pause between attempts | `5` |
//! | `--cache-capacity` | `CACHE_CAPACITY` | Max keys in the in-memory store | `10000` |
//! | `--salt` | `AUTH_SALT` | Salt for account tokens | `Otus` |
//! | `--admin-salt` | `ADMIN_SALT` | Salt for admin tokens | `42` |
//! | | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::auth::token::{DEFAULT_ADMIN_SALT, DEFAULT_SALT};
use crate::store::memory::DEFAULT_CAPACITY;
use crate::store::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::store::RetryPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Scoring API server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "scoring-api", version, about = "Validating JSON scoring API")]
pub struct Config {
    /// Address to bind the HTTP server to.
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Append logs to this file instead of stderr.
    #[arg(short = 'l', long = "log", env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Redis URL. The in-memory store is used when unset.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Attempts per store operation before giving up.
    #[arg(long, env = "STORE_RETRIES", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub store_retries: u32,

    /// Seconds to wait between store attempts.
    #[arg(long, env = "STORE_RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub store_retry_delay_secs: u64,

    /// Maximum number of keys kept by the in-memory store.
    #[arg(long, env = "CACHE_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// Salt for account tokens.
    #[arg(long, env = "AUTH_SALT", default_value = DEFAULT_SALT, hide_env_values = true)]
    pub salt: String,

    /// Salt for admin tokens.
    #[arg(long, env = "ADMIN_SALT", default_value = DEFAULT_ADMIN_SALT, hide_env_values = true)]
    pub admin_salt: String,
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.store_retries,
            Duration::from_secs(self.store_retry_delay_secs),
        )
    }

    /// Log the effective configuration, without secrets.
    pub fn log(&self) {
        tracing::info!(
            host = %self.host,
            port = self.port,
            store = if self.redis_url.is_some() { "redis" } else { "memory" },
            store_retries = self.store_retries,
            store_retry_delay_secs = self.store_retry_delay_secs,
            cache_capacity = self.cache_capacity,
            "Server configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_file: None,
            log_format: LogFormat::Pretty,
            redis_url: None,
            store_retries: DEFAULT_MAX_ATTEMPTS,
            store_retry_delay_secs: DEFAULT_RETRY_DELAY.as_secs(),
            cache_capacity: DEFAULT_CAPACITY,
            salt: DEFAULT_SALT.to_string(),
            admin_salt: DEFAULT_ADMIN_SALT.to_string(),
        }
    }
}
