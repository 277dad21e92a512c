// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scoring API - Validating JSON method gateway
//!
//! A single `/method` endpoint accepts an authenticated envelope naming one
//! of two methods, validates its arguments and answers from an expiring
//! key/value store.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - SHA-512 token checks
//! - `schema` - Declarative field validation for envelopes and arguments
//! - `scoring` - Score computation and interests lookup
//! - `store` - Key/value store with retry (Redis or in-memory LRU)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod scoring;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;
