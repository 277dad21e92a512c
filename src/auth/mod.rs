// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Callers authenticate with a bearer digest embedded in the request
//! envelope (`token`).
//!
//! ## Token Formulas
//!
//! - Admin (`login == "admin"`): `sha512(YYYYMMDDHH + admin_salt)` for the
//!   current UTC hour
//! - Everyone else: `sha512(account + login + salt)`
//!
//! Digests are lowercase hex. A mismatch is reported as a plain `false` so
//! the caller learns nothing about which credential part was wrong.

pub mod token;

pub use token::Authenticator;
