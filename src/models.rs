// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Wire shapes of the method endpoint. Incoming envelopes are validated by
//! the schema engine in [`crate::schema`], not by serde; the request types
//! here exist for OpenAPI documentation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Success response body: `{"response": ..., "code": 200}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SuccessBody {
    /// Method result payload.
    #[schema(value_type = Object)]
    pub response: Value,
    /// Always 200.
    pub code: u16,
}

impl SuccessBody {
    pub fn ok(response: Value) -> Self {
        Self { response, code: 200 }
    }
}

/// Request envelope posted to `/method`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MethodEnvelope {
    /// Caller account, part of the token formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Caller login. `admin` selects the admin token formula.
    pub login: String,
    /// Hex SHA-512 credential digest.
    pub token: String,
    /// `online_score` or `client_interests`.
    pub method: String,
    /// Method arguments ([`OnlineScoreArguments`] or [`ClientInterestsArguments`]).
    #[schema(value_type = Object)]
    pub arguments: Value,
}

/// Arguments of `online_score`. At least one pair must be present:
/// (phone, email), (first_name, last_name) or (gender, birthday).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OnlineScoreArguments {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Must contain exactly one `@`.
    pub email: Option<String>,
    /// 11 digits starting with 7.
    pub phone: Option<String>,
    /// `dd.mm.yyyy`, at most 70 years ago.
    pub birthday: Option<String>,
    /// 0 (unknown), 1 (male) or 2 (female).
    pub gender: Option<u8>,
}

/// Arguments of `client_interests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ClientInterestsArguments {
    pub client_ids: Vec<i64>,
    /// `dd.mm.yyyy`.
    pub date: Option<String>,
}

/// `online_score` result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreResponse {
    #[schema(value_type = f64)]
    pub score: Value,
}
