// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The `/method` endpoint: envelope validation, authentication and dispatch.
//!
//! ## Pipeline
//!
//! 1. Decode the body as a JSON object (400 otherwise)
//! 2. Validate the envelope (422 with the invalid field names)
//! 3. Resolve the method name (422)
//! 4. Check the token (403)
//! 5. Validate the method arguments (422)
//! 6. Run the backend operation (200, or 500 on store failure)

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    error::{ApiError, ErrorBody},
    models::{MethodEnvelope, ScoreResponse, SuccessBody},
    schema::{MethodArguments, MethodRequest, Record, RequestSchema},
    scoring::{self, ADMIN_SCORE},
    state::AppState,
};

/// Prefix of the message listing invalid fields.
pub const INVALID_ARGS_MESSAGE: &str = "Invalid arguments: ";

/// Message for online score requests without a complete pair.
pub const INSUFFICIENT_ARG_PAIRS_MESSAGE: &str =
    "least required pairs: (phone, email), (first_name, last_name), (gender, birthday)";

/// Message for unknown method names.
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid Request";

const REQUEST_ID_HEADER: &str = "x-request-id";

const REDACTED: &str = "<redacted>";

/// Per-request observability context, logged once the response is built.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RequestContext {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nclients: Option<usize>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }
}

fn invalid_fields_error(record: &Record) -> ApiError {
    ApiError::unprocessable(format!(
        "{INVALID_ARGS_MESSAGE}{}",
        record.invalid_fields().join(", ")
    ))
}

/// Validate, authenticate and execute one decoded envelope.
pub async fn handle(
    raw: &Map<String, Value>,
    ctx: &mut RequestContext,
    state: &AppState,
) -> Result<Value, ApiError> {
    let request = MethodRequest::parse(raw);
    if !request.record().is_clean() {
        return Err(invalid_fields_error(request.record()));
    }
    let Some(method) = request.method() else {
        tracing::debug!(method = ?request.method_name(), "unknown method");
        return Err(ApiError::unprocessable(INVALID_REQUEST_MESSAGE));
    };
    ctx.method = Some(method.as_str());

    if !state.auth.check(&request) {
        return Err(ApiError::forbidden());
    }

    let empty = Map::new();
    let arguments = MethodArguments::parse(method, request.arguments().unwrap_or(&empty));
    if !arguments.record().is_clean() {
        return Err(invalid_fields_error(arguments.record()));
    }
    if !arguments.is_valid() {
        return Err(ApiError::unprocessable(INSUFFICIENT_ARG_PAIRS_MESSAGE));
    }

    match arguments {
        MethodArguments::OnlineScore(args) => {
            ctx.has = Some(args.record().present_fields().to_vec());
            let score = if request.is_admin() {
                json!(ADMIN_SCORE)
            } else {
                let gender = args.has_gender().then(|| args.gender());
                json!(
                    scoring::get_score(
                        &state.store,
                        args.phone(),
                        args.email(),
                        args.birthday(),
                        gender,
                        args.first_name(),
                        args.last_name(),
                    )
                    .await
                )
            };
            let body = ScoreResponse { score };
            Ok(json!(body))
        }
        MethodArguments::ClientsInterests(args) => {
            ctx.nclients = Some(args.client_ids().len());
            let mut interests = Map::new();
            for &client_id in args.client_ids() {
                let list = scoring::get_interests(&state.store, client_id).await?;
                interests.insert(client_id.to_string(), json!(list));
            }
            Ok(Value::Object(interests))
        }
    }
}

/// Decode a request body into a JSON object.
fn decode_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(e) => {
            tracing::debug!(error = %e, "malformed request body");
            Err(ApiError::from_status(axum::http::StatusCode::BAD_REQUEST))
        }
    }
}

/// Copy of the envelope safe to log: the bearer token is masked.
fn redacted(raw: &Map<String, Value>) -> Value {
    let mut copy = raw.clone();
    if let Some(token) = copy.get_mut("token") {
        *token = json!(REDACTED);
    }
    Value::Object(copy)
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

/// Method endpoint handler.
#[utoipa::path(
    post,
    path = "/method",
    request_body = MethodEnvelope,
    tag = "Method",
    responses(
        (status = 200, description = "Method result", body = SuccessBody),
        (status = 400, description = "Malformed JSON body", body = ErrorBody),
        (status = 403, description = "Token check failed", body = ErrorBody),
        (status = 422, description = "Invalid envelope or arguments", body = ErrorBody),
        (status = 500, description = "Store unavailable", body = ErrorBody)
    )
)]
pub async fn method(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let mut ctx = RequestContext::new(request_id(&headers));

    let result = match decode_body(&body) {
        Ok(raw) => {
            tracing::info!(request_id = %ctx.request_id, body = %redacted(&raw), "method request");
            handle(&raw, &mut ctx, &state).await
        }
        Err(e) => {
            tracing::info!(request_id = %ctx.request_id, body_len = body.len(), "method request");
            Err(e)
        }
    };

    match result {
        Ok(payload) => {
            tracing::info!(context = ?ctx, code = 200, "method response");
            Json(SuccessBody::ok(payload)).into_response()
        }
        Err(e) => {
            tracing::info!(context = ?ctx, code = e.status.as_u16(), error = %e.message, "method response");
            e.into_response()
        }
    }
}
