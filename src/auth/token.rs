// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope token verification.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};

use crate::schema::MethodRequest;

/// Default salt for account tokens.
pub const DEFAULT_SALT: &str = "Otus";

/// Default salt for admin tokens.
pub const DEFAULT_ADMIN_SALT: &str = "42";

/// Hour window format used by admin tokens.
const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Derives expected tokens and checks them against the envelope.
#[derive(Debug, Clone)]
pub struct Authenticator {
    salt: String,
    admin_salt: String,
}

impl Authenticator {
    pub fn new(salt: impl Into<String>, admin_salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            admin_salt: admin_salt.into(),
        }
    }

    /// Check the envelope token against the current hour.
    pub fn check(&self, request: &MethodRequest) -> bool {
        self.check_at(request, Utc::now())
    }

    /// Check the envelope token as of `now`.
    pub fn check_at(&self, request: &MethodRequest, now: DateTime<Utc>) -> bool {
        let expected = self.expected_token(request, now);
        request.token() == Some(expected.as_str())
    }

    pub fn expected_token(&self, request: &MethodRequest, now: DateTime<Utc>) -> String {
        if request.is_admin() {
            self.admin_token(now)
        } else {
            self.account_token(
                request.account().unwrap_or_default(),
                request.login().unwrap_or_default(),
            )
        }
    }

    pub fn admin_token(&self, now: DateTime<Utc>) -> String {
        sha512_hex(&format!("{}{}", now.format(ADMIN_HOUR_FORMAT), self.admin_salt))
    }

    pub fn account_token(&self, account: &str, login: &str) -> String {
        sha512_hex(&format!("{account}{login}{}", self.salt))
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(DEFAULT_SALT, DEFAULT_ADMIN_SALT)
    }
}

fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RequestSchema;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn envelope(value: Value) -> MethodRequest {
        MethodRequest::parse(value.as_object().unwrap())
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap()
    }

    #[test]
    fn account_token_matches_sha512_hex() {
        let auth = Authenticator::default();
        let token = auth.account_token("horns&hoofs", "h&f");
        assert_eq!(token.len(), 128);
        assert_eq!(token, sha512_hex("horns&hoofsh&fOtus"));
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn non_admin_token_passes() {
        let auth = Authenticator::default();
        let token = auth.account_token("horns&hoofs", "h&f");
        let request = envelope(json!({"account": "horns&hoofs", "login": "h&f", "token": token}));
        assert!(auth.check(&request));
        assert!(auth.check_at(&request, noon()));
    }

    #[test]
    fn non_admin_wrong_token_fails() {
        let auth = Authenticator::default();
        let request = envelope(json!({
            "account": "horns&hoofs", "login": "h&f", "token": "super_unique_token"
        }));
        assert!(!auth.check(&request));
    }

    #[test]
    fn token_comparison_is_case_sensitive() {
        let auth = Authenticator::default();
        let token = auth.account_token("a", "b").to_uppercase();
        let request = envelope(json!({"account": "a", "login": "b", "token": token}));
        assert!(!auth.check(&request));
    }

    #[test]
    fn missing_account_counts_as_empty() {
        let auth = Authenticator::default();
        let token = auth.account_token("", "h&f");
        let request = envelope(json!({"login": "h&f", "token": token}));
        assert!(auth.check(&request));
    }

    #[test]
    fn admin_token_is_bound_to_the_hour() {
        let auth = Authenticator::default();
        let token = auth.admin_token(noon());
        assert_eq!(token, sha512_hex("202603141242"));

        let request = envelope(json!({"login": "admin", "token": token}));
        assert!(auth.check_at(&request, noon()));
        assert!(auth.check_at(&request, Utc.with_ymd_and_hms(2026, 3, 14, 12, 59, 59).unwrap()));
        assert!(!auth.check_at(&request, Utc.with_ymd_and_hms(2026, 3, 14, 13, 0, 0).unwrap()));
    }

    #[test]
    fn admin_with_account_token_fails() {
        let auth = Authenticator::default();
        let token = auth.account_token("acc", "admin");
        let request = envelope(json!({"account": "acc", "login": "admin", "token": token}));
        assert!(!auth.check_at(&request, noon()));
    }

    #[test]
    fn custom_salts_change_tokens() {
        let custom = Authenticator::new("pepper", "7");
        let default = Authenticator::default();
        assert_ne!(custom.account_token("a", "b"), default.account_token("a", "b"));
        assert_ne!(custom.admin_token(noon()), default.admin_token(noon()));
    }

    #[test]
    fn repeated_checks_are_deterministic() {
        let auth = Authenticator::default();
        let request = envelope(json!({"account": "x", "login": "y", "token": "z"}));
        let first = auth.expected_token(&request, noon());
        let second = auth.expected_token(&request, noon());
        assert_eq!(first, second);
    }
}
