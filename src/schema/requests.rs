// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Concrete request schemas: the method envelope and the per-method
//! argument shapes.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::field::{Field, FieldKind, Gender};
use super::{Record, RequestSchema};

/// Login that switches authentication to the admin formula.
pub const ADMIN_LOGIN: &str = "admin";

/// Operations reachable through the method endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    OnlineScore,
    ClientsInterests,
}

impl Method {
    /// Resolve a method name. `clients_interests` is accepted as an alias.
    pub fn from_name(name: &str) -> Option<Method> {
        match name {
            "online_score" => Some(Method::OnlineScore),
            "client_interests" | "clients_interests" => Some(Method::ClientsInterests),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::OnlineScore => "online_score",
            Method::ClientsInterests => "client_interests",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Outer request envelope: credentials, method name and argument bag.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    record: Record,
}

impl RequestSchema for MethodRequest {
    const FIELDS: &'static [Field] = &[
        Field::optional("account", FieldKind::Char),
        Field::new("login", FieldKind::Char, true, true),
        Field::new("token", FieldKind::Char, true, true),
        Field::new("arguments", FieldKind::Arguments, true, true),
        Field::new("method", FieldKind::Char, true, false),
    ];

    fn from_record(record: Record) -> Self {
        Self { record }
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn is_valid(&self) -> bool {
        self.record.is_clean() && self.method().is_some()
    }
}

impl MethodRequest {
    pub fn account(&self) -> Option<&str> {
        self.record.text("account")
    }

    pub fn login(&self) -> Option<&str> {
        self.record.text("login")
    }

    pub fn token(&self) -> Option<&str> {
        self.record.text("token")
    }

    pub fn arguments(&self) -> Option<&Map<String, Value>> {
        self.record.arguments("arguments")
    }

    pub fn method_name(&self) -> Option<&str> {
        self.record.text("method")
    }

    /// The resolved operation, `None` for unknown or missing names.
    pub fn method(&self) -> Option<Method> {
        self.method_name().and_then(Method::from_name)
    }

    pub fn is_admin(&self) -> bool {
        self.login() == Some(ADMIN_LOGIN)
    }
}

// =============================================================================
// online_score
// =============================================================================

/// Arguments of the `online_score` method.
#[derive(Debug, Clone)]
pub struct OnlineScoreRequest {
    record: Record,
}

impl RequestSchema for OnlineScoreRequest {
    const FIELDS: &'static [Field] = &[
        Field::optional("first_name", FieldKind::Char),
        Field::optional("last_name", FieldKind::Char),
        Field::optional("email", FieldKind::Email),
        Field::optional("phone", FieldKind::Phone),
        Field::optional("birthday", FieldKind::BirthDate),
        Field::optional("gender", FieldKind::Gender),
    ];

    fn from_record(record: Record) -> Self {
        Self { record }
    }

    fn record(&self) -> &Record {
        &self.record
    }

    /// At least one of (phone, email), (first_name, last_name),
    /// (gender, birthday) must be fully present.
    fn is_valid(&self) -> bool {
        self.record.is_clean()
            && ((self.has_phone() && self.has_email())
                || (self.has_first_name() && self.has_last_name())
                || (self.has_gender() && self.has_birthday()))
    }
}

impl OnlineScoreRequest {
    pub fn first_name(&self) -> Option<&str> {
        self.record.text("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.record.text("last_name")
    }

    pub fn email(&self) -> Option<&str> {
        self.record.text("email")
    }

    pub fn phone(&self) -> Option<&str> {
        self.record.text("phone")
    }

    pub fn birthday(&self) -> Option<NaiveDate> {
        self.record.date("birthday")
    }

    /// Supplied gender, [`Gender::Unknown`] when absent.
    pub fn gender(&self) -> Gender {
        self.record.gender("gender").unwrap_or_default()
    }

    pub fn has_first_name(&self) -> bool {
        self.record.has("first_name")
    }

    pub fn has_last_name(&self) -> bool {
        self.record.has("last_name")
    }

    pub fn has_email(&self) -> bool {
        self.record.has("email")
    }

    pub fn has_phone(&self) -> bool {
        self.record.has("phone")
    }

    pub fn has_birthday(&self) -> bool {
        self.record.has("birthday")
    }

    pub fn has_gender(&self) -> bool {
        self.record.has("gender")
    }
}

// =============================================================================
// client_interests
// =============================================================================

/// Arguments of the `client_interests` method.
#[derive(Debug, Clone)]
pub struct ClientsInterestsRequest {
    record: Record,
}

impl RequestSchema for ClientsInterestsRequest {
    const FIELDS: &'static [Field] = &[
        Field::new("client_ids", FieldKind::ClientIds, true, true),
        Field::optional("date", FieldKind::Date),
    ];

    fn from_record(record: Record) -> Self {
        Self { record }
    }

    fn record(&self) -> &Record {
        &self.record
    }
}

impl ClientsInterestsRequest {
    pub fn client_ids(&self) -> &[i64] {
        self.record.ids("client_ids").unwrap_or_default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date("date")
    }

    pub fn has_client_ids(&self) -> bool {
        self.record.has("client_ids")
    }

    pub fn has_date(&self) -> bool {
        self.record.has("date")
    }
}

// =============================================================================
// Typed dispatch
// =============================================================================

/// Method arguments resolved against the schema of their method.
#[derive(Debug, Clone)]
pub enum MethodArguments {
    OnlineScore(OnlineScoreRequest),
    ClientsInterests(ClientsInterestsRequest),
}

impl MethodArguments {
    pub fn parse(method: Method, raw: &Map<String, Value>) -> Self {
        match method {
            Method::OnlineScore => MethodArguments::OnlineScore(OnlineScoreRequest::parse(raw)),
            Method::ClientsInterests => {
                MethodArguments::ClientsInterests(ClientsInterestsRequest::parse(raw))
            }
        }
    }

    pub fn record(&self) -> &Record {
        match self {
            MethodArguments::OnlineScore(args) => args.record(),
            MethodArguments::ClientsInterests(args) => args.record(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            MethodArguments::OnlineScore(args) => args.is_valid(),
            MethodArguments::ClientsInterests(args) => args.is_valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> MethodRequest {
        MethodRequest::parse(value.as_object().unwrap())
    }

    fn score(value: Value) -> OnlineScoreRequest {
        OnlineScoreRequest::parse(value.as_object().unwrap())
    }

    fn interests(value: Value) -> ClientsInterestsRequest {
        ClientsInterestsRequest::parse(value.as_object().unwrap())
    }

    #[test]
    fn empty_envelope_reports_required_fields() {
        let request = envelope(json!({}));
        assert_eq!(
            request.record().invalid_fields(),
            vec!["login", "token", "arguments", "method"]
        );
        assert!(!request.is_valid());
    }

    #[test]
    fn envelope_blank_credentials_are_accepted() {
        for blank in ["", " "] {
            let request = envelope(json!({"account": blank, "login": blank, "token": blank}));
            let invalid = request.record().invalid_fields();
            assert!(!invalid.contains(&"account"));
            assert!(!invalid.contains(&"login"));
            assert!(!invalid.contains(&"token"));
            assert!(invalid.contains(&"method"));
        }
    }

    #[test]
    fn envelope_method_cannot_be_blank() {
        let request = envelope(json!({"method": " "}));
        assert!(request.record().invalid_fields().contains(&"method"));
    }

    #[test]
    fn envelope_accepts_empty_arguments() {
        let request = envelope(json!({"arguments": {}}));
        assert!(!request.record().invalid_fields().contains(&"arguments"));
        assert!(request.arguments().unwrap().is_empty());
    }

    #[test]
    fn envelope_unknown_method_is_not_valid() {
        let request = envelope(json!({
            "login": "h&f", "token": "t", "arguments": {}, "method": "unknown_method"
        }));
        assert!(request.record().is_clean());
        assert_eq!(request.method(), None);
        assert!(!request.is_valid());
    }

    #[test]
    fn envelope_admin_detection() {
        assert!(envelope(json!({"login": "admin"})).is_admin());
        assert!(!envelope(json!({"login": "Yeldos123"})).is_admin());
        assert!(!envelope(json!({})).is_admin());
    }

    #[test]
    fn method_names_resolve() {
        assert_eq!(Method::from_name("online_score"), Some(Method::OnlineScore));
        assert_eq!(Method::from_name("client_interests"), Some(Method::ClientsInterests));
        assert_eq!(Method::from_name("clients_interests"), Some(Method::ClientsInterests));
        assert_eq!(Method::from_name("Online_Score"), None);
        assert_eq!(Method::ClientsInterests.to_string(), "client_interests");
    }

    #[test]
    fn score_fields_are_optional_and_nullable() {
        let request = score(json!({
            "first_name": "", "last_name": " ", "email": "", "phone": "", "birthday": "", "gender": 0
        }));
        assert!(request.record().is_clean());
        assert!(!request.has_first_name());
        assert!(!request.has_phone());
        assert!(request.has_gender());
        assert!(score(json!({})).record().is_clean());
    }

    #[test]
    fn score_presence_predicates() {
        let request = score(json!({
            "first_name": "Yeldos", "email": "Dima@yahoo.com", "phone": "77059997044"
        }));
        assert!(request.has_first_name());
        assert!(!request.has_last_name());
        assert!(request.has_email());
        assert!(request.has_phone());
        assert!(!request.has_gender());
        assert_eq!(request.gender(), Gender::Unknown);
    }

    #[test]
    fn score_requires_one_complete_pair() {
        assert!(score(json!({"phone": "79175002040", "email": "a@b.com"})).is_valid());
        assert!(score(json!({"first_name": "a", "last_name": "b"})).is_valid());
        assert!(score(json!({"gender": 0, "birthday": "01.01.2000"})).is_valid());
        assert!(!score(json!({"phone": "79175002040", "first_name": "a"})).is_valid());
        assert!(!score(json!({"gender": 1})).is_valid());
        assert!(!score(json!({})).is_valid());
    }

    #[test]
    fn score_pair_with_invalid_member_is_not_valid() {
        let request = score(json!({"phone": "79175002040", "email": "broken"}));
        assert_eq!(request.record().invalid_fields(), vec!["email"]);
        assert!(!request.has_email());
        assert!(!request.is_valid());
    }

    #[test]
    fn score_reports_all_invalid_fields() {
        let request = score(json!({
            "first_name": 1, "last_name": [], "email": "x", "phone": "8", "birthday": "1.1", "gender": 9
        }));
        assert_eq!(
            request.record().invalid_fields(),
            vec!["first_name", "last_name", "email", "phone", "birthday", "gender"]
        );
    }

    #[test]
    fn interests_client_ids_required() {
        let request = interests(json!({}));
        assert_eq!(request.record().invalid_fields(), vec!["client_ids"]);
        assert!(!request.is_valid());
    }

    #[test]
    fn interests_ids_round_trip() {
        let request = interests(json!({"client_ids": [1, 2, 3]}));
        assert!(request.is_valid());
        assert!(request.has_client_ids());
        assert_eq!(request.client_ids(), &[1, 2, 3]);
    }

    #[test]
    fn interests_empty_ids_valid_but_absent() {
        let request = interests(json!({"client_ids": []}));
        assert!(request.is_valid());
        assert!(!request.has_client_ids());
        assert!(request.client_ids().is_empty());
    }

    #[test]
    fn interests_date_is_optional() {
        for blank in ["", " "] {
            let request = interests(json!({"client_ids": [1], "date": blank}));
            assert!(request.is_valid());
            assert!(!request.has_date());
        }
        let request = interests(json!({"client_ids": [1], "date": "12.12.1989"}));
        assert!(request.has_date());
        assert_eq!(request.date(), NaiveDate::from_ymd_opt(1989, 12, 12));
    }

    #[test]
    fn arguments_dispatch_by_method() {
        let raw = json!({"client_ids": [4]});
        let args = MethodArguments::parse(Method::ClientsInterests, raw.as_object().unwrap());
        assert!(matches!(args, MethodArguments::ClientsInterests(_)));
        assert!(args.is_valid());

        let args = MethodArguments::parse(Method::OnlineScore, raw.as_object().unwrap());
        assert!(matches!(args, MethodArguments::OnlineScore(_)));
        assert!(!args.is_valid());
    }
}
