// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Declarative Request Schemas
//!
//! Request shapes are declared as an ordered, static list of [`Field`]
//! descriptors. Building a schema from a raw JSON object produces a
//! [`Record`] that owns the normalized values for that one request.
//!
//! ## Construction Contract
//!
//! - Fields are validated in declaration order.
//! - A failing field is recorded in the invalid list and the build continues,
//!   so every failure is reported at once.
//! - A failing field stores no value and is treated as absent afterwards.
//! - Records are immutable once built.

pub mod field;
pub mod requests;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

pub use field::{Field, FieldError, FieldKind, FieldValue, Gender};
pub use requests::{
    ClientsInterestsRequest, Method, MethodArguments, MethodRequest, OnlineScoreRequest,
    ADMIN_LOGIN,
};

/// A declared field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidField {
    pub name: &'static str,
    pub error: FieldError,
}

/// Per-request holder of normalized values and validation bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Record {
    values: HashMap<&'static str, FieldValue>,
    invalid: Vec<InvalidField>,
    present: Vec<&'static str>,
}

impl Record {
    /// Validate `raw` against the declared `fields`.
    pub fn build(fields: &[Field], raw: &Map<String, Value>) -> Self {
        let mut record = Record::default();
        for field in fields {
            match field.validate(raw.get(field.name)) {
                Ok(Some(value)) => {
                    if value.is_present() {
                        record.present.push(field.name);
                    }
                    record.values.insert(field.name, value);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::debug!(field = field.name, %error, "field failed validation");
                    record.invalid.push(InvalidField {
                        name: field.name,
                        error,
                    });
                }
            }
        }
        record
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.values.get(name) {
            Some(FieldValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    pub fn gender(&self, name: &str) -> Option<Gender> {
        match self.values.get(name) {
            Some(FieldValue::Gender(gender)) => Some(*gender),
            _ => None,
        }
    }

    pub fn ids(&self, name: &str) -> Option<&[i64]> {
        match self.values.get(name) {
            Some(FieldValue::Ids(ids)) => Some(ids),
            _ => None,
        }
    }

    pub fn arguments(&self, name: &str) -> Option<&Map<String, Value>> {
        match self.values.get(name) {
            Some(FieldValue::Arguments(map)) => Some(map),
            _ => None,
        }
    }

    /// Whether `name` was supplied with a present value.
    pub fn has(&self, name: &str) -> bool {
        self.present.iter().any(|present| *present == name)
    }

    /// Names of the fields that failed validation, in declaration order.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        self.invalid.iter().map(|invalid| invalid.name).collect()
    }

    pub fn errors(&self) -> &[InvalidField] {
        &self.invalid
    }

    pub fn present_fields(&self) -> &[&'static str] {
        &self.present
    }

    /// True when no field failed validation.
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// A request shape with a static field list and a composite validity rule.
pub trait RequestSchema: Sized {
    const FIELDS: &'static [Field];

    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn parse(raw: &Map<String, Value>) -> Self {
        Self::from_record(Record::build(Self::FIELDS, raw))
    }

    fn is_valid(&self) -> bool {
        self.record().is_clean()
    }
}
