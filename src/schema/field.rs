// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field descriptors and their validation rules.
//!
//! A [`Field`] is immutable configuration: a name, a [`FieldKind`] and the
//! required/nullable policy. [`Field::validate`] is a pure function of the
//! descriptor and the raw JSON value; the normalized result is owned by the
//! caller (see [`super::Record`]).
//!
//! ## Policy
//!
//! - `required` means the key must be supplied with a non-null value.
//! - `nullable` means a supplied text value may be blank. Blank values are
//!   normalized to "absent".
//! - JSON `null` is treated like a missing key.

use chrono::{Months, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Date format accepted by date fields (`dd.mm.yyyy`).
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Oldest supported age for birthday fields.
pub const MAX_AGE_YEARS: u32 = 70;

/// Validation rule applied by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text.
    Char,
    /// Text with exactly one `@` separator.
    Email,
    /// 11 characters starting with `7`.
    Phone,
    /// Nested key/value mapping.
    Arguments,
    /// `dd.mm.yyyy` date.
    Date,
    /// `dd.mm.yyyy` date no older than [`MAX_AGE_YEARS`].
    BirthDate,
    /// Integer gender code.
    Gender,
    /// List of integer client identifiers.
    ClientIds,
}

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field is required")]
    Missing,
    #[error("field cannot be blank")]
    Blank,
    #[error("expected {0}")]
    WrongType(&'static str),
    #[error("email must contain exactly one '@'")]
    Email,
    #[error("phone must be 11 characters starting with 7")]
    Phone,
    #[error("date must be formatted as dd.mm.yyyy")]
    DateFormat,
    #[error("birthday must be within the last {MAX_AGE_YEARS} years")]
    TooOld,
    #[error("gender must be one of 0, 1, 2")]
    Gender,
    #[error("client ids must be integers")]
    ClientId,
}

/// Gender code carried by online score requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    pub fn from_code(code: i64) -> Option<Gender> {
        match code {
            0 => Some(Gender::Unknown),
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Normalized value produced by a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Gender(Gender),
    Ids(Vec<i64>),
    Arguments(Map<String, Value>),
}

impl FieldValue {
    /// Whether this value counts as "present" for `has_*` predicates.
    ///
    /// Empty collections are not present. Any gender code, including 0, is.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Ids(ids) => !ids.is_empty(),
            FieldValue::Arguments(map) => !map.is_empty(),
            FieldValue::Date(_) | FieldValue::Gender(_) => true,
        }
    }
}

/// Immutable field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            name,
            kind,
            required,
            nullable,
        }
    }

    /// Optional field that accepts blank values.
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, false, true)
    }

    /// Validate a raw value, returning `Ok(None)` for absent values.
    pub fn validate(&self, raw: Option<&Value>) -> Result<Option<FieldValue>, FieldError> {
        let Some(raw) = raw.filter(|value| !value.is_null()) else {
            return if self.required {
                Err(FieldError::Missing)
            } else {
                Ok(None)
            };
        };

        match self.kind {
            FieldKind::Char => Ok(self.text(raw)?.map(FieldValue::Text)),
            FieldKind::Email => {
                let email = self.text(raw)?;
                if let Some(email) = &email {
                    if email.split('@').count() != 2 {
                        return Err(FieldError::Email);
                    }
                }
                Ok(email.map(FieldValue::Text))
            }
            FieldKind::Phone => {
                let phone = match raw {
                    Value::Number(number) if number.is_u64() || number.is_i64() => {
                        Some(number.to_string())
                    }
                    other => self.text(other)?,
                };
                if let Some(phone) = &phone {
                    if phone.chars().count() != 11 || !phone.starts_with('7') {
                        return Err(FieldError::Phone);
                    }
                }
                Ok(phone.map(FieldValue::Text))
            }
            FieldKind::Arguments => raw
                .as_object()
                .map(|map| Some(FieldValue::Arguments(map.clone())))
                .ok_or(FieldError::WrongType("object")),
            FieldKind::Date => Ok(self.date(raw)?.map(FieldValue::Date)),
            FieldKind::BirthDate => {
                let birthday = self.date(raw)?;
                if let Some(birthday) = birthday {
                    if birthday < oldest_birthday() {
                        return Err(FieldError::TooOld);
                    }
                }
                Ok(birthday.map(FieldValue::Date))
            }
            FieldKind::Gender => gender(raw),
            FieldKind::ClientIds => client_ids(raw),
        }
    }

    /// Trimmed text, `None` for blank nullable values.
    fn text(&self, raw: &Value) -> Result<Option<String>, FieldError> {
        let text = raw.as_str().ok_or(FieldError::WrongType("string"))?.trim();
        if text.is_empty() {
            return if self.nullable {
                Ok(None)
            } else {
                Err(FieldError::Blank)
            };
        }
        Ok(Some(text.to_owned()))
    }

    fn date(&self, raw: &Value) -> Result<Option<NaiveDate>, FieldError> {
        match self.text(raw)? {
            Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Some)
                .map_err(|_| FieldError::DateFormat),
            None => Ok(None),
        }
    }
}

fn oldest_birthday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today
        .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}

fn gender(raw: &Value) -> Result<Option<FieldValue>, FieldError> {
    match raw {
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .and_then(Gender::from_code)
            .map(|gender| Some(FieldValue::Gender(gender)))
            .ok_or(FieldError::Gender),
        _ => Err(FieldError::Gender),
    }
}

fn client_ids(raw: &Value) -> Result<Option<FieldValue>, FieldError> {
    let items = raw
        .as_array()
        .ok_or(FieldError::WrongType("array of integers"))?;
    let ids = items
        .iter()
        .map(|item| item.as_i64().ok_or(FieldError::ClientId))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(FieldValue::Ids(ids)))
}
