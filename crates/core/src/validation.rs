//! Field rules for user-editable records. Every function here is pure.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use url::Url;

pub const NAME_MIN_CHARS: usize = 2;
pub const BIO_MAX_CHARS: usize = 500;

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("is required")]
    Required,
    #[error("must be at least {min} characters")]
    TooShort { min: usize },
    #[error("cannot exceed {max} characters")]
    TooLong { max: usize },
    #[error("is not a valid URL")]
    InvalidUrl,
    #[error("is not a valid date")]
    InvalidDate,
}

impl FieldError {
    /// Human-readable message for the field named `label`.
    pub fn message(&self, label: &str) -> String {
        match self {
            FieldError::InvalidUrl => "Please enter a valid URL".to_string(),
            FieldError::InvalidDate => "Please enter a valid date (YYYY-MM-DD)".to_string(),
            other => format!("{label} {other}"),
        }
    }
}

/// Identifies one editable field of a record.
pub trait Field: Copy + Ord + fmt::Debug {
    fn label(self) -> &'static str;
}

/// Error map keyed by field. Empty means the record may be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F: Field> {
    errors: BTreeMap<F, FieldError>,
}

impl<F: Field> Default for FieldErrors<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<F: Field> FieldErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a rule for `field`; `Ok` leaves the map untouched.
    pub fn check(&mut self, field: F, outcome: Result<(), FieldError>) {
        if let Err(err) = outcome {
            self.errors.insert(field, err);
        }
    }

    pub fn insert(&mut self, field: F, error: FieldError) {
        self.errors.insert(field, error);
    }

    pub fn get(&self, field: F) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn remove(&mut self, field: F) -> Option<FieldError> {
        self.errors.remove(&field)
    }

    pub fn contains(&self, field: F) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, FieldError)> + '_ {
        self.errors.iter().map(|(field, err)| (*field, *err))
    }

    pub fn message(&self, field: F) -> Option<String> {
        self.get(field).map(|err| err.message(field.label()))
    }

    pub fn messages(&self) -> Vec<(F, String)> {
        self.iter()
            .map(|(field, err)| (field, err.message(field.label())))
            .collect()
    }
}

/// A record whose fields can be checked against their rules.
pub trait Validate {
    type Field: Field;

    fn validate(&self) -> FieldErrors<Self::Field>;
}

pub fn required(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::Required)
    } else {
        Ok(())
    }
}

pub fn min_chars(value: &str, min: usize) -> Result<(), FieldError> {
    if value.trim().chars().count() < min {
        Err(FieldError::TooShort { min })
    } else {
        Ok(())
    }
}

pub fn max_chars(value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        Err(FieldError::TooLong { max })
    } else {
        Ok(())
    }
}

/// Blank is "unset" and passes; anything else must carry a scheme and an authority.
pub fn absolute_url(value: &str) -> Result<(), FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(FieldError::InvalidUrl),
    }
}

pub fn optional_date(value: &str) -> Result<(), FieldError> {
    match parse_date(value) {
        Some(Err(err)) => Err(err),
        _ => Ok(()),
    }
}

/// Parse a user-entered date: `YYYY-MM-DD` (midnight UTC) or RFC 3339. Blank yields `None`.
pub fn parse_date(value: &str) -> Option<Result<DateTime<Utc>, FieldError>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(
            date.and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .ok_or(FieldError::InvalidDate),
        );
    }

    Some(
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| FieldError::InvalidDate),
    )
}
