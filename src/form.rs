//! Untyped form payloads and the field checks that turn them into typed records.
//!
//! Handlers receive the submitted fields as a [FormData] map and hand it to the
//! matching [FormSchema] implementation. A failed check produces a
//! [ValidationError] naming the field and the shape it should have had.

use std::{collections::HashMap, fmt::Display};

use email_address::EmailAddress;
use serde::Deserialize;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};
use unicode_segmentation::UnicodeSegmentation;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const DATE_TIME_SECONDS_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// The raw fields of a submitted form, keyed by input name.
///
/// When a field is repeated, the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FormData(HashMap<String, String>);

/// The shape a form field was expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Any string, including the empty string.
    Text,
    /// Text that parses as a finite number.
    Number,
    /// One of a closed set of values.
    OneOf(&'static [&'static str]),
    /// Text with at least this many characters.
    MinLength(usize),
    /// A well-formed email address.
    Email,
    /// A calendar date, optionally with a time.
    Date,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Text => write!(f, "a string"),
            Expected::Number => write!(f, "a number"),
            Expected::OneOf(options) => write!(f, "one of {}", options.join(", ")),
            Expected::MinLength(min) => write!(f, "at least {min} characters"),
            Expected::Email => write!(f, "an email address"),
            Expected::Date => write!(f, "a date such as 2024-03-05"),
        }
    }
}

/// A submitted field was missing or did not have the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid form field \"{field}\": expected {expected}")]
pub struct ValidationError {
    /// The name of the offending field.
    pub field: String,
    /// What the field should have contained.
    pub expected: Expected,
}

impl ValidationError {
    pub fn new(field: &str, expected: Expected) -> Self {
        Self {
            field: field.to_owned(),
            expected,
        }
    }
}

/// A record that can be validated and coerced from a submitted form.
pub trait FormSchema: Sized {
    /// Check every field of `form` and build the typed record.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] for the first field that is missing or malformed.
    fn parse(form: &FormData) -> Result<Self, ValidationError>;
}

impl FormData {
    /// Get the raw value of `field`, if it was submitted.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// A required string field. The empty string is accepted.
    pub fn text(&self, field: &str) -> Result<String, ValidationError> {
        self.get(field)
            .map(str::to_owned)
            .ok_or_else(|| ValidationError::new(field, Expected::Text))
    }

    /// An optional string field, where an empty input counts as absent.
    pub fn optional_text(&self, field: &str) -> Option<String> {
        self.get(field)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// A required numeric field, coerced from its text.
    pub fn number(&self, field: &str) -> Result<f64, ValidationError> {
        self.get(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|number| number.is_finite())
            .ok_or_else(|| ValidationError::new(field, Expected::Number))
    }

    /// A required string field with at least `min` user-perceived characters.
    pub fn min_length(&self, field: &str, min: usize) -> Result<String, ValidationError> {
        let value = self.text(field)?;

        if value.graphemes(true).count() < min {
            return Err(ValidationError::new(field, Expected::MinLength(min)));
        }

        Ok(value)
    }

    /// A required email address.
    pub fn email(&self, field: &str) -> Result<String, ValidationError> {
        match self.get(field) {
            Some(value) if EmailAddress::is_valid(value) => Ok(value.to_owned()),
            _ => Err(ValidationError::new(field, Expected::Email)),
        }
    }

    /// An optional email address. Empty input counts as absent, anything else
    /// must be a valid address.
    pub fn optional_email(&self, field: &str) -> Result<Option<String>, ValidationError> {
        match self.get(field) {
            None | Some("") => Ok(None),
            Some(value) if EmailAddress::is_valid(value) => Ok(Some(value.to_owned())),
            Some(_) => Err(ValidationError::new(field, Expected::Email)),
        }
    }

    /// A required date, normalised to the UTC calendar date.
    ///
    /// See [parse_calendar_date] for the accepted formats.
    pub fn date(&self, field: &str) -> Result<Date, ValidationError> {
        self.get(field)
            .and_then(parse_calendar_date)
            .ok_or_else(|| ValidationError::new(field, Expected::Date))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FormData {
    fn from(fields: [(&str, &str); N]) -> Self {
        Self(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
        )
    }
}

/// Parse a date as submitted by a form and reduce it to a calendar date.
///
/// Accepts an RFC 3339 date-time (converted to UTC first), a local
/// date-time such as `2024-03-05T10:00` as sent by `datetime-local` inputs,
/// or a plain `2024-03-05`.
pub fn parse_calendar_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();

    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(date_time.to_offset(UtcOffset::UTC).date());
    }

    for format in [DATE_TIME_SECONDS_FORMAT, DATE_TIME_FORMAT] {
        if let Ok(date_time) = PrimitiveDateTime::parse(raw, format) {
            return Some(date_time.date());
        }
    }

    Date::parse(raw, DATE_FORMAT).ok()
}
