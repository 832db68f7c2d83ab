//! The settlement status shared by transactions, invoices and movements.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::form::{Expected, FormData, ValidationError};

/// Whether a record has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Paid,
}

/// The text was not one of the known statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status {0:?}")]
pub struct UnknownStatus(String);

impl Status {
    /// The accepted values, as they appear in forms and in the database.
    pub const OPTIONS: &'static [&'static str] = &["pending", "paid"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Paid => "paid",
        }
    }

    /// Read a required status from `field` of `form`.
    pub fn from_field(form: &FormData, field: &str) -> Result<Self, ValidationError> {
        form.get(field)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ValidationError::new(field, Expected::OneOf(Self::OPTIONS)))
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "paid" => Ok(Status::Paid),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
