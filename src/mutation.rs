//! The validate-then-execute flow shared by every create, update and delete endpoint.
//!
//! An endpoint validates its form into a [Record] and hands it to [create],
//! [update] or [delete]. Each of these runs exactly one statement. On success
//! every view showing the entity is revalidated; create and update then redirect,
//! delete answers in place. A failed statement is logged and turned into a
//! [FailureMessage] without touching the cache or redirecting.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, ToSql};

use crate::{AppState, alert::Alert, view_cache::ViewCache};

/// A validated record that maps one-to-one onto the columns of a table.
pub trait Record {
    /// The table the record is written to.
    const TABLE: &'static str;
    /// The columns written, in the same order as [Record::params].
    const COLUMNS: &'static [&'static str];

    /// The statement parameters, one per column.
    fn params(&self) -> Vec<&dyn ToSql>;
}

/// Where the effects of a successful mutation land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// The name shown to users, e.g. "Transaction".
    pub entity: &'static str,
    /// The cached views showing the entity. The first lists it, the rest
    /// display it through a join.
    pub view_paths: &'static [&'static str],
    /// Where the client is sent after a create or update.
    pub redirect_path: &'static str,
}

/// The state needed to run a mutation.
#[derive(Debug, Clone)]
pub struct MutationState {
    /// The database connection for writing records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The rendered views to revalidate after a write.
    pub view_cache: ViewCache,
}

impl FromRef<AppState> for MutationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            view_cache: state.view_cache.clone(),
        }
    }
}

/// The message returned in place of a redirect when a statement fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    pub message: String,
}

impl FailureMessage {
    fn new(operation: Operation, entity: &str) -> Self {
        Self {
            message: format!("Database Error: Failed to {operation} {entity}."),
        }
    }
}

impl IntoResponse for FailureMessage {
    fn into_response(self) -> Response {
        Alert::Error {
            message: self.message,
            details: "Try again later or check the server logs.".to_owned(),
        }
        .into_response()
    }
}

/// The result of running a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A create or update succeeded and the client should navigate to `path`.
    Redirect { path: &'static str },
    /// A delete succeeded. The view was revalidated but the client stays put.
    Revalidated { entity: &'static str },
    /// The statement failed. Nothing was revalidated.
    Failed(FailureMessage),
}

impl IntoResponse for MutationOutcome {
    fn into_response(self) -> Response {
        match self {
            MutationOutcome::Redirect { path } => {
                (HxRedirect(path.to_owned()), StatusCode::SEE_OTHER).into_response()
            }
            MutationOutcome::Revalidated { entity } => Alert::Success {
                message: format!("{entity} deleted successfully"),
            }
            .into_response(),
            MutationOutcome::Failed(failure) => failure.into_response(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Create,
    Update,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("Create"),
            Operation::Update => f.write_str("Update"),
            Operation::Delete => f.write_str("Delete"),
        }
    }
}

/// `INSERT INTO table (a, b) VALUES (?1, ?2)`
pub fn insert_statement(table: &str, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

/// `UPDATE table SET a = ?1, b = ?2 WHERE id = ?3`
pub fn update_statement(table: &str, columns: &[&str]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {table} SET {assignments} WHERE id = ?{}",
        columns.len() + 1
    )
}

/// `DELETE FROM table WHERE id = ?1`
pub fn delete_statement(table: &str) -> String {
    format!("DELETE FROM {table} WHERE id = ?1")
}

/// Insert `record`, then revalidate and redirect.
pub fn create<R: Record>(record: &R, target: &Target, state: &MutationState) -> MutationOutcome {
    let statement = insert_statement(R::TABLE, R::COLUMNS);

    match execute(state, target, Operation::Create, &statement, &record.params()) {
        Ok(_) => {
            revalidate(state, target);
            MutationOutcome::Redirect {
                path: target.redirect_path,
            }
        }
        Err(failure) => MutationOutcome::Failed(failure),
    }
}

/// Overwrite every column of the row `id` with `record`, then revalidate and redirect.
pub fn update<R: Record>(
    id: &str,
    record: &R,
    target: &Target,
    state: &MutationState,
) -> MutationOutcome {
    let statement = update_statement(R::TABLE, R::COLUMNS);
    let mut params = record.params();
    params.push(&id);

    match execute(state, target, Operation::Update, &statement, &params) {
        Ok(rows_affected) => {
            if rows_affected == 0 {
                tracing::warn!("update of {} {id} matched no rows", target.entity);
            }

            revalidate(state, target);
            MutationOutcome::Redirect {
                path: target.redirect_path,
            }
        }
        Err(failure) => MutationOutcome::Failed(failure),
    }
}

/// Delete the row `id` from `table` and revalidate. Never redirects.
pub fn delete(id: &str, table: &str, target: &Target, state: &MutationState) -> MutationOutcome {
    let statement = delete_statement(table);

    match execute(state, target, Operation::Delete, &statement, &[&id]) {
        Ok(rows_affected) => {
            if rows_affected == 0 {
                tracing::warn!("delete of {} {id} matched no rows", target.entity);
            }

            revalidate(state, target);
            MutationOutcome::Revalidated {
                entity: target.entity,
            }
        }
        Err(failure) => MutationOutcome::Failed(failure),
    }
}

fn revalidate(state: &MutationState, target: &Target) {
    for path in target.view_paths {
        state.view_cache.revalidate(path);
    }
}

type RowsAffected = usize;

fn execute(
    state: &MutationState,
    target: &Target,
    operation: Operation,
    statement: &str,
    params: &[&dyn ToSql],
) -> Result<RowsAffected, FailureMessage> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        FailureMessage::new(operation, target.entity)
    })?;

    connection.execute(statement, params).map_err(|error| {
        tracing::error!("{operation} {} failed on \"{statement}\": {error}", target.entity);
        FailureMessage::new(operation, target.entity)
    })
}
