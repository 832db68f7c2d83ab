//! Fundboard is a web dashboard for tracking a fund's customers, invoices,
//! transactions, token movements and token prices.
//!
//! This library provides a REST API that directly serves HTML pages. Forms are
//! submitted with htmx; every create, update and delete runs a single SQL
//! statement and then revalidates the cached list page it affects.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod customer;
mod dashboard;
mod db;
mod endpoints;
mod form;
mod html;
mod invoice;
mod logging;
mod movement;
mod mutation;
mod navigation;
mod not_found;
mod routing;
mod search;
mod status;
mod token_price;
mod transaction;
mod view_cache;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthErrorKind, CredentialsProvider, IdentityProvider, PasswordHash, SignInError,
    SignInOutcome, User, UserId, ValidatedPassword, authenticate,
};
pub use db::initialize as initialize_db;
pub use form::{Expected, ValidationError};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{html::error_view, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A submitted form field was missing or malformed.
    ///
    /// This is the only error whose details are shown to the client.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

fn error_page(status: StatusCode, header: &str, description: &str, fix: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");

    (
        status,
        Html(error_view(title, header, description, fix).into_string()),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(error) => {
                tracing::debug!("rejected form: {error}");
                error_page(
                    StatusCode::BAD_REQUEST,
                    "400",
                    "Invalid form data.",
                    &format!("The field \"{}\" must be {}.", error.field, error.expected),
                )
            }
            Error::NotFound => get_404_not_found_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500",
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        }
    }
}
