//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::set_auth_cookie,
        provider::{CredentialsProvider, SignInOutcome, authenticate},
    },
    endpoints,
    form::FormData,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, labelled_input, log_in_register},
};

fn log_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target="this"
            hx-swap="outerHTML"
            class="space-y-4 md:space-y-6"
        {
            (labelled_input("Email", "email", "email", email, true))
            (labelled_input("Password", "password", "password", "", true))

            @if let Some(error_message) = error_message {
                p class="text-red-500 text-base" { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            span class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Markup {
    let log_in_form = log_in_form("", None);
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &content)
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is redirected to the
/// transactions page. When the identity provider rejects the credentials, the form is returned
/// with a message explaining the problem.
///
/// # Errors
///
/// Returns an error if the database lock could not be acquired or the user lookup failed for a
/// reason other than unknown credentials.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(credentials): Form<FormData>,
) -> Result<Response, Error> {
    let outcome = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock for log-in: {error}");
            Error::DatabaseLockError
        })?;

        authenticate(
            &CredentialsProvider {
                connection: &connection,
            },
            &credentials,
        )?
    };

    let response = match outcome {
        SignInOutcome::SignedIn(user_id) => {
            tracing::info!("user {user_id} logged in");
            let jar = set_auth_cookie(jar, &user_id, state.cookie_duration);

            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                jar,
            )
                .into_response()
        }
        SignInOutcome::Rejected(message) => {
            log_in_form(credentials.get("email").unwrap_or_default(), Some(message))
                .into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::response::IntoResponse;
    use scraper::Selector;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::get_log_in_page;

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page().await.into_response();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");

        let links = form
            .select(&Selector::parse("a[href]").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::REGISTER_VIEW));
    }
}
