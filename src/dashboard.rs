//! Shared plumbing for the dashboard list pages.
//!
//! Every list page is rendered through the [ViewCache] so that a page is only
//! rebuilt from the database after a mutation has revalidated its path.

use std::sync::{Arc, Mutex};

use axum::{
    extract::FromRef,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HX_REPLACE_URL;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    html::{BUTTON_PRIMARY_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    search::UrlReplacement,
    view_cache::ViewCache,
};

/// The state needed to render a dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Rendered pages, keyed by path and search text.
    pub view_cache: ViewCache,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            view_cache: state.view_cache.clone(),
        }
    }
}

/// A row of a table together with its database id.
#[derive(Debug, Clone, PartialEq)]
pub struct Listed<T> {
    pub id: String,
    pub record: T,
}

/// Serve the page at `path` for the search text `search` from the cache,
/// rendering it with `render` on a miss.
///
/// Pages without a search box pass `None`, so stray query parameters all map to
/// one cached page.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the connection lock is poisoned, or
/// whatever `render` returns.
pub fn render_cached<F>(
    state: &DashboardState,
    path: &str,
    search: Option<&str>,
    render: F,
) -> Result<Html<String>, Error>
where
    F: FnOnce(&Connection) -> Result<Markup, Error>,
{
    state
        .view_cache
        .get_or_render(path, search, || {
            let connection = state.db_connection.lock().map_err(|error| {
                tracing::error!("could not acquire database lock: {error}");
                Error::DatabaseLockError
            })?;

            render(&connection)
        })
        .map(Html)
}

/// Attach `HX-Replace-Url` for `path` when the request came from a search box.
pub fn with_url_replacement(
    page: Html<String>,
    replacement: Option<UrlReplacement>,
    path: &str,
) -> Response {
    match replacement {
        Some(replacement) => {
            ([(HX_REPLACE_URL, replacement.url_for(path))], page).into_response()
        }
        None => page.into_response(),
    }
}

/// The layout shared by the list pages: navigation bar, heading, then `content`.
pub fn dashboard_page(title: &str, path: &str, content: &Markup) -> Markup {
    let content = html! {
        (NavBar::new(path).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                h1 class="text-xl font-bold" { (title) }

                (content)
            }
        }
    };

    base(title, &content)
}

/// A collapsible form that posts a new record to `endpoint`.
///
/// Storage failures come back as an alert, validation failures as an error
/// page, both of which are shown in the alert container.
pub fn create_form(summary: &str, endpoint: &str, fields: &Markup) -> Markup {
    html! {
        details class="w-full"
        {
            summary class="cursor-pointer font-medium" { (summary) }

            form
                hx-post=(endpoint)
                hx-target-error="#alert-container"
                class="grid gap-4 mt-4 sm:grid-cols-2"
            {
                (fields)

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::response::Html;
    use maud::html;
    use rusqlite::Connection;

    use crate::{
        Error,
        search::{SearchParams, handle_search},
        test_utils::get_header,
        view_cache::ViewCache,
    };

    use super::{DashboardState, render_cached, with_url_replacement};

    fn get_state() -> DashboardState {
        DashboardState {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
            view_cache: ViewCache::new(),
        }
    }

    #[test]
    fn serves_second_request_from_cache() {
        let state = get_state();

        let first = render_cached(&state, "/dashboard/customers", Some("acme"), |_| {
            Ok(html! { "first" })
        })
        .unwrap();
        let second = render_cached(&state, "/dashboard/customers", Some("acme"), |_| {
            Ok(html! { "second" })
        })
        .unwrap();

        assert_eq!(first.0, "first");
        assert_eq!(second.0, "first");
    }

    #[test]
    fn render_error_is_returned() {
        let state = get_state();

        let result = render_cached(&state, "/dashboard/funds", None, |_| Err(Error::NotFound));

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn search_response_replaces_url() {
        let replacement = handle_search(&SearchParams::default(), "acme");

        let response = with_url_replacement(
            Html("<p></p>".to_owned()),
            Some(replacement),
            "/dashboard/customers",
        );

        assert_eq!(
            get_header(&response, "hx-replace-url"),
            "/dashboard/customers?query=acme"
        );
    }

    #[test]
    fn page_load_does_not_replace_url() {
        let response = with_url_replacement(Html(String::new()), None, "/dashboard/customers");

        assert!(response.headers().get("hx-replace-url").is_none());
    }
}
