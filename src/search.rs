//! Keeps the `query` parameter of a list page's URL in step with its search box.
//!
//! The box issues an htmx GET on every input event. The list handler passes the
//! page's current URL (from `HX-Current-URL`) and the typed text to
//! [resolve_search], renders the filtered rows, and answers with
//! `HX-Replace-Url` so the browser replaces its history entry instead of
//! pushing a new one.

use axum::http::{HeaderMap, Uri};
use axum_htmx::{HX_CURRENT_URL, HX_REQUEST};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::html::FORM_TEXT_INPUT_STYLE;

/// The query parameter holding the search text.
pub const QUERY_PARAM: &str = "query";

/// The element id of the results table that searches swap.
pub const SEARCH_RESULTS_ID: &str = "search-results";

/// URL query parameters in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    /// Parse a query string, with or without its leading `?`.
    ///
    /// Malformed input yields no parameters.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        serde_urlencoded::from_str(query).unwrap_or_else(|error| {
            tracing::warn!("ignoring malformed query string {query:?}: {error}");
            Self::default()
        })
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set `name` to `value`, replacing every existing value.
    ///
    /// The first occurrence keeps its position. A new parameter is appended.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter().position(|(key, _)| key == name) {
            Some(index) => {
                self.0[index].1 = value.to_owned();
                let mut seen = 0;
                self.0.retain(|(key, _)| {
                    if key != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.0.push((name.to_owned(), value.to_owned())),
        }
    }

    /// Remove every value of `name`.
    pub fn delete(&mut self, name: &str) {
        self.0.retain(|(key, _)| key != name);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = serde_urlencoded::to_string(&self.0).map_err(|_| std::fmt::Error)?;
        f.write_str(&encoded)
    }
}

/// Copy `current` and point its `query` parameter at `input`.
///
/// Empty input removes the parameter.
pub fn sync_query(current: &SearchParams, input: &str) -> SearchParams {
    let mut params = current.clone();

    if input.is_empty() {
        params.delete(QUERY_PARAM);
    } else {
        params.set(QUERY_PARAM, input);
    }

    params
}

/// A `LIKE` pattern matching values that contain `query` literally.
///
/// `%`, `_` and `\` are escaped, so the statement must declare `ESCAPE '\'`.
pub fn contains_pattern(query: Option<&str>) -> String {
    let mut pattern = String::from("%");

    for c in query.unwrap_or_default().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}

/// A request to replace the current history entry with new query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReplacement {
    pub params: SearchParams,
}

impl UrlReplacement {
    /// The relative href, e.g. `?query=acme`.
    pub fn href(&self) -> String {
        format!("?{}", self.params)
    }

    /// The absolute URL for `path` to put in `HX-Replace-Url`.
    pub fn url_for(&self, path: &str) -> String {
        if self.params.is_empty() {
            path.to_owned()
        } else {
            format!("{path}{}", self.href())
        }
    }
}

/// Handle one change of the search box.
pub fn handle_search(current: &SearchParams, input: &str) -> UrlReplacement {
    UrlReplacement {
        params: sync_query(current, input),
    }
}

/// Work out which parameters a list request should render with.
///
/// For an htmx search request, `current_url` is the page the search box lives
/// on and `request_params` carries the typed `query`. The result merges the two
/// and asks for the URL to be replaced. Plain page loads use `request_params`
/// unchanged.
pub fn resolve_search(
    current_url: Option<&str>,
    request_params: &SearchParams,
) -> (SearchParams, Option<UrlReplacement>) {
    let Some(current_url) = current_url else {
        return (request_params.clone(), None);
    };

    let current = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.query().map(SearchParams::parse))
        .unwrap_or_default();
    let input = request_params.get(QUERY_PARAM).unwrap_or_default();
    let replacement = handle_search(&current, input);

    (replacement.params.clone(), Some(replacement))
}

/// The page URL the search box lives on, for requests made by htmx.
pub fn current_url(headers: &HeaderMap) -> Option<&str> {
    headers.get(HX_REQUEST)?;

    headers.get(HX_CURRENT_URL)?.to_str().ok()
}

/// A search box that filters the `#search-results` table of the page at `path`.
///
/// The initial value comes from `params` and is left to the browser afterwards.
pub fn search_input(placeholder: &str, path: &str, params: &SearchParams) -> Markup {
    html! {
        div class="relative flex flex-1 shrink-0 w-full mb-4"
        {
            label for="search" class="sr-only" { "Search" }

            input
                id="search"
                type="search"
                name=(QUERY_PARAM)
                placeholder=(placeholder)
                value=[params.get(QUERY_PARAM)]
                autocomplete="off"
                hx-get=(path)
                hx-trigger="input"
                hx-target={ "#" (SEARCH_RESULTS_ID) }
                hx-select={ "#" (SEARCH_RESULTS_ID) }
                hx-swap="outerHTML"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}



#[cfg(test)]
mod resolve_search_tests {
    use axum::http::HeaderMap;

    use super::{SearchParams, current_url, resolve_search};

    #[test]
    fn page_load_uses_request_params() {
        let request = SearchParams::parse("query=acme");

        let (params, replacement) = resolve_search(None, &request);

        assert_eq!(params, request);
        assert_eq!(replacement, None);
    }

    #[test]
    fn htmx_search_merges_into_current_url() {
        let request = SearchParams::parse("query=zeta");

        let (params, replacement) = resolve_search(
            Some("http://localhost:3000/dashboard/transactions?page=3&query=acme"),
            &request,
        );

        assert_eq!(params.to_string(), "page=3&query=zeta");
        assert_eq!(replacement.unwrap().href(), "?page=3&query=zeta");
    }

    #[test]
    fn htmx_search_with_empty_box_clears_query() {
        let request = SearchParams::parse("query=");

        let (params, _) = resolve_search(
            Some("http://localhost:3000/dashboard/customers?query=acme"),
            &request,
        );

        assert!(params.is_empty());
    }

    #[test]
    fn current_url_requires_htmx_request() {
        let mut headers = HeaderMap::new();
        headers.insert("hx-current-url", "http://localhost/a?b=c".parse().unwrap());

        assert_eq!(current_url(&headers), None);

        headers.insert("hx-request", "true".parse().unwrap());

        assert_eq!(current_url(&headers), Some("http://localhost/a?b=c"));
    }
}

#[cfg(test)]
mod search_input_tests {
    use scraper::{Html, Selector};

    use crate::test_utils::assert_valid_html;

    use super::{SearchParams, search_input};

    #[test]
    fn input_starts_with_current_query_and_targets_results() {
        let html = Html::parse_fragment(
            &search_input(
                "Search customers...",
                "/dashboard/customers",
                &SearchParams::parse("query=acme"),
            )
            .into_string(),
        );
        assert_valid_html(&html);

        let input = html
            .select(&Selector::parse("input").unwrap())
            .next()
            .expect("No input found");
        let attr = |name| input.value().attr(name).unwrap_or_default();

        assert_eq!(attr("value"), "acme");
        assert_eq!(attr("name"), "query");
        assert_eq!(attr("hx-get"), "/dashboard/customers");
        assert_eq!(attr("hx-trigger"), "input");
        assert_eq!(attr("hx-target"), "#search-results");
        assert_eq!(attr("hx-select"), "#search-results");
    }

    #[test]
    fn input_without_query_has_no_value() {
        let html = Html::parse_fragment(
            &search_input("Search...", "/dashboard/transactions", &SearchParams::default())
                .into_string(),
        );

        let input = html
            .select(&Selector::parse("input").unwrap())
            .next()
            .expect("No input found");

        assert_eq!(input.value().attr("value"), None);
    }
}
