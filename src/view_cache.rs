//! Rendered list pages, kept until a mutation marks their path as stale.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use maud::Markup;
use moka::sync::Cache;

use crate::{Error, search::QUERY_PARAM};

/// The most pages held at once. Least used pages are evicted first.
pub const MAX_CACHED_PAGES: u64 = 1000;

const TIME_TO_LIVE: Duration = Duration::from_secs(300);

/// Cached page output keyed by path and search text.
///
/// Revalidating a path drops every cached variant of it, whatever the search.
#[derive(Clone)]
pub struct ViewCache {
    pages: Cache<String, String>,
    // Held while rendering and while revalidating, so a page rendered from
    // rows read before a write is never stored after that write revalidated.
    render_lock: Arc<Mutex<()>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_PAGES)
    }

    fn with_capacity(max_capacity: u64) -> Self {
        let pages = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(TIME_TO_LIVE)
            .build();

        Self {
            pages,
            render_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Return the cached page for `path` and `search`, or render and store it.
    ///
    /// `search` is the only request input a page may depend on. Pass `None`
    /// for pages that render the same whatever the query string.
    ///
    /// # Errors
    ///
    /// Returns the error from `render`. Nothing is cached in that case.
    pub fn get_or_render<F>(
        &self,
        path: &str,
        search: Option<&str>,
        render: F,
    ) -> Result<String, Error>
    where
        F: FnOnce() -> Result<Markup, Error>,
    {
        let key = cache_key(path, search);
        let _guard = self.lock();

        if let Some(page) = self.pages.get(&key) {
            tracing::debug!("serving {key} from the view cache");
            return Ok(page);
        }

        let page = render()?.into_string();
        self.pages.insert(key, page.clone());

        Ok(page)
    }

    /// Mark every cached variant of `path` as stale.
    pub fn revalidate(&self, path: &str) {
        let _guard = self.lock();

        let stale: Vec<Arc<String>> = self
            .pages
            .iter()
            .filter(|(key, _)| path_of(key) == path)
            .map(|(key, _)| key)
            .collect();

        for key in &stale {
            self.pages.invalidate(key.as_str());
        }

        tracing::debug!("revalidated {path}, dropped {} cached page(s)", stale.len());
    }

    /// Whether a page for `path` and `search` is currently cached.
    #[cfg(test)]
    pub fn contains(&self, path: &str, search: Option<&str>) -> bool {
        self.pages.contains_key(&cache_key(path, search))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // A renderer that panics leaves the cache untouched.
        self.render_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCache")
            .field("entry_count", &self.pages.entry_count())
            .finish()
    }
}

fn cache_key(path: &str, search: Option<&str>) -> String {
    match search.filter(|search| !search.is_empty()) {
        Some(search) => format!("{path}?{QUERY_PARAM}={search}"),
        None => path.to_owned(),
    }
}

fn path_of(key: &str) -> &str {
    key.split_once('?').map_or(key, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use maud::html;

    use crate::Error;

    use super::ViewCache;

    #[test]
    fn renders_once_until_revalidated() {
        let cache = ViewCache::new();
        let mut renders = 0;

        for _ in 0..3 {
            let page = cache
                .get_or_render("/dashboard/funds", None, || {
                    renders += 1;
                    Ok(html! { p { "prices" } })
                })
                .unwrap();
            assert_eq!(page, "<p>prices</p>");
        }
        assert_eq!(renders, 1);

        cache.revalidate("/dashboard/funds");
        assert!(!cache.contains("/dashboard/funds", None));
    }

    #[test]
    fn empty_search_shares_the_unfiltered_page() {
        let cache = ViewCache::new();

        cache
            .get_or_render("/dashboard/customers", Some(""), || Ok(html! { "all" }))
            .unwrap();

        assert!(cache.contains("/dashboard/customers", None));
    }

    #[test]
    fn revalidate_drops_every_search_variant_of_path() {
        let cache = ViewCache::new();
        for search in [None, Some("acme"), Some("zeta ltd")] {
            cache
                .get_or_render("/dashboard/transactions", search, || Ok(html! {}))
                .unwrap();
        }
        cache
            .get_or_render("/dashboard/customers", Some("acme"), || Ok(html! {}))
            .unwrap();

        cache.revalidate("/dashboard/transactions");

        assert!(!cache.contains("/dashboard/transactions", None));
        assert!(!cache.contains("/dashboard/transactions", Some("acme")));
        assert!(!cache.contains("/dashboard/transactions", Some("zeta ltd")));
        assert!(cache.contains("/dashboard/customers", Some("acme")));
    }

    #[test]
    fn failed_render_is_not_cached() {
        let cache = ViewCache::new();

        let result = cache.get_or_render("/dashboard/invoices", None, || Err(Error::NotFound));

        assert_eq!(result, Err(Error::NotFound));
        assert!(!cache.contains("/dashboard/invoices", None));
    }

    #[test]
    fn distinct_searches_stay_within_capacity() {
        let cache = ViewCache::with_capacity(10);

        for i in 0..200 {
            let search = format!("search {i}");
            cache
                .get_or_render("/dashboard/customers", Some(&search), || Ok(html! {}))
                .unwrap();
        }
        cache.pages.run_pending_tasks();

        assert!(
            cache.pages.entry_count() <= 10,
            "want at most 10 cached pages, got {}",
            cache.pages.entry_count()
        );
    }
}
