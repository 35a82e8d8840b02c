use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::models::Searchable;

/// Shared search term, passed explicitly to every list that filters by it.
///
/// Clones share the same term. Updates are synchronous and visible to all
/// clones and subscribers immediately; nothing is debounced or persisted.
#[derive(Clone)]
pub struct SearchContext {
    term: Arc<watch::Sender<String>>,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchContext {
    pub fn new() -> Self {
        let (term, _) = watch::channel(String::new());
        Self {
            term: Arc::new(term),
        }
    }

    /// Replace the term and notify subscribers
    pub fn set_term(&self, term: impl Into<String>) {
        let term = term.into();
        trace!(term = %term, "Search term updated");
        self.term.send_replace(term);
    }

    pub fn clear(&self) {
        self.set_term(String::new());
    }

    pub fn term(&self) -> String {
        self.term.borrow().clone()
    }

    /// Receiver that is marked changed on every update
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.term.subscribe()
    }

    /// Items matching the current term, in their original order
    pub fn filter<'a, T: Searchable>(&self, items: &'a [T]) -> Vec<&'a T> {
        let term = self.term.borrow();
        filter_items(items, &term)
    }
}

/// Case-insensitive substring match; an empty term matches everything
pub fn matches_term(text: &str, term: &str) -> bool {
    term.is_empty() || text.to_lowercase().contains(&term.to_lowercase())
}

pub fn filter_items<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_term(item.search_text(), term))
        .collect()
}
