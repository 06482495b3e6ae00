//! Application state shared across handlers.

use std::sync::Arc;

use orderflow_storage::{OrderCache, OrderStore};

use crate::services::OrderLookup;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store, the cache, and the lookup service built over them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    lookup: OrderLookup,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Aggregate store, shared with the lookup service
    /// * `cache` - Cache store, shared with the lookup service
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        let lookup = OrderLookup::new(Arc::clone(&store), Arc::clone(&cache));

        Self {
            inner: Arc::new(AppStateInner {
                store,
                cache,
                lookup,
            }),
        }
    }

    /// Get a reference to the aggregate store.
    #[must_use]
    pub fn store(&self) -> &dyn OrderStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the cache store.
    #[must_use]
    pub fn cache(&self) -> &dyn OrderCache {
        self.inner.cache.as_ref()
    }

    /// Get a reference to the lookup service.
    #[must_use]
    pub fn lookup(&self) -> &OrderLookup {
        &self.inner.lookup
    }
}
