use std::sync::Arc;

use crate::{loader::Dispatch, loaders::EntityLoaders, store::Store};

/// Everything a resolver of one request can reach: the shared store and that request's own
/// loaders.
pub struct RequestContext {
    store: Arc<dyn Store>,
    loaders: EntityLoaders,
    prefetch: bool,
}

impl RequestContext {
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn loaders(&self) -> &EntityLoaders {
        &self.loaders
    }

    /// Whether list resolvers should run the selection-aware prefetch.
    pub fn prefetch_enabled(&self) -> bool {
        self.prefetch
    }
}

/// Builds a fresh [`RequestContext`] per request. Holds only process-wide handles, so nothing
/// cached by one request can be observed by another.
#[derive(Clone)]
pub struct ContextBuilder {
    store: Arc<dyn Store>,
    dispatch: Dispatch,
    prefetch: bool,
}

impl ContextBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, dispatch: Dispatch::OnIdle, prefetch: true }
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Spawns a new set of loader workers, so this must run inside a tokio runtime.
    pub fn build(&self) -> RequestContext {
        tracing::trace!(
            dispatch = ?self.dispatch,
            prefetch = self.prefetch,
            "building request context"
        );
        RequestContext {
            store: self.store.clone(),
            loaders: EntityLoaders::new(self.store.clone(), self.dispatch),
            prefetch: self.prefetch,
        }
    }
}
