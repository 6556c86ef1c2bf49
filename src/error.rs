use async_graphql::Pos;
use thiserror::Error;

/// Failure reported by the backing [`Store`](crate::store::Store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query rejected by store: {0}")]
    Query(String),
}

/// Error returned to callers of [`Loader::load`](crate::Loader::load) and friends.
///
/// A failed grouped fetch is fanned out to every request that was part of that dispatch, so this
/// type is `Clone` and carries the store error by value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("grouped fetch in {loader} failed: {source}")]
    Fetch {
        loader: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("worker of {0} is no longer running")]
    WorkerGone(&'static str),
}

impl LoadError {
    /// The store error behind a failed fetch, if that is what this is.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            LoadError::Fetch { source, .. } => Some(source),
            LoadError::WorkerGone(_) => None,
        }
    }
}

/// A static validation failure. Requests that produce any of these are never executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub locations: Vec<Pos>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self { message: message.into(), locations: vec![pos] }
    }
}

impl From<ValidationError> for async_graphql::ServerError {
    fn from(err: ValidationError) -> Self {
        let mut server_error = async_graphql::ServerError::new(err.message, None);
        server_error.locations = err.locations;
        server_error
    }
}
