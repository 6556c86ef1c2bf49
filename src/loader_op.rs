use std::slice;

use tokio::sync::oneshot;

use crate::{error::LoadError, stats::LoaderStats};

/// Set of possible requests that can be sent to the [`LoaderWorker`](crate::loader_worker::LoaderWorker)
///
/// Load, Prime and Clear each have a single and many variant for convenience. Dispatch and Stats
/// are control operations.
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Fetch data from the resource wrapped by this data loader (or the cache).
    Load(LoadRequest<K, V>),
    /// Add values to the cache that were fetched from elsewhere.
    Prime(K, V),
    PrimeMany(Vec<(K, V)>),
    /// Remove values from the cache so that they will be reloaded when they are next requested.
    Clear(K),
    ClearMany(Vec<K>),
    /// Close the current execution frame: run the batch function for all staged keys now. The
    /// sender is notified once every pending load of that frame has been answered.
    Dispatch(oneshot::Sender<()>),
    /// Report the worker's counters.
    Stats(oneshot::Sender<LoaderStats>),
}

pub type LoadResponse<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<LoadResponse<V>>),
    Many(Vec<K>, oneshot::Sender<LoadResponse<Vec<V>>>),
}

impl<K, V> LoadRequest<K, V>
where
    V: Send + Clone + Default + std::fmt::Debug,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Answers the request with the values for its keys, in key order. A missing value is the
    /// relation's empty value.
    pub fn send_response<'a, I>(self, values: I)
    where
        I: IntoIterator<Item = Option<&'a V>>,
        V: 'a,
    {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = values.into_iter().next().flatten().cloned().unwrap_or_default();
                if response_tx.send(Ok(response)).is_err() {
                    tracing::debug!("receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                let response = values
                    .into_iter()
                    .map(|opt| opt.cloned().unwrap_or_default())
                    .collect::<Vec<_>>();
                if response_tx.send(Ok(response)).is_err() {
                    tracing::debug!("receiver dropped");
                }
            }
        }
    }

    pub fn send_error(self, error: LoadError) {
        let delivered = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error)).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error)).is_ok(),
        };
        if !delivered {
            tracing::debug!("receiver dropped");
        }
    }
}
