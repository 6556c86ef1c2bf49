use std::hash::Hash;
use std::ops::Drop;
use std::{collections::HashMap, fmt::Debug};

use tokio::sync::{mpsc, oneshot};
use tracing::{span, Level};
use tracing_futures::Instrument;

use crate::{
    batch_function::BatchFunction,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
    loader_worker::LoaderWorker,
    stats::LoaderStats,
};

/// What closes a loader's execution frame and sends the staged keys to the batch function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The worker dispatches as soon as its request queue stays empty across a scheduler yield,
    /// i.e. once every resolver that was runnable in the current pass has had its turn.
    #[default]
    OnIdle,
    /// Staged keys are only dispatched when [`Loader::dispatch`] is called. Meant for execution
    /// engines that flush after each resolution level.
    Explicit,
}

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users can call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying resource or
/// cache. The cache can be cleared with calls to [`Loader::clear`] and [`Loader::clear_many`], and values can be
/// added to the cache out-of-band through the use of [`Loader::prime`] and [`Loader::prime_many`].
///
/// `V` is the value of one key under the relation this loader serves: `Option<T>` for at-most-one
/// relations, `Vec<T>` for to-many relations. Keys without any associated record resolve to
/// `V::default()`.
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. Callers can invoke the
/// `Loader` from multiple parallel tasks, and the loader will enqueue the requested operations on
/// the request queue for processing by its `LoaderWorker`. The worker processes the requests
/// sequentially and provides results via response oneshot channels back to the Loader.
///
/// A loader lives as long as one request. Dropping it stops its worker.
pub struct Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
    name: &'static str,
}

impl<K, V> Drop for Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Hash + Send + Sync,
    V: 'static + Send + Debug + Clone + Default,
{
    /// Creates a new Loader for the provided BatchFunction and Context type, dispatching on idle.
    ///
    /// Note: the batch function is passed in as a marker for type inference.
    ///
    /// Must be called from within a tokio runtime; the worker is spawned immediately.
    pub fn new<F, ContextT>(batch_fn: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        Self::with_dispatch(batch_fn, context, Dispatch::OnIdle)
    }

    /// Creates a new Loader with the given [`Dispatch`] policy.
    pub fn with_dispatch<F, ContextT>(_: F, context: ContextT, dispatch: Dispatch) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        let name = std::any::type_name::<F>();
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = LoaderWorker::<K, V, F, HashMap<K, V>, ContextT>::new(
            HashMap::new(),
            rx,
            context,
            dispatch,
            name,
        );
        let span = span!(Level::TRACE, "LoaderWorker", loader = name, ?dispatch);
        Self {
            request_tx: tx,
            load_task_handle: tokio::task::spawn(worker.start().instrument(span)),
            name,
        }
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Loads a value from the underlying resource.
    ///
    /// Resolves to the relation's empty value if the BatchFunction found nothing for the key, and
    /// to [`LoadError::Fetch`] if the grouped fetch this key was part of failed.
    ///
    /// If the value is already in the loader cache, it is returned as soon as it is processed.
    /// Otherwise, the requested key is enqueued for batch loading in the next loader execution
    /// frame.
    pub async fn load(&self, key: K) -> Result<V, LoadError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::One(key, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::WorkerGone(self.name))?
    }

    /// Loads many values at once, in the order of `keys`.
    ///
    /// If all the values are already present in the loader cache, they are returned as soon as the
    /// request is processed by the worker. Otherwise, the missing keys are enqueued for batch
    /// loading in the next loader execution frame.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<V>, LoadError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(LoaderOp::Load(LoadRequest::Many(keys, response_tx)))?;
        response_rx.await.map_err(|_| LoadError::WorkerGone(self.name))?
    }

    /// Adds a value to the cache, replacing any value already cached for `key`.
    pub fn prime(&self, key: K, value: V) -> Result<(), LoadError> {
        self.send(LoaderOp::Prime(key, value))
    }

    /// Adds many values to the cache at once.
    pub fn prime_many(&self, key_vals: Vec<(K, V)>) -> Result<(), LoadError> {
        self.send(LoaderOp::PrimeMany(key_vals))
    }

    /// Removes a value from the cache.
    ///
    /// This key will be reloaded when it is next requested.
    pub fn clear(&self, key: K) -> Result<(), LoadError> {
        self.send(LoaderOp::Clear(key))
    }

    /// Removes multiple values from the cache at once.
    ///
    /// These keys will be reloaded when requested.
    pub fn clear_many(&self, keys: Vec<K>) -> Result<(), LoadError> {
        self.send(LoaderOp::ClearMany(keys))
    }

    /// Closes the current execution frame: everything staged so far is sent to the batch function
    /// in one call. Returns once every load of that frame has been answered.
    ///
    /// This is the only way a loader built with [`Dispatch::Explicit`] ever fetches. Under
    /// [`Dispatch::OnIdle`] it just forces the frame to close early.
    pub async fn dispatch(&self) -> Result<(), LoadError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(LoaderOp::Dispatch(done_tx))?;
        done_rx.await.map_err(|_| LoadError::WorkerGone(self.name))
    }

    /// Counters for this loader so far.
    pub async fn stats(&self) -> Result<LoaderStats, LoadError> {
        let (stats_tx, stats_rx) = oneshot::channel();
        self.send(LoaderOp::Stats(stats_tx))?;
        stats_rx.await.map_err(|_| LoadError::WorkerGone(self.name))
    }

    /// Type name of the batch function this loader runs, as used in its errors and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, op: LoaderOp<K, V>) -> Result<(), LoadError> {
        self.request_tx.send(op).map_err(|_| LoadError::WorkerGone(self.name))
    }
}
