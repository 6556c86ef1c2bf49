use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::{mem, slice};

use futures::future::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::{
    batch_function::BatchFunction,
    cache::Cache,
    error::LoadError,
    loader::Dispatch,
    loader_op::{LoadRequest, LoaderOp},
    stats::LoaderStats,
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts it's `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of three states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Flushing the request queue and staging keys for loading.
/// 3. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame", and it is the resolution tick
/// that load calls are coalesced within.
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work arrives.
///
/// In state (2), the worker synchronously pulls requests from the queue until it is empty. Prime
/// and Clear requests are resolved immediately against the cache. For Load requests, the worker
/// checks if the request can be resolved immediately from the cache. If so, it immediately sends
/// the value on the load request's response channel, otherwise it determines which keys are
/// missing from the cache and stages them for loading. What closes the frame depends on the
/// [`Dispatch`] policy: with `OnIdle` the worker yields to the scheduler and keeps draining until
/// a yield brings in no new requests; with `Explicit` it only closes the frame when a
/// `LoaderOp::Dispatch` arrives.
///
/// In state (3), the loader invokes its `BatchFunction` once with the sorted, de-duplicated set of
/// keys it staged in (2). The values returned by the `BatchFunction` are inserted into the cache,
/// keys it did not return are cached as the empty value, and then outstanding Load requests are
/// resolved from the cache. If the `BatchFunction` fails, every outstanding Load request of the
/// frame receives the same error and nothing is cached.
pub struct LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Eq + Hash + Debug + Ord + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone + Default,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache,
    ContextT: Send + Sync + 'static,
{
    cache: CacheT,
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    dispatch: Dispatch,
    keys_to_load: Vec<K>,
    pending_requests: Vec<LoadRequest<K, V>>,
    dispatch_waiters: Vec<oneshot::Sender<()>>,
    context: ContextT,
    stats: LoaderStats,
    phantom_batch_function: PhantomData<F>,
    debug_name: &'static str,
}

impl<K, V, F, CacheT, ContextT> LoaderWorker<K, V, F, CacheT, ContextT>
where
    K: 'static + Eq + Hash + Debug + Copy + Ord + Send + Sync,
    V: 'static + Send + Debug + Clone + Default,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    CacheT: Cache<K = K, V = V>,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        cache: CacheT,
        request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
        context: ContextT,
        dispatch: Dispatch,
        debug_name: &'static str,
    ) -> Self {
        Self {
            cache,
            request_rx,
            dispatch,
            keys_to_load: Vec::new(),
            pending_requests: Vec::new(),
            dispatch_waiters: Vec::new(),
            context,
            stats: LoaderStats::default(),
            phantom_batch_function: PhantomData,
            debug_name,
        }
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first op.
            match self.request_rx.recv().await {
                None => {
                    tracing::debug!(
                        stats = ?self.stats,
                        cached = self.cache.len(),
                        "Tx channel closed. Terminating LoaderWorker."
                    );
                    return;
                }
                Some(op) => self.mux_op(op),
            }
            // Flush remainder of the op queue before executing load.
            self.drain_queue();
            if self.dispatch == Dispatch::OnIdle {
                while !self.pending_requests.is_empty() {
                    tokio::task::yield_now().await;
                    if !self.drain_queue() {
                        break;
                    }
                }
            }
            if self.frame_ready() {
                self.execute_load().await;
            }
        }
    }

    /// Pulls every op that is already queued. Returns whether there was any.
    fn drain_queue(&mut self) -> bool {
        let mut received = false;
        while let Some(Some(op)) = self.request_rx.recv().now_or_never() {
            self.mux_op(op);
            received = true;
        }
        received
    }

    fn frame_ready(&self) -> bool {
        match self.dispatch {
            Dispatch::OnIdle => {
                !self.pending_requests.is_empty() || !self.dispatch_waiters.is_empty()
            }
            Dispatch::Explicit => !self.dispatch_waiters.is_empty(),
        }
    }

    #[tracing::instrument(skip(self))]
    fn mux_op(&mut self, op: LoaderOp<K, V>) {
        match op {
            LoaderOp::Load(request) => {
                let keys_to_load = self.cache.missing(request.keys());
                let requested = request.keys().len();
                self.stats.record_load_request(requested, requested - keys_to_load.len());
                tracing::debug!(requested_keys = ?request.keys(), ?keys_to_load);
                if keys_to_load.is_empty() {
                    let values = self.cache.get(request.keys());
                    request.send_response(values);
                } else {
                    self.keys_to_load.extend(keys_to_load);
                    self.pending_requests.push(request);
                }
            }
            LoaderOp::Prime(key, value) => self.cache.insert(key, value),
            LoaderOp::PrimeMany(key_vals) => self.cache.insert_many(key_vals),
            LoaderOp::Clear(key) => self.clear(slice::from_ref(&key)),
            LoaderOp::ClearMany(keys) => self.clear(&keys),
            LoaderOp::Dispatch(waiter) => self.dispatch_waiters.push(waiter),
            LoaderOp::Stats(response_tx) => {
                if response_tx.send(self.stats).is_err() {
                    tracing::debug!("receiver dropped");
                }
            }
        }
    }

    fn clear(&mut self, keys: &[K]) {
        self.cache.remove(keys);
        // Pending requests resolve from the cache, so anything they were relying on has to be
        // fetched again.
        for key in keys {
            if self.pending_requests.iter().any(|request| request.keys().contains(key)) {
                self.keys_to_load.push(*key);
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        let mut keys = mem::take(&mut self.keys_to_load);
        keys.sort();
        keys.dedup();
        let requests = mem::take(&mut self.pending_requests);

        if !keys.is_empty() {
            self.stats.record_dispatch(keys.len());
            match F::load(&keys, &self.context).await {
                Ok(mut loaded) => {
                    tracing::debug!(dispatched = keys.len(), returned = loaded.len());
                    let values = keys
                        .into_iter()
                        .map(|key| {
                            let value = loaded.remove(&key).unwrap_or_default();
                            (key, value)
                        })
                        .collect::<Vec<_>>();
                    if !loaded.is_empty() {
                        tracing::debug!(unrequested = loaded.len(), "dropping unrequested keys");
                    }
                    self.cache.insert_many(values);
                }
                Err(source) => {
                    self.stats.record_fetch_failure();
                    tracing::warn!(
                        loader = self.debug_name,
                        error = %source,
                        keys = keys.len(),
                        requests = requests.len(),
                        "grouped fetch failed"
                    );
                    let error = LoadError::Fetch { loader: self.debug_name, source };
                    for request in requests {
                        request.send_error(error.clone());
                    }
                    self.ack_dispatch();
                    return;
                }
            }
        }

        for request in requests {
            let values = self.cache.get(request.keys());
            request.send_response(values);
        }
        self.ack_dispatch();
    }

    fn ack_dispatch(&mut self) {
        for waiter in self.dispatch_waiters.drain(..) {
            // The caller may have stopped waiting; the frame ran regardless.
            let _ = waiter.send(());
        }
    }
}
