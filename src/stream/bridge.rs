//! Collapsing a stream into exactly one result.
//!
//! All three forms share one contract:
//!
//! - the first value resolves the bridge with `Ok(value)` and releases the
//!   subscription immediately; later emissions are never observed;
//! - `Finished` before any value resolves with
//!   [`ResourceError::NoValueReceivedOnCompletion`];
//! - `Failed(err)` before any value resolves with `Err(err)`;
//! - a failure after the bridge resolved is dropped, the subscription is
//!   already gone.
//!
//! A value delivered synchronously while subscribing releases the
//! subscription before the bridging call returns.
//!
//! No timeout is enforced. A stream that neither emits nor terminates leaves
//! the bridge pending for as long as its source is alive. A source that drops
//! its subscriber without emitting or terminating resolves every form with
//! [`ResourceError::NoValueReceivedOnCompletion`].

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tokio::sync::oneshot;

use crate::error::{ResourceError, ResourceResult};

use super::{ResourceStream, Signal, Subscription};

struct BridgeState {
    resolved: bool,
    subscription: Option<Subscription>,
}

/// Holds the bridge callback until it runs.
///
/// Dropped unfired (the source let go of its subscriber), it reports
/// `NoValueReceivedOnCompletion`.
struct PendingCallback<T, F>
where
    F: FnOnce(ResourceResult<T>),
{
    callback: Option<F>,
    _result: PhantomData<fn(T)>,
}

impl<T, F> PendingCallback<T, F>
where
    F: FnOnce(ResourceResult<T>),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
            _result: PhantomData,
        }
    }

    fn fire(&mut self, result: ResourceResult<T>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<T, F> Drop for PendingCallback<T, F>
where
    F: FnOnce(ResourceResult<T>),
{
    fn drop(&mut self) {
        self.fire(Err(ResourceError::NoValueReceivedOnCompletion));
    }
}

fn into_result<T>(signal: Signal<T>) -> ResourceResult<T> {
    match signal {
        Signal::Value(value) => Ok(value),
        Signal::Finished => Err(ResourceError::NoValueReceivedOnCompletion),
        Signal::Failed(err) => Err(err),
    }
}

impl<T: Send + 'static> ResourceStream<T> {
    /// Callback form: invokes `callback` exactly once with the first value or the error.
    pub fn receive_once<F>(&self, callback: F)
    where
        F: FnOnce(ResourceResult<T>) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(BridgeState {
            resolved: false,
            subscription: None,
        }));

        let observer_state = Arc::clone(&state);
        let mut callback = PendingCallback::new(callback);
        let subscription = self.subscribe(move |signal| {
            let held = {
                let mut guard = observer_state.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.resolved {
                    return;
                }
                guard.resolved = true;
                guard.subscription.take()
            };

            if let Some(subscription) = held {
                subscription.cancel();
            }
            callback.fire(into_result(signal));
        });

        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.resolved {
            // Resolved synchronously inside `subscribe`.
            drop(guard);
            subscription.cancel();
        } else {
            guard.subscription = Some(subscription);
        }
    }

    /// Single-resolved-value form.
    ///
    /// Subscribes immediately; the returned [`SingleValue`] holds the result
    /// once the stream produces it.
    #[must_use]
    pub fn as_single(&self) -> SingleValue<T> {
        let (tx, rx) = bounded(1);
        self.receive_once(move |result| {
            let _ = tx.send(result);
        });
        SingleValue { rx, result: None }
    }

    /// Awaitable form: suspends the calling task until the stream resolves.
    ///
    /// Subscribes on first poll. Only the awaiting task is suspended; the
    /// producer is never blocked.
    pub fn first(&self) -> impl Future<Output = ResourceResult<T>> + Send + 'static {
        let stream = self.clone();
        async move {
            let (tx, rx) = oneshot::channel();
            stream.receive_once(move |result| {
                let _ = tx.send(result);
            });
            rx.await
                .unwrap_or(Err(ResourceError::NoValueReceivedOnCompletion))
        }
    }
}

/// Result of a stream collapsed to a single value.
///
/// If the stream's source is dropped without ever emitting or terminating,
/// the result is [`ResourceError::NoValueReceivedOnCompletion`].
pub struct SingleValue<T> {
    rx: Receiver<ResourceResult<T>>,
    result: Option<ResourceResult<T>>,
}

impl<T> SingleValue<T> {
    /// Blocks the calling thread until the result is available.
    ///
    /// Does not time out.
    pub fn wait(self) -> ResourceResult<T> {
        if let Some(result) = self.result {
            return result;
        }
        self.rx
            .recv()
            .unwrap_or(Err(ResourceError::NoValueReceivedOnCompletion))
    }

    /// Returns the result if it is available, without blocking.
    pub fn try_result(&mut self) -> Option<&ResourceResult<T>> {
        if self.result.is_none() {
            match self.rx.try_recv() {
                Ok(result) => self.result = Some(result),
                Err(TryRecvError::Disconnected) => {
                    self.result = Some(Err(ResourceError::NoValueReceivedOnCompletion));
                }
                Err(TryRecvError::Empty) => {}
            }
        }
        self.result.as_ref()
    }

    /// Returns true once the result is available.
    pub fn is_resolved(&mut self) -> bool {
        self.try_result().is_some()
    }
}

impl<T> fmt::Debug for SingleValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleValue")
            .field("resolved", &self.result.is_some())
            .finish_non_exhaustive()
    }
}
