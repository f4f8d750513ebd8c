//! Push-based resource streams.
//!
//! A [`ResourceStream`] emits zero or more values followed by at most one
//! terminal signal ([`Signal::Finished`] or [`Signal::Failed`]). Subscribing
//! returns an explicit [`Subscription`]; releasing it detaches the subscriber.
//!
//! Handlers usually emit through a [`Subject`], which multicasts to every
//! current subscriber. The single-shot bridge lives in [`bridge`].

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ResourceError, ResourceResult};
use crate::resource::ResourceValue;

/// Single-shot bridge over streams.
pub mod bridge;
/// Multicast source.
pub mod subject;
/// Subscription handle.
pub mod subscription;

pub use bridge::SingleValue;
pub use subject::Subject;
pub use subscription::Subscription;

/// A stream emission.
#[derive(Debug, Clone)]
pub enum Signal<T> {
    /// A value.
    Value(T),
    /// Successful termination.
    Finished,
    /// Failed termination.
    Failed(ResourceError),
}

impl<T> Signal<T> {
    /// Returns true for [`Signal::Finished`] and [`Signal::Failed`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed(_))
    }

    /// Maps the carried value, keeping terminal signals as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Signal<U> {
        match self {
            Self::Value(value) => Signal::Value(f(value)),
            Self::Finished => Signal::Finished,
            Self::Failed(err) => Signal::Failed(err),
        }
    }
}

/// Receiving end handed to a stream source for one subscription.
///
/// Drops every signal after the first terminal one, and every signal after
/// the owning [`Subscription`] was released.
pub struct Subscriber<T> {
    observer: Box<dyn FnMut(Signal<T>) + Send>,
    active: Arc<AtomicBool>,
    terminated: bool,
}

impl<T> Subscriber<T> {
    fn new(observer: Box<dyn FnMut(Signal<T>) + Send>, active: Arc<AtomicBool>) -> Self {
        Self {
            observer,
            active,
            terminated: false,
        }
    }

    /// Delivers a signal. Returns false if the subscriber no longer accepts signals.
    pub fn send(&mut self, signal: Signal<T>) -> bool {
        if self.is_closed() {
            return false;
        }
        if signal.is_terminal() {
            self.terminated = true;
        }
        (self.observer)(signal);
        true
    }

    /// Delivers a value.
    pub fn value(&mut self, value: T) -> bool {
        self.send(Signal::Value(value))
    }

    /// Delivers successful termination.
    pub fn finish(&mut self) -> bool {
        self.send(Signal::Finished)
    }

    /// Delivers failed termination.
    pub fn fail(&mut self, err: ResourceError) -> bool {
        self.send(Signal::Failed(err))
    }

    /// Returns true after a terminal signal or after the subscription was released.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.terminated || !self.active.load(Ordering::Acquire)
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("terminated", &self.terminated)
            .field("active", &self.active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

type SubscribeFn<T> = dyn Fn(Subscriber<T>) -> Subscription + Send + Sync;

/// A lazily-subscribed, possibly never-ending stream of values.
///
/// Cloning is cheap; every clone subscribes to the same source.
pub struct ResourceStream<T> {
    source: Arc<SubscribeFn<T>>,
}

impl<T> Clone for ResourceStream<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for ResourceStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStream").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ResourceStream<T> {
    /// Creates a stream from a subscribe function.
    ///
    /// `subscribe` runs once per subscription. It may deliver signals
    /// synchronously before returning, or move the [`Subscriber`] elsewhere and
    /// deliver later. The returned [`Subscription`] is released when the
    /// caller cancels.
    pub fn from_fn<F>(subscribe: F) -> Self
    where
        F: Fn(Subscriber<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(subscribe),
        }
    }

    /// A stream that fails immediately without emitting a value.
    #[must_use]
    pub fn fail(err: ResourceError) -> Self {
        Self::from_fn(move |mut subscriber| {
            subscriber.fail(err.clone());
            Subscription::released()
        })
    }

    /// A stream that finishes immediately without emitting a value.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_fn(|mut subscriber| {
            subscriber.finish();
            Subscription::released()
        })
    }

    /// A stream that never emits and never terminates.
    ///
    /// Each subscriber is kept alive until its subscription is released.
    #[must_use]
    pub fn never() -> Self {
        Self::from_fn(|subscriber| Subscription::new(move || drop(subscriber)))
    }

    /// Subscribes `observer` to the stream.
    ///
    /// The observer receives values in emission order, then at most one
    /// terminal signal. It receives nothing once the returned subscription is
    /// released.
    ///
    /// If the source completed during the call and handed back a released
    /// subscription, the returned subscription is released as well.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: FnMut(Signal<T>) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let subscriber = Subscriber::new(Box::new(observer), Arc::clone(&active));
        let upstream = (self.source)(subscriber);
        if upstream.is_released() {
            active.store(false, Ordering::Release);
            return Subscription::released();
        }
        Subscription::new(move || {
            active.store(false, Ordering::Release);
            upstream.cancel();
        })
    }

    /// Transforms every value.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> ResourceStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        ResourceStream::from_fn(move |mut subscriber: Subscriber<U>| {
            let f = Arc::clone(&f);
            upstream.subscribe(move |signal| {
                subscriber.send(signal.map(|value| f(value)));
            })
        })
    }

    /// Transforms every value with a fallible function.
    ///
    /// The first error terminates the downstream stream with that error.
    #[must_use]
    pub fn try_map<U, F>(&self, f: F) -> ResourceStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> ResourceResult<U> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        ResourceStream::from_fn(move |mut subscriber: Subscriber<U>| {
            let f = Arc::clone(&f);
            upstream.subscribe(move |signal| {
                if subscriber.is_closed() {
                    return;
                }
                let mapped = match signal {
                    Signal::Value(value) => match f(value) {
                        Ok(mapped) => Signal::Value(mapped),
                        Err(err) => Signal::Failed(err),
                    },
                    Signal::Finished => Signal::Finished,
                    Signal::Failed(err) => Signal::Failed(err),
                };
                subscriber.send(mapped);
            })
        })
    }

    /// Calls `f` with every value as it passes through.
    ///
    /// Values, ordering and termination are unchanged.
    #[must_use]
    pub fn inspect<F>(&self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.map(move |value| {
            f(&value);
            value
        })
    }
}

impl<T: Clone + Send + Sync + 'static> ResourceStream<T> {
    /// A stream that emits `value` and finishes.
    #[must_use]
    pub fn just(value: T) -> Self {
        Self::from_values(vec![value])
    }

    /// A stream that emits every item in order and finishes.
    ///
    /// Stops early if the subscriber releases its subscription.
    #[must_use]
    pub fn from_values(items: Vec<T>) -> Self {
        Self::from_fn(move |mut subscriber| {
            for item in items.iter().cloned() {
                if !subscriber.value(item) {
                    return Subscription::released();
                }
            }
            subscriber.finish();
            Subscription::released()
        })
    }
}

impl<T: Any + Send + Sync> ResourceStream<T> {
    /// Type-erases values for returning from a handler.
    #[must_use]
    pub fn erase(&self) -> ResourceStream<ResourceValue> {
        self.map(ResourceValue::native)
    }
}
