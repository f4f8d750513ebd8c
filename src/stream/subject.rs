use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ResourceError;

use super::{ResourceStream, Signal, Subscriber, Subscription};

#[derive(Debug, Clone)]
enum Terminal {
    Finished,
    Failed(ResourceError),
}

impl Terminal {
    fn to_signal<T>(&self) -> Signal<T> {
        match self {
            Self::Finished => Signal::Finished,
            Self::Failed(err) => Signal::Failed(err.clone()),
        }
    }
}

type SharedSubscriber<T> = Arc<Mutex<Subscriber<T>>>;

struct SubjectState<T> {
    subscribers: Vec<(u64, SharedSubscriber<T>)>,
    next_id: u64,
    replay: bool,
    current: Option<T>,
    terminal: Option<Terminal>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Multicast source that handlers emit through.
///
/// Every value sent is delivered to all current subscribers, in send order.
/// A subject created with [`Subject::with_value`] also replays its latest
/// value to each new subscriber synchronously during `subscribe`.
///
/// Delivery happens outside the subject's lock. A subscriber must not call
/// [`Subject::send`] on the same subject from inside its own callback.
pub struct Subject<T> {
    shared: Arc<Mutex<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Subject<T> {
    /// Creates a subject that only forwards values sent after subscription.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(false, None)
    }

    /// Creates a subject holding `value` that replays its latest value to new subscribers.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::with_state(true, Some(value))
    }

    fn with_state(replay: bool, current: Option<T>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SubjectState {
                subscribers: Vec::new(),
                next_id: 0,
                replay,
                current,
                terminal: None,
            })),
        }
    }

    /// Sends a value to every current subscriber. Ignored after termination.
    pub fn send(&self, value: T) {
        let targets = {
            let mut state = lock(&self.shared);
            if state.terminal.is_some() {
                return;
            }
            if state.replay {
                state.current = Some(value.clone());
            }
            state
                .subscribers
                .iter()
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect::<Vec<_>>()
        };

        for target in targets {
            lock(&target).value(value.clone());
        }
    }

    /// Terminates successfully. Later subscribers only see `Finished`.
    pub fn finish(&self) {
        self.terminate(Terminal::Finished);
    }

    /// Terminates with `err`. Later subscribers only see the failure.
    pub fn fail(&self, err: ResourceError) {
        self.terminate(Terminal::Failed(err));
    }

    fn terminate(&self, terminal: Terminal) {
        let targets = {
            let mut state = lock(&self.shared);
            if state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal.clone());
            std::mem::take(&mut state.subscribers)
        };

        for (_, target) in targets {
            lock(&target).send(terminal.to_signal());
        }
    }

    /// The latest value, for subjects created with [`Subject::with_value`].
    #[must_use]
    pub fn value(&self) -> Option<T> {
        lock(&self.shared).current.clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared).subscribers.len()
    }

    /// Returns true once `finish` or `fail` was called.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        lock(&self.shared).terminal.is_some()
    }

    /// A stream subscribed to this subject.
    #[must_use]
    pub fn stream(&self) -> ResourceStream<T> {
        let shared = Arc::clone(&self.shared);
        ResourceStream::from_fn(move |subscriber| attach(&shared, subscriber))
    }
}

impl<T: Clone + Send + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.shared);
        f.debug_struct("Subject")
            .field("subscribers", &state.subscribers.len())
            .field("replay", &state.replay)
            .field("terminal", &state.terminal)
            .finish()
    }
}

fn attach<T: Clone + Send + 'static>(
    shared: &Arc<Mutex<SubjectState<T>>>,
    mut subscriber: Subscriber<T>,
) -> Subscription {
    let mut state = lock(shared);
    if let Some(terminal) = state.terminal.clone() {
        drop(state);
        subscriber.send(terminal.to_signal());
        return Subscription::released();
    }

    let id = state.next_id;
    state.next_id += 1;
    let replay = if state.replay { state.current.clone() } else { None };

    let entry = Arc::new(Mutex::new(subscriber));
    state.subscribers.push((id, Arc::clone(&entry)));

    // Hold the subscriber before releasing the state lock so a concurrent
    // send cannot overtake the replayed value.
    let mut guard = lock(&entry);
    drop(state);
    if let Some(value) = replay {
        guard.value(value);
    }
    drop(guard);

    let weak = Arc::downgrade(shared);
    Subscription::new(move || {
        if let Some(shared) = weak.upgrade() {
            lock(&shared).subscribers.retain(|(sid, _)| *sid != id);
        }
    })
}
