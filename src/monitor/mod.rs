//! Observation of registry lifecycle events.
//!
//! The monitor is a fan-out bus: the registry records [`ResourceEvent`]s and
//! the monitor delivers them, synchronously and in attach order, to every
//! live observer. It never changes registry behavior.
//!
//! Observers are held weakly. Keep the `Arc` you attach alive for as long as
//! you want events, and keep the returned [`ObserverSubscription`] to detach.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use resource_registry::{ResourceEvent, ResourceMonitor};
//!
//! let monitor = ResourceMonitor::new();
//! let logger = Arc::new(|event: &ResourceEvent| {
//!     println!("[{}] {}", event.kind(), event.category());
//! });
//! let subscription = monitor.add_observer(&logger);
//!
//! // Detach
//! subscription.cancel();
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use crate::config::MonitorConfig;

/// Event and observer id types.
pub mod event;
/// Observer detach handle.
pub mod subscription;
/// Built-in `tracing` observer.
pub mod tracer;

pub use event::{ObserverId, ResourceEvent};
pub use subscription::ObserverSubscription;
pub use tracer::TracingObserver;

static SHARED: OnceLock<ResourceMonitor> = OnceLock::new();

/// Receives registry events.
pub trait ResourceObserver: Send + Sync {
    /// Called synchronously from [`ResourceMonitor::record`].
    fn on_resource_event(&self, event: &ResourceEvent);
}

impl<F> ResourceObserver for F
where
    F: Fn(&ResourceEvent) + Send + Sync,
{
    fn on_resource_event(&self, event: &ResourceEvent) {
        self(event);
    }
}

struct ObserverEntry {
    id: ObserverId,
    observer: Weak<dyn ResourceObserver>,
}

pub(crate) struct MonitorShared {
    config: MonitorConfig,
    next_id: AtomicU64,
    observers: RwLock<Vec<ObserverEntry>>,
}

impl MonitorShared {
    fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        observers.len() != before
    }
}

impl fmt::Debug for MonitorShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MonitorShared")
            .field("config", &self.config)
            .field("observers", &observers.len())
            .finish()
    }
}

/// Fan-out bus for registry events.
///
/// Cloning yields another handle to the same observer list.
#[derive(Clone)]
pub struct ResourceMonitor {
    shared: Arc<MonitorShared>,
}

impl ResourceMonitor {
    /// Creates a monitor with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Creates a monitor with no observers.
    #[must_use]
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                config,
                next_id: AtomicU64::new(0),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The process-wide monitor used by [`ResourceRegistry::shared`].
    ///
    /// [`ResourceRegistry::shared`]: crate::ResourceRegistry::shared
    #[must_use]
    pub fn shared() -> &'static Self {
        SHARED.get_or_init(Self::new)
    }

    /// Attaches `observer` and returns the handle that detaches it.
    ///
    /// The monitor keeps only a weak reference.
    pub fn add_observer<O>(&self, observer: &Arc<O>) -> ObserverSubscription
    where
        O: ResourceObserver + 'static,
    {
        let id = ObserverId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn ResourceObserver> = weak;

        let mut observers = self
            .shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if observers.len() >= self.shared.config.compact_threshold {
            observers.retain(|entry| entry.observer.strong_count() > 0);
        }
        observers.push(ObserverEntry { id, observer: weak });
        drop(observers);

        ObserverSubscription::new(id, Arc::downgrade(&self.shared))
    }

    /// Detaches the observer with `id`. Returns false if it was not attached.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.shared.remove(id)
    }

    /// Delivers `event` to every live observer, in attach order.
    ///
    /// Does no work when nothing is attached. Observers may attach or detach
    /// from inside the callback; the change applies from the next event.
    pub fn record(&self, event: &ResourceEvent) {
        let live: Vec<(ObserverId, Arc<dyn ResourceObserver>)> = {
            let observers = self
                .shared
                .observers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if observers.is_empty() {
                return;
            }
            observers
                .iter()
                .filter_map(|entry| entry.observer.upgrade().map(|observer| (entry.id, observer)))
                .collect()
        };

        for (id, observer) in live {
            if self.shared.config.isolate_observer_panics {
                let delivered = catch_unwind(AssertUnwindSafe(|| observer.on_resource_event(event)));
                if delivered.is_err() {
                    tracing::error!(observer_id = %id, event = event.kind(), "resource observer panicked");
                }
            } else {
                observer.on_resource_event(event);
            }
        }
    }

    /// Number of attached observers that are still alive.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.shared
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.observer.strong_count() > 0)
            .count()
    }

    /// Detaches every observer.
    pub fn reset(&self) {
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMonitor")
            .field("shared", &self.shared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ResourceCategory;
    use std::sync::Mutex;

    fn miss(category: ResourceCategory) -> ResourceEvent {
        ResourceEvent::HandlerNotFound { category }
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ResourceObserver for Recorder {
        fn on_resource_event(&self, event: &ResourceEvent) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event.category()));
        }
    }

    #[test]
    fn test_delivers_in_attach_order() {
        let monitor = ResourceMonitor::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Recorder { label: "a", log: Arc::clone(&log) });
        let b = Arc::new(Recorder { label: "b", log: Arc::clone(&log) });
        let _sa = monitor.add_observer(&a);
        let _sb = monitor.add_observer(&b);

        monitor.record(&miss(ResourceCategory::File));
        monitor.record(&miss(ResourceCategory::Web));

        assert_eq!(*log.lock().unwrap(), vec!["a:file", "b:file", "a:web", "b:web"]);
    }

    #[test]
    fn test_ids_increase() {
        let monitor = ResourceMonitor::new();
        let observer = Arc::new(|_: &ResourceEvent| {});
        let first = monitor.add_observer(&observer);
        let second = monitor.add_observer(&observer);
        assert!(first.id() < second.id());
        assert_eq!(first.id().as_u64(), 1);
        assert_eq!(second.id().to_string(), "observer-2");
    }

    #[test]
    fn test_cancel_is_idempotent_and_exact() {
        let monitor = ResourceMonitor::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Recorder { label: "a", log: Arc::clone(&log) });
        let b = Arc::new(Recorder { label: "b", log: Arc::clone(&log) });
        let sa = monitor.add_observer(&a);
        let _sb = monitor.add_observer(&b);

        sa.cancel();
        sa.cancel();
        assert!(sa.is_cancelled());
        assert!(!monitor.remove_observer(sa.id()));

        monitor.record(&miss(ResourceCategory::File));
        assert_eq!(*log.lock().unwrap(), vec!["b:file"]);
    }

    #[test]
    fn test_dead_observer_is_skipped() {
        let monitor = ResourceMonitor::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Recorder { label: "a", log: Arc::clone(&log) });
        let _sa = monitor.add_observer(&a);
        drop(a);

        assert_eq!(monitor.observer_count(), 0);
        monitor.record(&miss(ResourceCategory::File));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_compaction_drops_dead_entries() {
        let monitor = ResourceMonitor::with_config(MonitorConfig {
            compact_threshold: 2,
            ..MonitorConfig::default()
        });
        let mut subs = Vec::new();
        for _ in 0..2 {
            let dead = Arc::new(|_: &ResourceEvent| {});
            subs.push(monitor.add_observer(&dead));
        }
        let alive = Arc::new(|_: &ResourceEvent| {});
        subs.push(monitor.add_observer(&alive));

        let entries = monitor.shared.observers.read().unwrap().len();
        assert_eq!(entries, 1);
        assert_eq!(monitor.observer_count(), 1);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let monitor = ResourceMonitor::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let bad = Arc::new(|_: &ResourceEvent| panic!("observer bug"));
        let good = Arc::new(Recorder { label: "good", log: Arc::clone(&log) });
        let _s1 = monitor.add_observer(&bad);
        let _s2 = monitor.add_observer(&good);

        monitor.record(&miss(ResourceCategory::Web));
        assert_eq!(*log.lock().unwrap(), vec!["good:web"]);
    }

    #[test]
    fn test_observer_may_detach_itself_during_record() {
        let monitor = ResourceMonitor::new();
        let slot: Arc<Mutex<Option<ObserverSubscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(Mutex::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let observer = Arc::new(move |_: &ResourceEvent| {
            *inner_hits.lock().unwrap() += 1;
            if let Some(sub) = inner_slot.lock().unwrap().take() {
                sub.cancel();
            }
        });
        *slot.lock().unwrap() = Some(monitor.add_observer(&observer));

        monitor.record(&miss(ResourceCategory::File));
        monitor.record(&miss(ResourceCategory::File));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_subscription_outlives_monitor() {
        let monitor = ResourceMonitor::new();
        let observer = Arc::new(|_: &ResourceEvent| {});
        let sub = monitor.add_observer(&observer);
        drop(monitor);
        sub.cancel();
        assert!(sub.is_cancelled());
    }

    #[test]
    fn test_reset_detaches_all() {
        let monitor = ResourceMonitor::new();
        let observer = Arc::new(|_: &ResourceEvent| {});
        let _sub = monitor.add_observer(&observer);
        assert_eq!(monitor.observer_count(), 1);
        monitor.reset();
        assert_eq!(monitor.observer_count(), 0);
    }
}
