use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use super::event::ObserverId;
use super::MonitorShared;

/// Handle to an attached observer.
///
/// Dropping the handle detaches the observer.
#[derive(Debug)]
#[must_use = "dropping an ObserverSubscription detaches the observer"]
pub struct ObserverSubscription {
    id: ObserverId,
    monitor: Weak<MonitorShared>,
    removed: AtomicBool,
}

impl ObserverSubscription {
    pub(super) fn new(id: ObserverId, monitor: Weak<MonitorShared>) -> Self {
        Self {
            id,
            monitor,
            removed: AtomicBool::new(false),
        }
    }

    /// Identifier of the attached observer.
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Detaches the observer.
    ///
    /// Idempotent; a no-op if the monitor is gone or the entry was already
    /// removed through another path.
    pub fn cancel(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(monitor) = self.monitor.upgrade() {
            monitor.remove(self.id);
        }
    }

    /// Returns true once [`cancel`](Self::cancel) ran or the handle was dropped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
