use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle to a live stream subscription.
///
/// Releasing the subscription detaches the subscriber from its source; no
/// signal reaches the subscriber afterwards. Release happens on [`cancel`]
/// or on drop, whichever comes first, and runs the source's release hook
/// exactly once.
///
/// [`cancel`]: Subscription::cancel
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    released: AtomicBool,
    on_release: Mutex<Option<ReleaseFn>>,
}

impl Subscription {
    /// Creates a live subscription that runs `on_release` when released.
    pub fn new<F>(on_release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            released: AtomicBool::new(false),
            on_release: Mutex::new(Some(Box::new(on_release))),
        }
    }

    /// Creates a subscription that is already released.
    ///
    /// Sources that deliver their terminal signal during `subscribe` return this.
    pub fn released() -> Self {
        Self {
            released: AtomicBool::new(true),
            on_release: Mutex::new(None),
        }
    }

    /// Releases the subscription.
    ///
    /// Idempotent: only the first call runs the release hook.
    pub fn cancel(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let hook = self
            .on_release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Returns true once the subscription has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}
