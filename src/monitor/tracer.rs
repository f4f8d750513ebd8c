use super::event::ResourceEvent;
use super::ResourceObserver;

/// Observer that logs registry events to the `tracing` crate.
///
/// Log levels:
/// - `debug` - handler added
/// - `warn` - duplicate registration, handler not found
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use resource_registry::{ResourceMonitor, TracingObserver};
///
/// let tracer = Arc::new(TracingObserver);
/// let _subscription = ResourceMonitor::shared().add_observer(&tracer);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResourceObserver for TracingObserver {
    fn on_resource_event(&self, event: &ResourceEvent) {
        match event {
            ResourceEvent::HandlerAdded { category, handler } => {
                tracing::debug!(
                    category = %category,
                    handler = handler.name(),
                    "handler added"
                );
            }
            ResourceEvent::DuplicateRegistration { category, old, new } => {
                tracing::warn!(
                    category = %category,
                    old = old.name(),
                    new = new.name(),
                    "duplicate registration"
                );
            }
            ResourceEvent::HandlerNotFound { category } => {
                tracing::warn!(category = %category, "handler not found");
            }
        }
    }
}
