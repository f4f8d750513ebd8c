//! Category-keyed handler registry.
//!
//! The registry maps each [`ResourceCategory`] to at most one handler.
//! Registering a second handler under an occupied category replaces the first
//! and is reported to the monitor as a duplicate registration; it is not an
//! error. Dispatching a request whose category has no handler is reported as
//! a dispatch miss and fails the request.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use resource_registry::{
//!     FnHandler, Resource, ResourceCategory, ResourceExt, ResourceRegistry, ResourceStream,
//!     ResourceValue,
//! };
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! impl Resource for Greeting {
//!     type Extra = ();
//!     type Response = String;
//!
//!     fn category() -> ResourceCategory {
//!         ResourceCategory::custom("greeting")
//!     }
//! }
//!
//! let registry = ResourceRegistry::new();
//! registry.register(Arc::new(FnHandler::new(
//!     "greeter",
//!     vec![ResourceCategory::custom("greeting")],
//!     |request| {
//!         let name = request.resource::<Greeting>().map(|g| g.name.clone()).unwrap_or_default();
//!         ResourceStream::just(ResourceValue::native(format!("hello {name}")))
//!     },
//! )));
//!
//! let reply = Greeting { name: "world".into() }.open_once_in(&registry, ()).wait().unwrap();
//! assert_eq!(reply, "hello world");
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::category::ResourceCategory;
use crate::config::RegistryConfig;
use crate::error::ResourceError;
use crate::monitor::{ResourceEvent, ResourceMonitor};
use crate::resource::{LoadRequest, Resource, ResourceHandler, ResourceValue};
use crate::stream::ResourceStream;

static SHARED: OnceLock<ResourceRegistry> = OnceLock::new();

type HandlerTable = HashMap<ResourceCategory, Arc<dyn ResourceHandler>>;

/// Dispatch table from category to handler.
pub struct ResourceRegistry {
    config: RegistryConfig,
    handlers: RwLock<HandlerTable>,
    monitor: ResourceMonitor,
}

impl ResourceRegistry {
    /// Creates an empty registry with its own monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with its own monitor built from `config.monitor`.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let monitor = ResourceMonitor::with_config(config.monitor.clone());
        Self::with_parts(config, monitor)
    }

    /// Creates an empty registry reporting to `monitor`.
    #[must_use]
    pub fn with_monitor(monitor: ResourceMonitor) -> Self {
        Self::with_parts(RegistryConfig::default(), monitor)
    }

    /// Creates an empty registry from explicit parts.
    #[must_use]
    pub fn with_parts(config: RegistryConfig, monitor: ResourceMonitor) -> Self {
        Self {
            config,
            handlers: RwLock::new(HashMap::new()),
            monitor,
        }
    }

    /// The process-wide registry, reporting to [`ResourceMonitor::shared`].
    ///
    /// Created on first use.
    pub fn shared() -> &'static Self {
        SHARED.get_or_init(|| Self::with_monitor(ResourceMonitor::shared().clone()))
    }

    /// Monitor this registry reports to.
    #[must_use]
    pub const fn monitor(&self) -> &ResourceMonitor {
        &self.monitor
    }

    fn read(&self) -> RwLockReadGuard<'_, HandlerTable> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HandlerTable> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handler` for every category it declares.
    ///
    /// An occupied category is overwritten and reported as
    /// [`ResourceEvent::DuplicateRegistration`]. Every category produces a
    /// [`ResourceEvent::HandlerAdded`].
    pub fn register<H: ResourceHandler>(&self, handler: Arc<H>) {
        self.register_dyn(handler);
    }

    /// [`ResourceRegistry::register`] for an already type-erased handler.
    pub fn register_dyn(&self, handler: Arc<dyn ResourceHandler>) {
        let mut categories = handler.categories();
        let mut seen = Vec::with_capacity(categories.len());
        categories.retain(|category| {
            if seen.contains(category) {
                false
            } else {
                seen.push(category.clone());
                true
            }
        });

        let mut events = Vec::with_capacity(categories.len());
        {
            let mut table = self.write();
            for category in categories {
                if let Some(old) = table.insert(category.clone(), Arc::clone(&handler)) {
                    events.push(ResourceEvent::DuplicateRegistration {
                        category: category.clone(),
                        old,
                        new: Arc::clone(&handler),
                    });
                }

                events.push(ResourceEvent::HandlerAdded {
                    category,
                    handler: Arc::clone(&handler),
                });
            }
        }

        for event in &events {
            self.monitor.record(event);
        }
    }

    /// Removes the handler registered for `category`.
    pub fn unregister(&self, category: &ResourceCategory) -> Option<Arc<dyn ResourceHandler>> {
        let removed = self.write().remove(category);
        if let Some(handler) = &removed {
            tracing::debug!(category = %category, handler = handler.name(), "resource handler unregistered");
        }
        removed
    }

    /// Handler registered for `category`.
    #[must_use]
    pub fn handler(&self, category: &ResourceCategory) -> Option<Arc<dyn ResourceHandler>> {
        self.read().get(category).cloned()
    }

    /// Returns true if a handler is registered for `category`.
    #[must_use]
    pub fn contains(&self, category: &ResourceCategory) -> bool {
        self.read().contains_key(category)
    }

    /// Categories that currently have a handler.
    #[must_use]
    pub fn categories(&self) -> Vec<ResourceCategory> {
        self.read().keys().cloned().collect()
    }

    /// Number of occupied categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Removes every handler. Observers attached to the monitor stay attached.
    pub fn reset(&self) {
        self.write().clear();
    }

    /// Routes `resource` to the handler for its category.
    ///
    /// The handler's stream is returned with each value converted to
    /// `R::Response`; a value that does not convert terminates the stream
    /// with [`ResourceError::ResourceTypeError`]. Without a handler, records
    /// [`ResourceEvent::HandlerNotFound`] and returns a stream that fails
    /// immediately with [`ResourceError::NoHandlerForCategory`].
    pub fn dispatch<R: Resource>(&self, resource: R, extra: R::Extra) -> ResourceStream<R::Response> {
        let category = R::category();
        let Some(handler) = self.handler(&category) else {
            self.monitor.record(&ResourceEvent::HandlerNotFound {
                category: category.clone(),
            });
            return ResourceStream::fail(ResourceError::NoHandlerForCategory { category });
        };

        let request = match LoadRequest::new(resource, extra) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(category = %category, resource = type_name::<R>(), error = %err, "resource request rejected");
                return ResourceStream::fail(err);
            }
        };

        if self.config.log_dispatch {
            tracing::trace!(
                category = %category,
                resource = request.type_name(),
                handler = handler.name(),
                "dispatching resource request"
            );
        }

        handler
            .load(request)
            .try_map(ResourceValue::into_typed::<R::Response>)
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.read();
        let mut entries: Vec<(String, &str)> = table
            .iter()
            .map(|(category, handler)| (category.to_string(), handler.name()))
            .collect();
        entries.sort();
        f.debug_struct("ResourceRegistry")
            .field("handlers", &entries)
            .field("monitor", &self.monitor)
            .finish()
    }
}
