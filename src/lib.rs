//! # resource-registry
//!
//! A process-wide capability registry. Callers describe *what* they want as a
//! typed [`Resource`]; the registry routes the request to whichever
//! [`ResourceHandler`] is registered for the resource's [`ResourceCategory`]
//! and hands back a [`ResourceStream`] of typed responses.
//!
//! ## Core Concepts
//!
//! - **Resource**: A typed request that knows its category and response type
//! - **Handler**: A pluggable provider serving one or more categories
//! - **Registry**: The category to handler dispatch table
//! - **Stream**: Push-based values with an explicit release handle
//! - **Bridge**: Reduces a stream to its first value (blocking, callback, or `async`)
//! - **Monitor**: Observer bus reporting registrations and dispatch misses
//!
//! ## Usage
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
//! struct FileResource {
//!     path: String,
//! }
//!
//! impl Resource for FileResource {
//!     type Extra = ();
//!     type Response = String;
//!
//!     fn category() -> ResourceCategory {
//!         ResourceCategory::File
//!     }
//! }
//!
//! let registry = ResourceRegistry::new();
//! registry.register(Arc::new(FnHandler::new(
//!     "files",
//!     vec![ResourceCategory::File],
//!     |request| {
//!         let path = request.resource::<FileResource>().map(|r| r.path.clone()).unwrap_or_default();
//!         ResourceStream::just(ResourceValue::native(path))
//!     },
//! )));
//!
//! let path = FileResource { path: "hello.txt".into() }
//!     .open_once_in(&registry, ())
//!     .wait()
//!     .unwrap();
//! assert_eq!(path, "hello.txt");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod category;
pub mod config;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod resource;
pub mod stream;

// Re-export primary types at crate root for convenience
pub use category::ResourceCategory;
pub use config::{MonitorConfig, RegistryConfig};
pub use error::{ResourceError, ResourceResult};
pub use monitor::{
    ObserverId, ObserverSubscription, ResourceEvent, ResourceMonitor, ResourceObserver,
    TracingObserver,
};
pub use registry::ResourceRegistry;
pub use resource::{FnHandler, LoadRequest, Resource, ResourceExt, ResourceHandler, ResourceValue};
pub use stream::{ResourceStream, Signal, SingleValue, Subject, Subscriber, Subscription};
