//! The resource contract.
//!
//! A [`Resource`] is a caller-side request description; a [`ResourceHandler`]
//! produces streams of responses for the categories it serves. The registry
//! only depends on these two capability sets.
//!
//! The registry edge is type-erased: handlers receive a [`LoadRequest`] and
//! emit [`ResourceValue`]s. The registry converts every emitted value back to
//! the request's `Response` type.

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::category::ResourceCategory;
use crate::error::{ResourceError, ResourceResult};
use crate::registry::ResourceRegistry;
use crate::stream::{ResourceStream, SingleValue};

/// A loadable resource request.
///
/// The category is a property of the type: every instance of a resource type
/// is dispatched to the same handler.
///
/// # Example
///
/// ```rust
/// use resource_registry::{Resource, ResourceCategory};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct FileResource {
///     file_name: String,
/// }
///
/// impl Resource for FileResource {
///     type Extra = ();
///     type Response = String;
///
///     fn category() -> ResourceCategory {
///         ResourceCategory::File
///     }
/// }
/// ```
pub trait Resource: Serialize + Send + Sync + 'static {
    /// Additional input passed alongside the request; `()` when unused.
    type Extra: Send + Sync + 'static;

    /// Type of each value the resource stream emits.
    type Response: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Category used to find the handler.
    fn category() -> ResourceCategory;
}

/// Produces streams of responses for one or more categories.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Categories this handler serves.
    fn categories(&self) -> Vec<ResourceCategory>;

    /// Starts loading a resource.
    ///
    /// The returned stream may emit any number of values. Callers using the
    /// single-shot APIs take the first one.
    fn load(&self, request: LoadRequest) -> ResourceStream<ResourceValue>;

    /// Name used in events and logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// A type-erased resource request as seen by a handler.
#[derive(Clone)]
pub struct LoadRequest {
    category: ResourceCategory,
    type_name: &'static str,
    payload: serde_json::Value,
    resource: Arc<dyn Any + Send + Sync>,
    extra: Arc<dyn Any + Send + Sync>,
}

impl LoadRequest {
    /// Erases a typed request.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Serialization`] if the resource cannot be
    /// serialized into the JSON payload.
    pub fn new<R: Resource>(resource: R, extra: R::Extra) -> ResourceResult<Self> {
        let payload = serde_json::to_value(&resource)?;
        Ok(Self {
            category: R::category(),
            type_name: type_name::<R>(),
            payload,
            resource: Arc::new(resource),
            extra: Arc::new(extra),
        })
    }

    /// Category the request was dispatched on.
    #[must_use]
    pub const fn category(&self) -> &ResourceCategory {
        &self.category
    }

    /// Rust type name of the resource.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The resource serialized as JSON.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Returns true if the resource is of type `R`.
    #[must_use]
    pub fn is<R: Resource>(&self) -> bool {
        self.resource.as_ref().is::<R>()
    }

    /// The typed resource, if it is of type `R`.
    #[must_use]
    pub fn resource<R: Resource>(&self) -> Option<&R> {
        self.resource.as_ref().downcast_ref::<R>()
    }

    /// The extra data, if it is of type `E`.
    #[must_use]
    pub fn extra<E: Any>(&self) -> Option<&E> {
        self.extra.as_ref().downcast_ref::<E>()
    }

    /// Deserializes the JSON payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Serialization`] if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> ResourceResult<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("category", &self.category)
            .field("type_name", &self.type_name)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// A type-erased value emitted by a handler.
#[derive(Clone)]
pub enum ResourceValue {
    /// A JSON document, deserialized into the response type.
    Json(serde_json::Value),
    /// A Rust value, downcast to the response type.
    Native(Arc<dyn Any + Send + Sync>),
}

impl ResourceValue {
    /// Wraps a Rust value.
    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        Self::Native(Arc::new(value))
    }

    /// Serializes `value` to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Serialization`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ResourceResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Converts into the response type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ResourceTypeError`] if a native value is of a
    /// different type or a JSON value does not deserialize into `T`.
    pub fn into_typed<T>(self) -> ResourceResult<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|err| ResourceError::ResourceTypeError {
                    expected: type_name::<T>(),
                    reason: err.to_string(),
                })
            }
            Self::Native(value) => match value.downcast::<T>() {
                Ok(typed) => Ok(Arc::try_unwrap(typed).unwrap_or_else(|shared| (*shared).clone())),
                Err(_) => Err(ResourceError::ResourceTypeError {
                    expected: type_name::<T>(),
                    reason: "handler emitted a native value of a different type".to_string(),
                }),
            },
        }
    }
}

impl fmt::Debug for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// Handler built from a closure.
///
/// ```rust
/// use resource_registry::{FnHandler, ResourceCategory, ResourceStream, ResourceValue};
///
/// let handler = FnHandler::new("echo", vec![ResourceCategory::custom("echo")], |request| {
///     ResourceStream::just(ResourceValue::Json(request.payload().clone()))
/// });
/// ```
pub struct FnHandler<F> {
    name: String,
    categories: Vec<ResourceCategory>,
    load: F,
}

impl<F> FnHandler<F>
where
    F: Fn(LoadRequest) -> ResourceStream<ResourceValue> + Send + Sync + 'static,
{
    /// Creates a handler serving `categories`.
    pub fn new(name: impl Into<String>, categories: Vec<ResourceCategory>, load: F) -> Self {
        Self {
            name: name.into(),
            categories,
            load,
        }
    }
}

impl<F> ResourceHandler for FnHandler<F>
where
    F: Fn(LoadRequest) -> ResourceStream<ResourceValue> + Send + Sync + 'static,
{
    fn categories(&self) -> Vec<ResourceCategory> {
        self.categories.clone()
    }

    fn load(&self, request: LoadRequest) -> ResourceStream<ResourceValue> {
        (self.load)(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

/// Open API available on every [`Resource`].
///
/// The unsuffixed methods go through [`ResourceRegistry::shared`]; the `_in`
/// variants take an explicit registry. Single-shot calls never time out: a
/// handler that never emits nor terminates leaves them pending.
pub trait ResourceExt: Resource + Sized {
    /// Opens the resource and keeps receiving values until the subscription is released.
    fn open(self, extra: Self::Extra) -> ResourceStream<Self::Response> {
        self.open_in(ResourceRegistry::shared(), extra)
    }

    /// [`ResourceExt::open`] against `registry`.
    fn open_in(self, registry: &ResourceRegistry, extra: Self::Extra) -> ResourceStream<Self::Response> {
        registry.dispatch(self, extra)
    }

    /// Opens the resource and keeps only the first value.
    fn open_once(self, extra: Self::Extra) -> SingleValue<Self::Response> {
        self.open(extra).as_single()
    }

    /// [`ResourceExt::open_once`] against `registry`.
    fn open_once_in(self, registry: &ResourceRegistry, extra: Self::Extra) -> SingleValue<Self::Response> {
        self.open_in(registry, extra).as_single()
    }

    /// Opens the resource and calls `callback` exactly once with the first value or the error.
    fn open_once_with<F>(self, extra: Self::Extra, callback: F)
    where
        F: FnOnce(ResourceResult<Self::Response>) + Send + 'static,
    {
        self.open(extra).receive_once(callback);
    }

    /// [`ResourceExt::open_once_with`] against `registry`.
    fn open_once_with_in<F>(self, registry: &ResourceRegistry, extra: Self::Extra, callback: F)
    where
        F: FnOnce(ResourceResult<Self::Response>) + Send + 'static,
    {
        self.open_in(registry, extra).receive_once(callback);
    }

    /// Opens the resource and awaits the first value.
    fn open_once_async(
        self,
        extra: Self::Extra,
    ) -> impl Future<Output = ResourceResult<Self::Response>> + Send + 'static {
        self.open(extra).first()
    }

    /// [`ResourceExt::open_once_async`] against `registry`.
    fn open_once_async_in(
        self,
        registry: &ResourceRegistry,
        extra: Self::Extra,
    ) -> impl Future<Output = ResourceResult<Self::Response>> + Send + 'static {
        self.open_in(registry, extra).first()
    }
}

impl<R: Resource> ResourceExt for R {}
