//! Error types for resource loading.
//!
//! All errors surfaced by the registry and the stream bridge are values of
//! [`ResourceError`]. The type is `Clone` because a terminal failure on a
//! multicast source is delivered to every subscriber.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::category::ResourceCategory;

/// Top-level error type for resource loading.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// Dispatch found no handler for the request's category.
    ///
    /// Recoverable: register a handler and open the resource again.
    #[error("No handler registered for resource category '{category}'")]
    NoHandlerForCategory {
        /// Category of the request that missed.
        category: ResourceCategory,
    },

    /// A single-shot bridge saw the stream finish before any value.
    #[error("Resource stream finished without emitting a value")]
    NoValueReceivedOnCompletion,

    /// A handler emitted a value that does not convert to the response type
    /// the request expects.
    #[error("Resource response type mismatch (expected {expected}): {reason}")]
    ResourceTypeError {
        /// Rust type name of the expected response.
        expected: &'static str,
        /// What went wrong during conversion.
        reason: String,
    },

    /// The request could not be serialized into the load payload.
    #[error("Failed to serialize resource request: {message}")]
    Serialization {
        /// Serializer message.
        message: String,
    },

    /// Error raised by a handler, passed through unchanged.
    #[error("Handler error: {0}")]
    Handler(Arc<dyn StdError + Send + Sync>),
}

impl ResourceError {
    /// Wraps a handler-raised error.
    #[must_use]
    pub fn handler<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(err))
    }

    /// Returns the wrapped handler error if it is of type `E`.
    #[must_use]
    pub fn handler_error<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns true if this is a dispatch miss.
    #[must_use]
    pub const fn is_no_handler(&self) -> bool {
        matches!(self, Self::NoHandlerForCategory { .. })
    }

    /// Returns true if this is a response type mismatch.
    #[must_use]
    pub const fn is_type_error(&self) -> bool {
        matches!(self, Self::ResourceTypeError { .. })
    }

    /// Returns true if opening the resource again can succeed without a code change.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            // A handler may be registered in the meantime.
            Self::NoHandlerForCategory { .. } => true,
            Self::NoValueReceivedOnCompletion
            | Self::ResourceTypeError { .. }
            | Self::Serialization { .. }
            | Self::Handler(_) => false,
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
