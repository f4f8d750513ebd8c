//! Registry lifecycle events.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::ResourceCategory;
use crate::resource::ResourceHandler;

/// Unique identifier for an attached observer.
///
/// Identifiers are assigned in increasing order per monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Event recorded by the registry.
#[allow(missing_docs)]
#[derive(Clone)]
pub enum ResourceEvent {
    /// A handler now serves `category`.
    HandlerAdded {
        category: ResourceCategory,
        handler: Arc<dyn ResourceHandler>,
    },

    /// `new` replaced `old` for `category`.
    DuplicateRegistration {
        category: ResourceCategory,
        old: Arc<dyn ResourceHandler>,
        new: Arc<dyn ResourceHandler>,
    },

    /// A request for `category` found no handler.
    HandlerNotFound { category: ResourceCategory },
}

impl ResourceEvent {
    /// Category the event concerns.
    #[must_use]
    pub const fn category(&self) -> &ResourceCategory {
        match self {
            Self::HandlerAdded { category, .. }
            | Self::DuplicateRegistration { category, .. }
            | Self::HandlerNotFound { category } => category,
        }
    }

    /// Stable snake_case name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HandlerAdded { .. } => "handler_added",
            Self::DuplicateRegistration { .. } => "duplicate_registration",
            Self::HandlerNotFound { .. } => "handler_not_found",
        }
    }
}

impl fmt::Debug for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandlerAdded { category, handler } => f
                .debug_struct("HandlerAdded")
                .field("category", category)
                .field("handler", &handler.name())
                .finish(),
            Self::DuplicateRegistration { category, old, new } => f
                .debug_struct("DuplicateRegistration")
                .field("category", category)
                .field("old", &old.name())
                .field("new", &new.name())
                .finish(),
            Self::HandlerNotFound { category } => f
                .debug_struct("HandlerNotFound")
                .field("category", category)
                .finish(),
        }
    }
}
