//! Resource categories.
//!
//! A [`ResourceCategory`] is the dispatch key of the registry. Every resource
//! type declares exactly one category and every handler declares the set of
//! categories it serves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a resource, used as the registry dispatch key.
///
/// Two categories are equal iff they are the same variant and, for
/// [`ResourceCategory::Custom`], carry the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceCategory {
    /// Category not known to the caller
    #[default]
    Unknown,
    /// Local files and bundled assets
    File,
    /// Network endpoints
    Web,
    /// An application-defined category. Build it with
    /// [`ResourceCategory::custom`] so the name is normalized.
    Custom(String),
}

const CUSTOM_PREFIX: &str = "custom:";

impl ResourceCategory {
    /// Creates a custom category.
    ///
    /// Surrounding whitespace is trimmed so the category survives a round
    /// trip through its string form. A blank name yields
    /// [`ResourceCategory::Unknown`]; use [`ResourceCategory::try_custom`] to
    /// reject it instead.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::try_custom(name).unwrap_or_default()
    }

    /// Creates a custom category, rejecting a blank name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty after trimming.
    pub fn try_custom(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("custom resource category cannot be empty".to_string());
        }
        if trimmed.len() == name.len() {
            Ok(Self::Custom(name))
        } else {
            Ok(Self::Custom(trimmed.to_string()))
        }
    }

    /// Returns true for [`ResourceCategory::Custom`].
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    fn builtin(name: &str) -> Option<Self> {
        [Self::Unknown, Self::File, Self::Web]
            .into_iter()
            .find(|category| category.to_string().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<String> for ResourceCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for ResourceCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err("resource category cannot be empty".to_string());
        }

        match value.get(..CUSTOM_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(CUSTOM_PREFIX) => {
                Self::try_custom(&value[CUSTOM_PREFIX.len()..])
            }
            _ => Self::builtin(value).ok_or_else(|| {
                format!(
                    "unknown resource category: {value}. Use file, web, unknown or custom:<name>"
                )
            }),
        }
    }
}

impl From<ResourceCategory> for String {
    fn from(value: ResourceCategory) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::File => write!(f, "file"),
            Self::Web => write!(f, "web"),
            Self::Custom(name) => write!(f, "{CUSTOM_PREFIX}{name}"),
        }
    }
}
