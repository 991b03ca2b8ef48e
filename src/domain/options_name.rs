// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options names and name filters.
//!
//! Options are keyed by an [`OptionsName`]. The empty string is reserved as the default name
//! and denotes the unnamed instance. Names compare case-sensitively.

use crate::domain::errors::{OptionsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reserved name of the unnamed options instance.
pub const DEFAULT_NAME: &str = "";

/// A validated, case-sensitive options name.
///
/// # Examples
///
/// ```
/// use hexopts::domain::OptionsName;
///
/// let name = OptionsName::new("primary").unwrap();
/// assert_eq!(name.as_str(), "primary");
/// assert!(OptionsName::default_name().is_default());
/// assert_ne!(name, OptionsName::new("Primary").unwrap());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionsName(String);

impl OptionsName {
    /// Creates a new name, rejecting names that contain control characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.chars().any(char::is_control) {
            return Err(OptionsError::InvalidName {
                name,
                reason: "names must not contain control characters".to_string(),
            });
        }
        Ok(OptionsName(name))
    }

    /// Returns the default name.
    pub fn default_name() -> Self {
        OptionsName(DEFAULT_NAME.to_string())
    }

    /// Returns true if this is the default name.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_NAME
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OptionsName {
    type Error = OptionsError;

    fn try_from(value: String) -> Result<Self> {
        OptionsName::new(value)
    }
}

impl TryFrom<&str> for OptionsName {
    type Error = OptionsError;

    fn try_from(value: &str) -> Result<Self> {
        OptionsName::new(value)
    }
}

impl From<OptionsName> for String {
    fn from(name: OptionsName) -> Self {
        name.0
    }
}

impl AsRef<str> for OptionsName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects which options names a configurator, validator, or change source applies to.
///
/// A filter built from the default name applies to every name, the same as [`NameFilter::All`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NameFilter {
    /// Applies to every name.
    #[default]
    All,
    /// Applies only to the given non-default name.
    Named(OptionsName),
}

impl NameFilter {
    /// Returns true if this filter selects `name`.
    pub fn matches(&self, name: &OptionsName) -> bool {
        match self {
            NameFilter::All => true,
            NameFilter::Named(target) => target == name,
        }
    }

    /// Returns the targeted name, if any.
    pub fn target(&self) -> Option<&OptionsName> {
        match self {
            NameFilter::All => None,
            NameFilter::Named(target) => Some(target),
        }
    }
}

impl From<OptionsName> for NameFilter {
    fn from(name: OptionsName) -> Self {
        if name.is_default() {
            NameFilter::All
        } else {
            NameFilter::Named(name)
        }
    }
}

impl From<Option<OptionsName>> for NameFilter {
    fn from(name: Option<OptionsName>) -> Self {
        name.map(NameFilter::from).unwrap_or_default()
    }
}

impl fmt::Display for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameFilter::All => write!(f, "*"),
            NameFilter::Named(name) => write!(f, "{}", name),
        }
    }
}
