// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leaf values of the configuration tree.
//!
//! Values are stored as strings and converted at bind time. A failed conversion produces
//! [`OptionsError::Binding`], which the binder logs and swallows.

use crate::domain::errors::{OptionsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A raw configuration value.
///
/// # Examples
///
/// ```
/// use hexopts::domain::ConfigValue;
///
/// let value = ConfigValue::from("8080");
/// let port: u16 = value.parse("server.port").unwrap();
/// assert_eq!(port, 8080);
///
/// assert!(ConfigValue::from("on").as_bool("feature.enabled").unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue(String);

impl ConfigValue {
    /// Creates a new `ConfigValue` from a `String`.
    pub fn new(value: String) -> Self {
        ConfigValue(value)
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes (case-insensitive) `true`/`yes`/`1`/`on` and `false`/`no`/`0`/`off`.
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        match self.0.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => self.parse::<bool>(key),
        }
    }

    /// Parses the value into any type that implements `FromStr`.
    ///
    /// Surrounding whitespace is ignored for every type except `String`, whose `FromStr`
    /// never fails and therefore receives the value verbatim.
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self.0.as_str();
        raw.parse::<T>()
            .or_else(|_| raw.trim().parse::<T>())
            .map_err(|e| OptionsError::Binding {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Box::new(e),
            })
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue(s.to_string())
    }
}

impl From<ConfigValue> for String {
    fn from(value: ConfigValue) -> Self {
        value.0
    }
}

impl AsRef<str> for ConfigValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
