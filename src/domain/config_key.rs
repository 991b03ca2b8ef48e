// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical configuration keys.
//!
//! A `ConfigKey` is a dot-separated path such as `server.tls.port`. The empty key is the root
//! of the configuration tree.

use std::fmt;

/// Separator between path segments.
pub const KEY_SEPARATOR: char = '.';

/// A dot-separated configuration path.
///
/// # Examples
///
/// ```
/// use hexopts::domain::ConfigKey;
///
/// let key = ConfigKey::from("server").child("port");
/// assert_eq!(key.as_str(), "server.port");
/// assert_eq!(key.segments().collect::<Vec<_>>(), vec!["server", "port"]);
///
/// let relative = key.relative_to(&ConfigKey::from("server")).unwrap();
/// assert_eq!(relative.as_str(), "port");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Creates a new `ConfigKey` from a `String`.
    pub fn new(key: String) -> Self {
        ConfigKey(key)
    }

    /// Returns the root key.
    pub fn root() -> Self {
        ConfigKey(String::new())
    }

    /// Returns true for the root key.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments. The root has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Appends a segment.
    pub fn child(&self, segment: &str) -> ConfigKey {
        if self.is_root() {
            ConfigKey(segment.to_string())
        } else if segment.is_empty() {
            self.clone()
        } else {
            ConfigKey(format!("{}{}{}", self.0, KEY_SEPARATOR, segment))
        }
    }

    /// Strips `prefix` from this key.
    ///
    /// Returns the root key when the keys are equal and `None` when this key is not
    /// `prefix` or one of its descendants.
    pub fn relative_to(&self, prefix: &ConfigKey) -> Option<ConfigKey> {
        if prefix.is_root() {
            return Some(self.clone());
        }
        if self.0 == prefix.0 {
            return Some(ConfigKey::root());
        }
        self.0
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
            .map(|rest| ConfigKey(rest.to_string()))
    }

    /// Returns the first segment, if any.
    pub fn first_segment(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Converts the `ConfigKey` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey(s.to_string())
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
