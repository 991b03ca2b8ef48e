// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration source.

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A mutable key/value source held in memory.
///
/// Clones share the same map, so a host (or a test) can keep a handle, change values after the
/// source has been added to a [`Configuration`](super::Configuration), and then call
/// [`Configuration::reload`](super::Configuration::reload) to publish the change.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::MemorySource;
/// use hexopts::ports::ConfigSource;
///
/// let source = MemorySource::new().with_value("app.name", "demo");
/// let handle = source.clone();
/// handle.set("app.name", "renamed");
///
/// assert_eq!(source.get_str("app.name").unwrap().unwrap().as_str(), "renamed");
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    priority: u8,
    values: Arc<RwLock<BTreeMap<ConfigKey, ConfigValue>>>,
}

impl MemorySource {
    /// Creates an empty source named `"memory"` with priority 0.
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            priority: 0,
            values: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Renames the source.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Changes the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a value.
    pub fn with_value(self, key: impl Into<ConfigKey>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value in place.
    pub fn set(&self, key: impl Into<ConfigKey>, value: impl Into<ConfigValue>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Removes a value, returning whether it was present.
    pub fn remove(&self, key: impl Into<ConfigKey>) -> bool {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key.into())
            .is_some()
    }

    /// Removes every value.
    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for MemorySource
where
    K: Into<ConfigKey>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let source = MemorySource::new();
        for (key, value) in iter {
            source.set(key, value);
        }
        source
    }
}

impl ConfigSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
