// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable configuration source.
//!
//! Variable names map onto configuration keys by stripping an optional prefix and turning the
//! double underscore into the key separator: with prefix `APP_`, `APP_DATABASE__HOST` becomes
//! `DATABASE.HOST` (or `database.host` when lowercasing is enabled).

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::HashMap;
use std::env;
use std::sync::{PoisonError, RwLock};

/// Separator used in variable names for nesting.
const NESTING_SEPARATOR: &str = "__";

const MAX_ENV_KEY_LEN: usize = 512;
const MAX_ENV_VALUE_LEN: usize = 1024 * 1024;

/// A configuration source reading the process environment.
///
/// Variables are read lazily on first access and cached until [`reload`](ConfigSource::reload).
///
/// # Examples
///
/// ```
/// use hexopts::adapters::EnvVarAdapter;
/// use hexopts::ports::ConfigSource;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("SERVER__PORT".to_string(), "9000".to_string());
///
/// let source = EnvVarAdapter::with_values(values).lowercase_keys(true);
/// assert_eq!(source.get_str("server.port").unwrap().unwrap().as_str(), "9000");
/// ```
#[derive(Debug)]
pub struct EnvVarAdapter {
    prefix: Option<String>,
    lowercase_keys: bool,
    fixed: Option<HashMap<String, String>>,
    cache: RwLock<Option<HashMap<ConfigKey, ConfigValue>>>,
}

impl EnvVarAdapter {
    /// Reads every environment variable.
    pub fn new() -> Self {
        Self {
            prefix: None,
            lowercase_keys: false,
            fixed: None,
            cache: RwLock::new(None),
        }
    }

    /// Reads only variables starting with `prefix`, which is stripped from the key.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    /// Uses a fixed set of raw variables instead of the process environment.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            fixed: Some(values),
            ..Self::new()
        }
    }

    /// Lowercases keys so `APP_LOG__LEVEL` matches `log.level`.
    pub fn lowercase_keys(mut self, enabled: bool) -> Self {
        self.lowercase_keys = enabled;
        self
    }

    fn to_key(&self, variable: &str) -> Option<ConfigKey> {
        let stripped = match &self.prefix {
            Some(prefix) => variable.strip_prefix(prefix.as_str())?,
            None => variable,
        };
        if stripped.is_empty() {
            return None;
        }
        let mut key = stripped.replace(NESTING_SEPARATOR, ".");
        if self.lowercase_keys {
            key = key.to_lowercase();
        }
        Some(ConfigKey::from(key))
    }

    fn load(&self) -> HashMap<ConfigKey, ConfigValue> {
        let raw: Box<dyn Iterator<Item = (String, String)>> = match &self.fixed {
            Some(values) => Box::new(values.clone().into_iter()),
            None => Box::new(env::vars()),
        };

        let mut values = HashMap::new();
        for (variable, value) in raw {
            if variable.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!(
                    "Skipping oversized environment variable: key_len={}, value_len={}",
                    variable.len(),
                    value.len()
                );
                continue;
            }
            if let Some(key) = self.to_key(&variable) {
                values.insert(key, ConfigValue::from(value));
            }
        }

        tracing::debug!(
            "Loaded {} environment variable(s) (prefix={:?}, lowercase={})",
            values.len(),
            self.prefix,
            self.lowercase_keys
        );
        values
    }

    fn with_cache<R>(&self, f: impl FnOnce(&HashMap<ConfigKey, ConfigValue>) -> R) -> R {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(values) = cache.as_ref() {
                return f(values);
            }
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let values = cache.get_or_insert_with(|| self.load());
        f(values)
    }
}

impl Default for EnvVarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvVarAdapter {
    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self.with_cache(|values| values.get(key).cloned()))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.with_cache(|values| values.keys().cloned().collect()))
    }

    fn reload(&mut self) -> Result<()> {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
