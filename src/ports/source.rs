// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source port.
//!
//! A source is one layer of flat, dot-separated key/value pairs. The
//! [`Configuration`](crate::adapters::Configuration) tree stacks sources by priority and binds
//! sections of the merged view onto options instances.

use crate::domain::{ConfigKey, ConfigValue, Result};

/// A layer of configuration key/value pairs.
///
/// # Priority
///
/// When two sources hold the same key, the source with the higher priority wins. The bundled
/// adapters use:
///
/// - **2**: environment variables
/// - **1**: YAML files
/// - **0**: in-memory defaults
///
/// # Examples
///
/// ```rust
/// use hexopts::domain::{ConfigKey, ConfigValue, Result};
/// use hexopts::ports::ConfigSource;
///
/// struct Fixed;
///
/// impl ConfigSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn priority(&self) -> u8 {
///         0
///     }
///
///     fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
///         Ok((key.as_str() == "server.port").then(|| ConfigValue::from("8080")))
///     }
///
///     fn all_keys(&self) -> Result<Vec<ConfigKey>> {
///         Ok(vec![ConfigKey::from("server.port")])
///     }
///
///     fn reload(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let source = Fixed;
/// assert_eq!(source.get_str("server.port").unwrap().unwrap().as_str(), "8080");
/// ```
pub trait ConfigSource: Send + Sync {
    /// Short identifier used in logs and errors, e.g. `"env"` or `"yaml-file"`.
    fn name(&self) -> &str;

    /// Precedence of this source; higher wins.
    fn priority(&self) -> u8;

    /// Looks up a single key. `Ok(None)` means the key is absent from this source.
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>>;

    /// Every key this source currently holds.
    fn all_keys(&self) -> Result<Vec<ConfigKey>>;

    /// Re-reads the underlying data. Sources without backing storage return `Ok(())`.
    fn reload(&mut self) -> Result<()>;

    /// Convenience for `get(&ConfigKey::from(key))`.
    fn get_str(&self, key: &str) -> Result<Option<ConfigValue>> {
        self.get(&ConfigKey::from(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionsError;

    struct Failing;

    impl ConfigSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn priority(&self) -> u8 {
            0
        }

        fn get(&self, _key: &ConfigKey) -> Result<Option<ConfigValue>> {
            Ok(None)
        }

        fn all_keys(&self) -> Result<Vec<ConfigKey>> {
            Ok(vec![])
        }

        fn reload(&mut self) -> Result<()> {
            Err(OptionsError::SourceError {
                source_name: self.name().to_string(),
                message: "backing store unavailable".to_string(),
                source: None,
            })
        }
    }

    #[test]
    fn test_get_str_delegates_to_get() {
        let source = Failing;
        assert!(source.get_str("anything").unwrap().is_none());
    }

    #[test]
    fn test_reload_error_names_source() {
        let mut source = Failing;
        let err = source.reload().unwrap_err();
        assert!(err.to_string().contains("failing"));
    }

    #[test]
    fn test_config_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ConfigSource>>();
    }
}
