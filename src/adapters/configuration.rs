// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration tree and its bridge to options.
//!
//! [`Configuration`] stacks [`ConfigSource`]s by priority and exposes hierarchical
//! [`ConfigSection`] snapshots. Every [`reload`](Configuration::reload) installs a fresh
//! [`ReloadToken`] and fires the previous one, which is what makes bound options live.
//!
//! [`ConfigureFromConfiguration`] and [`ConfigurationChangeTokenSource`] are the two halves that
//! [`OptionsBuilder::bind`](crate::service::OptionsBuilder::bind) registers: one binds a section
//! into each new instance, the other tells the monitor when to rebuild.

use super::reload_token::ReloadToken;
use crate::domain::{
    BoxError, ConfigKey, ConfigSection, ConfigValue, NameFilter, OptionsName, Result,
};
use crate::ports::{
    Bind, ChangeToken, ConfigSource, ConfigWatcher, ConfigureOptions, OptionsChangeTokenSource,
    DEFAULT_ORDER,
};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

struct ConfigurationInner {
    // Sorted by descending priority.
    sources: RwLock<Vec<Box<dyn ConfigSource>>>,
    token: Mutex<ReloadToken>,
    watchers: Mutex<Vec<Box<dyn ConfigWatcher>>>,
}

/// A priority-ordered stack of configuration sources.
///
/// Cloning is cheap; clones share sources, watchers and the current change token.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::{Configuration, MemorySource};
///
/// let defaults = MemorySource::new().with_value("server.port", "80");
/// let overrides = MemorySource::new()
///     .with_priority(5)
///     .with_value("server.port", "8080");
///
/// let configuration = Configuration::builder()
///     .with_source(Box::new(defaults))
///     .with_source(Box::new(overrides))
///     .build();
///
/// let server = configuration.section("server");
/// assert_eq!(server.get("port").unwrap().as_str(), "8080");
/// ```
#[derive(Clone)]
pub struct Configuration {
    inner: Arc<ConfigurationInner>,
}

impl Configuration {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ConfigurationInner {
                sources: RwLock::new(Vec::new()),
                token: Mutex::new(ReloadToken::new()),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Adds a source. This does not fire the change token; call [`reload`](Self::reload) for
    /// that.
    pub fn add_source(&self, source: Box<dyn ConfigSource>) {
        let mut sources = self
            .inner
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(
            "Adding configuration source '{}' (priority {})",
            source.name(),
            source.priority()
        );
        sources.push(source);
        sources.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    /// Names of the sources, highest priority first.
    pub fn source_names(&self) -> Vec<String> {
        self.inner
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Looks up one key, consulting sources from highest to lowest priority.
    ///
    /// A source that errors is logged and skipped.
    pub fn get(&self, key: &ConfigKey) -> Option<ConfigValue> {
        let sources = self
            .inner
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for source in sources.iter() {
            match source.get(key) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(
                        "Error querying source '{}' for key '{}': {}",
                        source.name(),
                        key,
                        e
                    );
                }
            }
        }
        None
    }

    /// Convenience for [`get`](Self::get) with a string key.
    pub fn get_str(&self, key: &str) -> Option<ConfigValue> {
        self.get(&ConfigKey::from(key))
    }

    /// The merged view of every source.
    pub fn snapshot(&self) -> BTreeMap<ConfigKey, ConfigValue> {
        let sources = self
            .inner
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut merged = BTreeMap::new();
        // Lowest priority first so higher ones overwrite.
        for source in sources.iter().rev() {
            let keys = match source.all_keys() {
                Ok(keys) => keys,
                Err(e) => {
                    tracing::debug!("Error listing keys of source '{}': {}", source.name(), e);
                    continue;
                }
            };
            for key in keys {
                match source.get(&key) {
                    Ok(Some(value)) => {
                        merged.insert(key, value);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::debug!(
                        "Error querying source '{}' for key '{}': {}",
                        source.name(),
                        key,
                        e
                    ),
                }
            }
        }
        merged
    }

    /// Returns the section at `path`. The empty path is the whole tree.
    pub fn section(&self, path: &str) -> ConfigSection {
        ConfigSection::from_flat(ConfigKey::from(path), &self.snapshot())
    }

    /// Reloads every source, then signals the change.
    ///
    /// Sources that fail to reload keep their previous data and are logged. The new change
    /// token is installed before the old one fires, so callbacks that re-subscribe from inside
    /// the notification observe the new token.
    pub fn reload(&self) {
        {
            let mut sources = self
                .inner
                .sources
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for source in sources.iter_mut() {
                if let Err(e) = source.reload() {
                    tracing::warn!("Failed to reload source '{}': {}", source.name(), e);
                }
            }
        }

        let previous = {
            let mut token = self
                .inner
                .token
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *token, ReloadToken::new())
        };
        tracing::debug!("Configuration reloaded");
        previous.fire();
    }

    /// The token fired by the next [`reload`](Self::reload).
    pub fn reload_token(&self) -> Arc<dyn ChangeToken> {
        let token = self
            .inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Arc::new(token)
    }

    /// Starts `watcher` and reloads this configuration whenever it reports a change.
    ///
    /// The configuration owns the watcher from then on; it is stopped by
    /// [`stop_watchers`](Self::stop_watchers) or when the last clone is dropped.
    pub fn attach_watcher(&self, mut watcher: Box<dyn ConfigWatcher>) -> Result<()> {
        let weak: Weak<ConfigurationInner> = Arc::downgrade(&self.inner);
        watcher.watch(Arc::new(move |key: ConfigKey| {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!("Reloading configuration after change to '{}'", key);
                Configuration { inner }.reload();
            }
        }))?;
        self.inner
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(watcher);
        Ok(())
    }

    /// Stops and drops every attached watcher.
    pub fn stop_watchers(&self) -> Result<()> {
        let watchers = std::mem::take(
            &mut *self
                .inner
                .watchers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for mut watcher in watchers {
            watcher.stop()?;
        }
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("sources", &self.source_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Configuration`].
#[derive(Default)]
pub struct ConfigurationBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigurationBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source.
    pub fn with_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds every environment variable, lowercased, with `__` as the nesting separator.
    #[cfg(feature = "env")]
    pub fn with_env_vars(self) -> Self {
        use crate::adapters::EnvVarAdapter;
        self.with_source(Box::new(EnvVarAdapter::new().lowercase_keys(true)))
    }

    /// Adds environment variables starting with `prefix`.
    #[cfg(feature = "env")]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        use crate::adapters::EnvVarAdapter;
        self.with_source(Box::new(
            EnvVarAdapter::with_prefix(prefix).lowercase_keys(true),
        ))
    }

    /// Adds a YAML file. Fails if the file cannot be read or parsed.
    #[cfg(feature = "yaml")]
    pub fn with_yaml_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        use crate::adapters::YamlFileSource;
        let source = YamlFileSource::from_file(path)?;
        Ok(self.with_source(Box::new(source)))
    }

    /// Builds the configuration.
    pub fn build(self) -> Configuration {
        let configuration = Configuration::new();
        for source in self.sources {
            configuration.add_source(source);
        }
        configuration
    }
}

/// Configurator that binds a configuration section into each new instance.
pub struct ConfigureFromConfiguration<T> {
    target: NameFilter,
    order: i32,
    configuration: Configuration,
    section: String,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T> ConfigureFromConfiguration<T> {
    /// Binds `configuration.section(section)` for names matching `target`.
    pub fn new(
        target: impl Into<NameFilter>,
        configuration: Configuration,
        section: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            order: DEFAULT_ORDER,
            configuration,
            section: section.into(),
            _marker: PhantomData,
        }
    }

    /// Sets the order; lower runs first.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl<T: Bind> ConfigureOptions<T> for ConfigureFromConfiguration<T> {
    fn target(&self) -> &NameFilter {
        &self.target
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn configure(&self, name: &OptionsName, options: &mut T) -> std::result::Result<(), BoxError> {
        let section = self.configuration.section(&self.section);
        tracing::trace!(
            "Binding section '{}' ({} key(s)) for options '{}'",
            self.section,
            section.iter().count(),
            name
        );
        options.bind(&section);
        Ok(())
    }
}

/// Change source that fires whenever a [`Configuration`] reloads.
#[derive(Clone, Debug)]
pub struct ConfigurationChangeTokenSource {
    name: OptionsName,
    configuration: Configuration,
}

impl ConfigurationChangeTokenSource {
    /// Signals changes of `configuration` to the options named `name`.
    pub fn new(name: OptionsName, configuration: Configuration) -> Self {
        Self {
            name,
            configuration,
        }
    }
}

impl OptionsChangeTokenSource for ConfigurationChangeTokenSource {
    fn name(&self) -> &OptionsName {
        &self.name
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        self.configuration.reload_token()
    }
}
