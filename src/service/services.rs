// SPDX-License-Identifier: MIT OR Apache-2.0

//! The accessors for one options type, wired together.

use super::cache::OptionsCache;
use super::factory::OptionsFactory;
use super::monitor::OptionsMonitor;
use super::options::Options;
use super::snapshot::OptionsSnapshot;
use crate::domain::{OptionsError, OptionsName, Result};
use crate::ports::OptionsRegistry;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Owns the factory and the accessors for `T`.
///
/// [`options`](Self::options) and [`monitor`](Self::monitor) are created on first use and live
/// as long as this value. [`snapshot`](Self::snapshot) hands out a fresh scope every call.
pub struct OptionsServices<T> {
    factory: Arc<OptionsFactory<T>>,
    monitor_cache: Arc<OptionsCache<T>>,
    options: OnceCell<Options<T>>,
    monitor: OnceCell<OptionsMonitor<T>>,
}

impl<T: Send + Sync + 'static> OptionsServices<T> {
    /// Wires the accessors over `registry`.
    pub fn new(registry: Arc<dyn OptionsRegistry<T>>) -> Self {
        let factory = Arc::new(OptionsFactory::new(registry));
        tracing::debug!(
            "Registered {} options with {} configurator(s), {} validator(s), {} change source(s)",
            factory.options_type(),
            factory.registry().configurators().len(),
            factory.registry().validators().len(),
            factory.registry().change_sources().len()
        );
        Self {
            factory,
            monitor_cache: Arc::new(OptionsCache::new()),
            options: OnceCell::new(),
            monitor: OnceCell::new(),
        }
    }

    /// The process-lifetime accessor.
    pub fn options(&self) -> &Options<T> {
        self.options.get_or_init(|| Options::new(self.factory.clone()))
    }

    /// The live accessor. Subscribes to change sources the first time it is called.
    pub fn monitor(&self) -> &OptionsMonitor<T> {
        self.monitor
            .get_or_init(|| OptionsMonitor::new(self.factory.clone(), self.monitor_cache.clone()))
    }

    /// A new scope-lifetime accessor.
    pub fn snapshot(&self) -> OptionsSnapshot<T> {
        OptionsSnapshot::new(self.factory.clone())
    }

    /// The underlying factory.
    pub fn factory(&self) -> &Arc<OptionsFactory<T>> {
        &self.factory
    }

    /// Every name the registrations mention, default name first.
    pub fn names(&self) -> Vec<OptionsName> {
        self.factory.registry().names()
    }

    /// Forces a rebuild of `name` through the monitor and notifies its listeners.
    pub fn invalidate_and_rebuild(&self, name: &OptionsName) -> Result<Arc<T>> {
        self.monitor().invalidate_and_rebuild(name)
    }

    /// Builds every known name through the monitor, so a bad configuration is reported at
    /// startup rather than on first use.
    ///
    /// Every name is attempted. If any fail, the failures are returned together as
    /// [`OptionsError::Aggregate`], in [`names`](Self::names) order.
    pub fn validate_all(&self) -> Result<()> {
        let monitor = self.monitor();
        let failures: Vec<OptionsError> = self
            .names()
            .iter()
            .filter_map(|name| monitor.get(name).err())
            .collect();

        if failures.is_empty() {
            tracing::debug!("All {} options validated", self.factory.options_type());
            Ok(())
        } else {
            tracing::warn!(
                "{} {} options failed startup validation",
                failures.len(),
                self.factory.options_type()
            );
            Err(OptionsError::Aggregate { failures })
        }
    }
}

impl<T> std::fmt::Debug for OptionsServices<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsServices")
            .field("factory", &self.factory)
            .field("monitor_cache", &self.monitor_cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::OptionsName;
    use crate::service::OptionsBuilder;
    use std::sync::Arc;

    #[derive(Default)]
    struct Limits {
        max: u32,
    }

    fn name(s: &str) -> OptionsName {
        OptionsName::new(s).unwrap()
    }

    #[test]
    fn test_accessors_are_singletons() {
        let services = OptionsBuilder::<Limits>::new()
            .configure(|l| l.max = 5)
            .build();

        assert!(std::ptr::eq(services.options(), services.options()));
        assert!(std::ptr::eq(services.monitor(), services.monitor()));
        assert!(Arc::ptr_eq(
            &services.options().value().unwrap(),
            &services.options().value().unwrap()
        ));
    }

    #[test]
    fn test_accessors_build_independently() {
        let services = OptionsBuilder::<Limits>::new()
            .configure(|l| l.max = 5)
            .build();

        let from_options = services.options().value().unwrap();
        let from_monitor = services.monitor().current_value().unwrap();
        let from_snapshot = services.snapshot().value().unwrap();

        assert_eq!(from_options.max, 5);
        assert!(!Arc::ptr_eq(&from_options, &from_monitor));
        assert!(!Arc::ptr_eq(&from_monitor, &from_snapshot));
    }

    #[test]
    fn test_validate_all_collects_every_failure() {
        let services = OptionsBuilder::<Limits>::new()
            .configure_named(name("small"), |l| l.max = 1)
            .configure_named(name("large"), |l| l.max = 100)
            .configure_named(name("huge"), |l| l.max = 1000)
            .validate(|l| l.max > 0, "max must be positive")
            .validate(|l| l.max <= 100, "max must be at most 100")
            .build();

        let failures = services.validate_all().unwrap_err().into_failures();
        let text: Vec<String> = failures.iter().map(|f| f.to_string()).collect();

        // default (max 0) and huge (max 1000) fail
        assert_eq!(text.len(), 2);
        assert!(text[0].contains("with name ''"));
        assert!(text[0].contains("max must be positive"));
        assert!(text[1].contains("'huge'"));
        assert!(text[1].contains("at most 100"));
    }

    #[test]
    fn test_validate_all_ok_warms_monitor() {
        let services = OptionsBuilder::<Limits>::new()
            .configure(|l| l.max = 3)
            .configure_named(name("x"), |l| l.max += 1)
            .build();

        services.validate_all().unwrap();
        assert_eq!(
            services.monitor().cache().names().len(),
            services.names().len()
        );
        assert_eq!(services.monitor().get(&name("x")).unwrap().max, 4);
    }
}
