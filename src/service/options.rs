// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-lifetime accessor.

use super::cache::OptionsCache;
use super::factory::OptionsFactory;
use crate::domain::Result;
use std::sync::Arc;

/// Builds the options for the selected name once per name and returns that same instance for
/// the life of the accessor. The selected name is the default name unless a name selector was
/// registered. Changes to the underlying configuration are not observed; use
/// [`OptionsMonitor`](super::OptionsMonitor) for that.
///
/// A build failure is returned to the caller and not cached, so every access keeps reporting
/// it until the configuration is fixed.
pub struct Options<T> {
    factory: Arc<OptionsFactory<T>>,
    cache: OptionsCache<T>,
}

impl<T: Send + Sync + 'static> Options<T> {
    /// Creates an accessor over `factory`.
    pub fn new(factory: Arc<OptionsFactory<T>>) -> Self {
        Self {
            factory,
            cache: OptionsCache::new(),
        }
    }

    /// The instance for the selected name, built on first access.
    ///
    /// The selected name is the default name unless a name selector was registered.
    pub fn value(&self) -> Result<Arc<T>> {
        self.cache
            .get_or_add(&self.factory.selected_name(), |name| self.factory.create(name))
    }
}

impl<T> std::fmt::Debug for Options<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::OptionsBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counter {
        built: usize,
    }

    #[test]
    fn test_value_is_memoized() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let registrations = OptionsBuilder::<Counter>::new()
            .configure(move |c| c.built = counter.fetch_add(1, Ordering::SeqCst) + 1)
            .build_registrations();
        let options = Options::new(Arc::new(OptionsFactory::new(Arc::new(registrations))));

        let first = options.value().unwrap();
        let second = options.value().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.built, 1);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_repeats_on_every_access() {
        let registrations = OptionsBuilder::<Counter>::new()
            .validate(|c| c.built > 0, "never configured")
            .build_registrations();
        let options = Options::new(Arc::new(OptionsFactory::new(Arc::new(registrations))));

        for _ in 0..3 {
            let err = options.value().unwrap_err();
            assert!(err.is_validation_failure());
        }
    }
}
