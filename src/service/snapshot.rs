// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scope-lifetime accessor.

use super::cache::OptionsCache;
use super::factory::OptionsFactory;
use crate::domain::{OptionsName, Result};
use std::sync::Arc;

/// Memoizes options per unit of work.
///
/// Create one per request (or other short scope) with
/// [`OptionsServices::snapshot`](super::OptionsServices::snapshot). Each name is built at most
/// once per snapshot, and repeated reads return the same instance even if the monitor has seen
/// newer configuration in the meantime.
pub struct OptionsSnapshot<T> {
    factory: Arc<OptionsFactory<T>>,
    cache: OptionsCache<T>,
}

impl<T: Send + Sync + 'static> OptionsSnapshot<T> {
    /// Creates an empty snapshot over `factory`.
    pub fn new(factory: Arc<OptionsFactory<T>>) -> Self {
        Self {
            factory,
            cache: OptionsCache::new(),
        }
    }

    /// The instance for the selected name, the default name unless a selector was registered.
    pub fn value(&self) -> Result<Arc<T>> {
        self.get(&self.factory.selected_name())
    }

    /// The instance for `name`.
    pub fn get(&self, name: &OptionsName) -> Result<Arc<T>> {
        self.cache
            .get_or_add(name, |name| self.factory.create(name))
    }
}

impl<T> std::fmt::Debug for OptionsSnapshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsSnapshot")
            .field("cached", &self.cache.names())
            .finish_non_exhaustive()
    }
}
