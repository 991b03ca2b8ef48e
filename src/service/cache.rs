// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-name memoizing store for built options.
//!
//! Reads take a shared lock only. A miss takes the per-name build lock, checks again, builds,
//! stores and releases, so at most one build per name is ever in flight and every concurrent
//! requester ends up with the same `Arc`. Builds of different names never wait for each other.

use crate::domain::{OptionsName, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A thread-safe cache of options instances keyed by name.
///
/// An absent entry means "not built" (either never requested, invalidated, or its last build
/// failed). "Under construction" is tracked separately by the per-name build lock, so an
/// invalidated entry can never be mistaken for one being built.
///
/// # Examples
///
/// ```
/// use hexopts::domain::OptionsName;
/// use hexopts::service::OptionsCache;
/// use std::sync::Arc;
///
/// let cache: OptionsCache<String> = OptionsCache::new();
/// let name = OptionsName::default_name();
///
/// let first = cache.get_or_add(&name, |_| Ok("built".to_string())).unwrap();
/// let second = cache.get_or_add(&name, |_| Ok("never runs".to_string())).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
///
/// assert!(cache.remove(&name));
/// assert!(cache.get(&name).is_none());
/// ```
pub struct OptionsCache<T> {
    entries: RwLock<HashMap<OptionsName, Arc<T>>>,
    build_locks: Mutex<HashMap<OptionsName, Arc<Mutex<()>>>>,
}

impl<T> OptionsCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached instance, if built.
    pub fn get(&self, name: &OptionsName) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Stores `value`, replacing any previous instance.
    pub fn put(&self, name: &OptionsName, value: Arc<T>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), value);
    }

    /// Stores `value` unless an instance is already cached. Returns whether it was stored.
    pub fn try_add(&self, name: &OptionsName, value: Arc<T>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(name) {
            return false;
        }
        entries.insert(name.clone(), value);
        true
    }

    /// Marks `name` as needing a rebuild. Returns whether an instance was cached.
    pub fn remove(&self, name: &OptionsName) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Drops every cached instance.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Names with a cached instance, in no particular order.
    pub fn names(&self) -> Vec<OptionsName> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Returns the cached instance, building it with `build` if absent.
    ///
    /// `build` runs at most once per name across concurrent callers; the others block until it
    /// finishes and then observe its result. A failed build caches nothing and its error goes
    /// to the caller that ran it; a waiting caller then runs its own build.
    pub fn get_or_add<F>(&self, name: &OptionsName, build: F) -> Result<Arc<T>>
    where
        F: FnOnce(&OptionsName) -> Result<T>,
    {
        if let Some(value) = self.get(name) {
            tracing::trace!("Options cache hit for '{}'", name);
            return Ok(value);
        }

        self.with_build_lock(name, || -> Result<Arc<T>> {
            if let Some(value) = self.get(name) {
                return Ok(value);
            }

            let value = Arc::new(build(name)?);
            self.put(name, value.clone());
            Ok(value)
        })
    }

    /// Discards the cached instance and builds a new one, under the build lock for `name`.
    ///
    /// Readers arriving during the rebuild wait for it instead of building themselves. If
    /// `build` fails the entry is left absent.
    pub fn rebuild<F>(&self, name: &OptionsName, build: F) -> Result<Arc<T>>
    where
        F: FnOnce(&OptionsName) -> Result<T>,
    {
        self.with_build_lock(name, || -> Result<Arc<T>> {
            self.remove(name);
            let value = Arc::new(build(name)?);
            self.put(name, value.clone());
            Ok(value)
        })
    }

    // Build locks only live while someone holds or waits for them.
    fn with_build_lock<R>(&self, name: &OptionsName, f: impl FnOnce() -> R) -> R {
        let lock = self
            .build_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.clone())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);

        // Clones are only taken under `build_locks`, so a count of one means nobody is waiting.
        let mut locks = self.build_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(name)
            .map_or(false, |lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(name);
        }
        result
    }
}

impl<T> Default for OptionsCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for OptionsCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsCache")
            .field("names", &self.names())
            .finish()
    }
}
