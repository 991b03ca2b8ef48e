// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-updating accessor.
//!
//! # Change handling
//!
//! The monitor registers a callback on the current token of every change source. When a token
//! fires, the callback:
//!
//! 1. re-registers on the source's *current* token (sources install the new token before firing
//!    the old one, so no change can slip between the two),
//! 2. invalidates the cached instance for the source's name,
//! 3. rebuilds it eagerly,
//! 4. hands the new instance to every listener.
//!
//! Steps 2 to 4 for one name are serialized by a per-name gate. A change that lands while the
//! gate is held (from another thread, or from a listener on the same thread) only marks the
//! name pending; the holder loops and runs the sequence again. Changes are therefore coalesced
//! but never lost, and a reentrant change cannot deadlock.

use super::cache::OptionsCache;
use super::factory::OptionsFactory;
use crate::domain::{OptionsName, Result};
use crate::ports::{ChangeToken, OptionsChangeTokenSource, Registration};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// A change listener: receives the rebuilt instance and the name it was built for.
pub type Listener<T> = dyn Fn(&Arc<T>, &OptionsName) + Send + Sync;

#[derive(Default)]
struct ChangeGate {
    running: AtomicBool,
    pending: AtomicBool,
}

struct SourceWatch {
    source: Arc<dyn OptionsChangeTokenSource>,
    // Registrations on tokens that have not fired yet.
    registrations: Mutex<Vec<(Arc<dyn ChangeToken>, Registration)>>,
}

struct MonitorInner<T> {
    factory: Arc<OptionsFactory<T>>,
    cache: Arc<OptionsCache<T>>,
    listeners: Mutex<Vec<(u64, Arc<Listener<T>>)>>,
    next_listener: AtomicU64,
    gates: Mutex<HashMap<OptionsName, Arc<ChangeGate>>>,
    watches: Vec<SourceWatch>,
}

/// Options that follow configuration changes.
///
/// Reads go through a shared [`OptionsCache`]: [`current_value`](Self::current_value) and
/// [`get`](Self::get) always return the most recent successful build. Clones share state.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::ReloadTokenSource;
/// use hexopts::domain::OptionsName;
/// use hexopts::service::OptionsBuilder;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Generation {
///     number: usize,
/// }
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let source = ReloadTokenSource::new(OptionsName::default_name());
/// let services = OptionsBuilder::<Generation>::new()
///     .configure({
///         let counter = counter.clone();
///         move |g| g.number = counter.fetch_add(1, Ordering::SeqCst) + 1
///     })
///     .with_change_source(source.clone())
///     .build();
///
/// let monitor = services.monitor();
/// assert_eq!(monitor.current_value().unwrap().number, 1);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let _handle = monitor.on_change(move |g: &Arc<Generation>, _name: &OptionsName| {
///     sink.lock().unwrap().push(g.number);
/// });
///
/// source.trigger();
/// assert_eq!(*seen.lock().unwrap(), vec![2]);
/// assert_eq!(monitor.current_value().unwrap().number, 2);
/// ```
pub struct OptionsMonitor<T> {
    inner: Arc<MonitorInner<T>>,
}

impl<T> Clone for OptionsMonitor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> OptionsMonitor<T> {
    /// Creates a monitor and subscribes to every change source of the factory's registry.
    pub fn new(factory: Arc<OptionsFactory<T>>, cache: Arc<OptionsCache<T>>) -> Self {
        let watches = factory
            .registry()
            .change_sources()
            .iter()
            .map(|source| SourceWatch {
                source: source.clone(),
                registrations: Mutex::new(Vec::new()),
            })
            .collect();
        let inner = Arc::new(MonitorInner {
            factory,
            cache,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            gates: Mutex::new(HashMap::new()),
            watches,
        });
        for index in 0..inner.watches.len() {
            MonitorInner::subscribe(&inner, index);
        }
        Self { inner }
    }

    /// The current instance for the selected name (the default name unless a selector was
    /// registered).
    pub fn current_value(&self) -> Result<Arc<T>> {
        self.get(&self.inner.factory.selected_name())
    }

    /// The current instance for `name`, building it if needed.
    pub fn get(&self, name: &OptionsName) -> Result<Arc<T>> {
        self.inner.get(name)
    }

    /// Registers `listener` for every subsequent rebuild of any name.
    ///
    /// The listener stays registered until the returned handle is disposed or dropped. It does
    /// not receive notifications dispatched before it was added.
    pub fn on_change<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<T>, &OptionsName) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let weak: Weak<MonitorInner<T>> = Arc::downgrade(&self.inner);
        ListenerHandle {
            registration: Registration::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .listeners
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(registered, _)| *registered != id);
                }
            }),
        }
    }

    /// Registers `listener` for rebuilds of `name` only.
    pub fn on_change_of<F>(&self, name: OptionsName, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        self.on_change(move |value, changed| {
            if *changed == name {
                listener(value);
            }
        })
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Invalidates and rebuilds `name` as if one of its change sources had fired, then returns
    /// the rebuilt instance.
    ///
    /// A failed rebuild is returned as is; the factory is not run a second time. If a change for
    /// `name` is already being processed on another thread, this request is folded into it and
    /// the value returned is whatever that processing has published so far.
    pub fn invalidate_and_rebuild(&self, name: &OptionsName) -> Result<Arc<T>> {
        match self.inner.process_change(name) {
            Some(rebuilt) => rebuilt,
            None => self.inner.get(name),
        }
    }

    /// The cache backing this monitor.
    pub fn cache(&self) -> &Arc<OptionsCache<T>> {
        &self.inner.cache
    }
}

impl<T: Send + Sync + 'static> MonitorInner<T> {
    fn get(&self, name: &OptionsName) -> Result<Arc<T>> {
        self.cache.get_or_add(name, |name| self.factory.create(name))
    }

    fn subscribe(inner: &Arc<Self>, index: usize) {
        let watch = &inner.watches[index];
        let token = watch.source.change_token();
        let weak = Arc::downgrade(inner);
        // May run inline if the token has already fired.
        let registration = token.register_callback(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                MonitorInner::on_token_fired(&inner, index);
            }
        }));

        let mut registrations = watch
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        registrations.retain(|(token, _)| !token.has_changed());
        if !token.has_changed() {
            registrations.push((token, registration));
        }
    }

    fn on_token_fired(inner: &Arc<Self>, index: usize) {
        MonitorInner::subscribe(inner, index);
        let name = inner.watches[index].source.name().clone();
        tracing::debug!("Change token fired for options '{}'", name);
        // Failures are logged by `process_change`.
        let _ = inner.process_change(&name);
    }

    fn gate(&self, name: &OptionsName) -> Arc<ChangeGate> {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.clone())
            .or_default()
            .clone()
    }

    /// Runs the invalidate, rebuild, dispatch sequence for `name` until no change is pending.
    ///
    /// Returns the outcome of the last rebuild this call ran, or `None` if the change was handed
    /// to a thread already processing `name`.
    fn process_change(&self, name: &OptionsName) -> Option<Result<Arc<T>>> {
        let gate = self.gate(name);
        gate.pending.store(true, Ordering::SeqCst);
        if gate.running.swap(true, Ordering::SeqCst) {
            tracing::trace!("Coalescing change for options '{}'", name);
            self.release_gate(name, gate);
            return None;
        }

        let mut last;
        loop {
            gate.pending.store(false, Ordering::SeqCst);
            last = self
                .cache
                .rebuild(name, |name| self.factory.create(name));
            match &last {
                Ok(value) => self.dispatch(value, name),
                Err(e) => tracing::warn!(
                    "Rebuilding {} options '{}' after a change failed: {}",
                    self.factory.options_type(),
                    name,
                    e
                ),
            }

            if gate.pending.load(Ordering::SeqCst) {
                continue;
            }
            gate.running.store(false, Ordering::SeqCst);
            // A change may have arrived between the check and the release.
            if !gate.pending.load(Ordering::SeqCst) || gate.running.swap(true, Ordering::SeqCst) {
                break;
            }
        }
        self.release_gate(name, gate);
        Some(last)
    }

    // Gates only live while a change for their name is being processed.
    fn release_gate(&self, name: &OptionsName, gate: Arc<ChangeGate>) {
        drop(gate);
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        if gates
            .get(name)
            .map_or(false, |gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(name);
        }
    }

    fn dispatch(&self, value: &Arc<T>, name: &OptionsName) {
        let listeners: Vec<Arc<Listener<T>>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        tracing::trace!(
            "Dispatching options '{}' to {} listener(s)",
            name,
            listeners.len()
        );
        for listener in listeners {
            listener(value, name);
        }
    }
}

impl<T> std::fmt::Debug for OptionsMonitor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsMonitor")
            .field("sources", &self.inner.watches.len())
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

/// Keeps a monitor listener registered.
///
/// Disposing (explicitly or by dropping) removes only this listener. A dispatch already in
/// progress may still call it once.
#[must_use = "dropping a ListenerHandle removes the listener"]
#[derive(Debug)]
pub struct ListenerHandle {
    registration: Registration,
}

impl ListenerHandle {
    /// Removes the listener. Later calls do nothing.
    pub fn dispose(&self) {
        self.registration.dispose();
    }

    /// Whether the listener has been removed.
    pub fn is_disposed(&self) -> bool {
        self.registration.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ReloadTokenSource;
    use crate::service::OptionsBuilder;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default, Debug)]
    struct Versioned {
        version: usize,
    }

    fn counting_services(
        source: &ReloadTokenSource,
    ) -> (crate::service::OptionsServices<Versioned>, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let services = OptionsBuilder::<Versioned>::new()
            .configure(move |v| v.version = counter.fetch_add(1, Ordering::SeqCst) + 1)
            .with_change_source(source.clone())
            .build();
        (services, builds)
    }

    #[test]
    fn test_reads_are_cached_until_change() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, builds) = counting_services(&source);
        let monitor = services.monitor();

        let a = monitor.current_value().unwrap();
        let b = monitor.get(&OptionsName::default_name()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        source.trigger();
        let c = monitor.current_value().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.version, 2);
    }

    #[test]
    fn test_listener_receives_new_value() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();
        monitor.current_value().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _handle = monitor.on_change(move |v, name| {
            sink.lock().unwrap().push((v.version, name.clone()));
        });

        source.trigger();
        source.trigger();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (2, OptionsName::default_name()),
                (3, OptionsName::default_name())
            ]
        );
    }

    #[test]
    fn test_disposed_listener_is_not_called() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();

        let removed = Arc::new(AtomicUsize::new(0));
        let kept = Arc::new(AtomicUsize::new(0));
        let removed_counter = removed.clone();
        let kept_counter = kept.clone();
        let handle = monitor.on_change(move |_, _| {
            removed_counter.fetch_add(1, Ordering::SeqCst);
        });
        let _kept_handle = monitor.on_change(move |_, _| {
            kept_counter.fetch_add(1, Ordering::SeqCst);
        });

        source.trigger();
        handle.dispose();
        handle.dispose();
        source.trigger();

        assert!(handle.is_disposed());
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert_eq!(kept.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.listener_count(), 1);
    }

    #[test]
    fn test_dropping_handle_removes_listener() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();
        {
            let _handle = monitor.on_change(|_, _| {});
            assert_eq!(monitor.listener_count(), 1);
        }
        assert_eq!(monitor.listener_count(), 0);
    }

    #[test]
    fn test_on_change_of_filters_by_name() {
        let a = OptionsName::new("a").unwrap();
        let source_a = ReloadTokenSource::new(a.clone());
        let source_b = ReloadTokenSource::new(OptionsName::new("b").unwrap());
        let services = OptionsBuilder::<Versioned>::new()
            .with_change_source(source_a.clone())
            .with_change_source(source_b.clone())
            .build();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _handle = services.monitor().on_change_of(a, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        source_b.trigger();
        source_a.trigger();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_rebuild_leaves_entry_unbuilt() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let fail = Arc::new(AtomicBool::new(false));
        let flag = fail.clone();
        let services = OptionsBuilder::<Versioned>::new()
            .validate(move |_| !flag.load(Ordering::SeqCst), "switched off")
            .with_change_source(source.clone())
            .build();
        let monitor = services.monitor();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let _handle = monitor.on_change(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        monitor.current_value().unwrap();
        fail.store(true, Ordering::SeqCst);
        source.trigger();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(monitor.cache().get(&OptionsName::default_name()).is_none());
        assert!(monitor.current_value().is_err());

        fail.store(false, Ordering::SeqCst);
        source.trigger();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(monitor.current_value().is_ok());
    }

    #[test]
    fn test_reentrant_trigger_is_coalesced() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let retrigger = source.clone();
        let _handle = monitor.on_change(move |v, _| {
            sink.lock().unwrap().push(v.version);
            if v.version == 1 {
                retrigger.trigger();
            }
        });

        monitor
            .invalidate_and_rebuild(&OptionsName::default_name())
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_invalidate_and_rebuild_returns_new_value() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();

        let before = monitor.current_value().unwrap();
        let after = monitor
            .invalidate_and_rebuild(&OptionsName::default_name())
            .unwrap();
        assert_eq!(before.version + 1, after.version);
        assert!(Arc::ptr_eq(&after, &monitor.current_value().unwrap()));
    }

    #[test]
    fn test_failed_invalidate_and_rebuild_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let services = OptionsBuilder::<Versioned>::new()
            .configure(move |v| v.version = counter.fetch_add(1, Ordering::SeqCst) + 1)
            .validate(|_| false, "always rejected")
            .build();
        let monitor = services.monitor();

        let err = monitor
            .invalidate_and_rebuild(&OptionsName::default_name())
            .unwrap_err();
        assert!(err.is_validation_failure());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(monitor.cache().get(&OptionsName::default_name()).is_none());
    }

    #[test]
    fn test_gates_released_after_changes() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, _) = counting_services(&source);
        let monitor = services.monitor();

        source.trigger();
        for i in 0..50 {
            let name = OptionsName::new(format!("tenant-{}", i)).unwrap();
            monitor.invalidate_and_rebuild(&name).unwrap();
        }
        assert!(monitor.inner.gates.lock().unwrap().is_empty());
    }

    #[test]
    fn test_monitor_drop_releases_token_registrations() {
        let source = ReloadTokenSource::new(OptionsName::default_name());
        let (services, builds) = counting_services(&source);
        services.monitor().current_value().unwrap();
        drop(services);

        source.trigger();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
