// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process change tokens.
//!
//! [`ReloadToken`] is the one-shot token handed out by [`Configuration`](super::Configuration).
//! [`ReloadTokenSource`] pairs a rotating token with an options name and is the simplest way to
//! drive a monitor by hand.

use crate::domain::OptionsName;
use crate::ports::{ChangeToken, OptionsChangeTokenSource, Registration, TokenCallback};
use std::sync::{Arc, Mutex, PoisonError, Weak};

#[derive(Default)]
struct TokenState {
    fired: bool,
    next_id: u64,
    callbacks: Vec<(u64, TokenCallback)>,
}

/// A change token fired explicitly by its owner.
///
/// Clones share state. Callbacks run on the thread that calls [`fire`](ReloadToken::fire),
/// after the internal lock is released, so a callback may register on (or fire) other tokens.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::ReloadToken;
/// use hexopts::ports::ChangeToken;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let token = ReloadToken::new();
/// let seen = Arc::new(AtomicBool::new(false));
/// let flag = seen.clone();
/// let _registration = token.register_callback(Box::new(move || {
///     flag.store(true, Ordering::SeqCst);
/// }));
///
/// token.fire();
/// assert!(token.has_changed());
/// assert!(seen.load(Ordering::SeqCst));
/// ```
#[derive(Clone, Default)]
pub struct ReloadToken {
    state: Arc<Mutex<TokenState>>,
}

impl ReloadToken {
    /// Creates an unfired token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token, running every registered callback once. Later calls do nothing.
    pub fn fire(&self) {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.fired {
                return;
            }
            state.fired = true;
            std::mem::take(&mut state.callbacks)
        };
        tracing::trace!("Firing reload token with {} callback(s)", callbacks.len());
        for (_, callback) in callbacks {
            callback();
        }
    }

    fn unregister(state: &Weak<Mutex<TokenState>>, id: u64) {
        if let Some(state) = state.upgrade() {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .retain(|(registered, _)| *registered != id);
        }
    }
}

impl ChangeToken for ReloadToken {
    fn has_changed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fired
    }

    fn register_callback(&self, callback: TokenCallback) -> Registration {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fired {
            drop(state);
            callback();
            return Registration::empty();
        }
        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.push((id, callback));

        let weak = Arc::downgrade(&self.state);
        Registration::new(move || ReloadToken::unregister(&weak, id))
    }
}

impl std::fmt::Debug for ReloadToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadToken")
            .field("has_changed", &self.has_changed())
            .finish()
    }
}

/// A change source for one options name, triggered manually.
///
/// Each [`trigger`](ReloadTokenSource::trigger) installs a fresh token and then fires the
/// previous one. Clones share the same token.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::ReloadTokenSource;
/// use hexopts::domain::OptionsName;
/// use hexopts::ports::OptionsChangeTokenSource;
///
/// let source = ReloadTokenSource::new(OptionsName::default_name());
/// let first = source.change_token();
/// source.trigger();
/// assert!(first.has_changed());
/// assert!(!source.change_token().has_changed());
/// ```
#[derive(Clone, Debug)]
pub struct ReloadTokenSource {
    name: OptionsName,
    token: Arc<Mutex<ReloadToken>>,
}

impl ReloadTokenSource {
    /// Creates a source that signals changes to `name`.
    pub fn new(name: OptionsName) -> Self {
        Self {
            name,
            token: Arc::new(Mutex::new(ReloadToken::new())),
        }
    }

    /// Signals a change.
    pub fn trigger(&self) {
        let previous = {
            let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *token, ReloadToken::new())
        };
        previous.fire();
    }
}

impl OptionsChangeTokenSource for ReloadTokenSource {
    fn name(&self) -> &OptionsName {
        &self.name
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Arc::new(token)
    }
}
