// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change token ports.
//!
//! A change token is a one-shot notification handle: it fires at most once, when the
//! underlying configuration changes. Watching for the next change means asking the source for
//! a new token. Producers install the replacement token *before* firing the old one, so a
//! consumer that re-subscribes from inside its callback never misses a change.

use crate::domain::OptionsName;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Callback run when a token fires.
pub type TokenCallback = Box<dyn FnOnce() + Send>;

/// A single-fire change notification handle.
pub trait ChangeToken: Send + Sync {
    /// Returns true once the token has fired.
    fn has_changed(&self) -> bool;

    /// Registers `callback` to run exactly once when the token fires.
    ///
    /// If the token has already fired the callback runs immediately on the calling thread.
    /// The callback is dropped without running if the returned [`Registration`] is disposed
    /// first.
    fn register_callback(&self, callback: TokenCallback) -> Registration;
}

/// Produces the change tokens that signal a rebuild of one options name.
pub trait OptionsChangeTokenSource: Send + Sync {
    /// The options name to rebuild when a token from this source fires.
    fn name(&self) -> &OptionsName;

    /// Returns the token for the next change.
    fn change_token(&self) -> Arc<dyn ChangeToken>;
}

/// A disposable callback registration.
///
/// Disposing is idempotent and also happens on drop.
///
/// # Examples
///
/// ```
/// use hexopts::ports::Registration;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let disposed = Arc::new(AtomicUsize::new(0));
/// let counter = disposed.clone();
/// let registration = Registration::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// registration.dispose();
/// registration.dispose();
/// drop(registration);
/// assert_eq!(disposed.load(Ordering::SeqCst), 1);
/// ```
#[must_use = "dropping a Registration disposes it"]
pub struct Registration {
    dispose: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Registration {
    /// Creates a registration that runs `dispose` the first time it is disposed.
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Mutex::new(Some(Box::new(dispose))),
        }
    }

    /// A registration with nothing to undo.
    pub fn empty() -> Self {
        Self {
            dispose: Mutex::new(None),
        }
    }

    /// Undoes the registration. Later calls do nothing.
    pub fn dispose(&self) {
        let dispose = self
            .dispose
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(dispose) = dispose {
            dispose();
        }
    }

    /// Returns true once disposed, or if there was never anything to dispose.
    pub fn is_disposed(&self) -> bool {
        self.dispose
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_registration_disposes_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let registration = Registration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!registration.is_disposed());

        registration.dispose();
        registration.dispose();
        assert!(registration.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_disposes_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        {
            let _registration = Registration::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_registration() {
        let registration = Registration::empty();
        assert!(registration.is_disposed());
        registration.dispose();
    }

    #[test]
    fn test_ports_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ChangeToken>();
        assert_send_sync::<dyn OptionsChangeTokenSource>();
        assert_send_sync::<Registration>();
    }
}
