// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reload trigger port.
//!
//! A watcher observes something outside the process (a file, typically) and invokes a callback
//! whenever it changes. [`Configuration::attach_watcher`](crate::adapters::Configuration::attach_watcher)
//! turns those callbacks into configuration reloads, which in turn fire change tokens.

use crate::domain::{ConfigKey, Result};
use std::sync::Arc;

/// Callback invoked with the key (or path) that changed.
pub type ChangeCallback = Arc<dyn Fn(ConfigKey) + Send + Sync>;

/// Something that can notify about external configuration changes.
///
/// # Examples
///
/// ```rust
/// use hexopts::domain::{ConfigKey, Result};
/// use hexopts::ports::{ChangeCallback, ConfigWatcher};
///
/// #[derive(Default)]
/// struct Manual {
///     callback: Option<ChangeCallback>,
/// }
///
/// impl Manual {
///     fn trigger(&self) {
///         if let Some(callback) = &self.callback {
///             callback(ConfigKey::from("settings.yaml"));
///         }
///     }
/// }
///
/// impl ConfigWatcher for Manual {
///     fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
///         self.callback = Some(callback);
///         Ok(())
///     }
///
///     fn stop(&mut self) -> Result<()> {
///         self.callback = None;
///         Ok(())
///     }
/// }
/// ```
pub trait ConfigWatcher: Send + Sync {
    /// Starts watching. The callback may run on a background thread and should return quickly.
    fn watch(&mut self, callback: ChangeCallback) -> Result<()>;

    /// Stops watching; no callbacks run after this returns.
    fn stop(&mut self) -> Result<()>;
}
