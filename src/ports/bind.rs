// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binder port: populate an options object from a configuration section.

use crate::domain::ConfigSection;

/// Types that can populate themselves from a [`ConfigSection`].
///
/// Implementations are expected to be best-effort: use the `bind_*` helpers on
/// [`ConfigSection`], which skip missing keys and swallow conversion failures.
///
/// # Examples
///
/// ```rust
/// use hexopts::domain::{ConfigKey, ConfigSection, ConfigValue};
/// use hexopts::ports::Bind;
///
/// #[derive(Default)]
/// struct CacheOptions {
///     capacity: usize,
///     enabled: bool,
/// }
///
/// impl Bind for CacheOptions {
///     fn bind(&mut self, section: &ConfigSection) {
///         section.bind_value("capacity", &mut self.capacity);
///         section.bind_flag("enabled", &mut self.enabled);
///     }
/// }
///
/// let section = ConfigSection::new(
///     ConfigKey::from("cache"),
///     [(ConfigKey::from("capacity"), ConfigValue::from("64"))],
/// );
/// let mut options = CacheOptions::default();
/// options.bind(&section);
/// assert_eq!(options.capacity, 64);
/// assert!(!options.enabled);
/// ```
pub trait Bind {
    /// Assigns every property found in `section`, leaving the rest untouched.
    fn bind(&mut self, section: &ConfigSection);
}
