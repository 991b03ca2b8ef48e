// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configurator and initializer ports.
//!
//! A configurator mutates a freshly created options instance. The factory runs every
//! configurator whose [`NameFilter`] matches the requested name, ordered by
//! `(order, registration order)`.

use crate::domain::{BoxError, NameFilter, OptionsName};

/// Order given to configurators registered without an explicit order.
pub const DEFAULT_ORDER: i32 = 0;

/// A unit of configuration logic applied to an options instance.
///
/// # Thread Safety
///
/// Configurators are shared between every accessor and may run on any thread, so they must be
/// `Send + Sync`.
///
/// # Examples
///
/// ```rust
/// use hexopts::domain::{BoxError, NameFilter, OptionsName};
/// use hexopts::ports::ConfigureOptions;
///
/// #[derive(Default)]
/// struct ServerOptions {
///     port: u16,
/// }
///
/// struct DefaultPort {
///     target: NameFilter,
/// }
///
/// impl ConfigureOptions<ServerOptions> for DefaultPort {
///     fn target(&self) -> &NameFilter {
///         &self.target
///     }
///
///     fn configure(&self, _name: &OptionsName, options: &mut ServerOptions) -> Result<(), BoxError> {
///         options.port = 8080;
///         Ok(())
///     }
/// }
/// ```
pub trait ConfigureOptions<T>: Send + Sync {
    /// The names this configurator applies to.
    fn target(&self) -> &NameFilter;

    /// Sort key; lower runs first. Ties keep registration order.
    fn order(&self) -> i32 {
        DEFAULT_ORDER
    }

    /// Mutates `options`, which is being built for `name`.
    ///
    /// An error aborts the build; nothing is cached and the error reaches the caller.
    fn configure(&self, name: &OptionsName, options: &mut T) -> Result<(), BoxError>;
}

/// Creates the instance that configurators then mutate.
pub trait InitializeOptions<T>: Send + Sync {
    /// Returns a fresh instance for `name`.
    fn initialize(&self, name: &OptionsName) -> T;
}

/// Initializer that uses `T::default()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInitializer;

impl<T: Default> InitializeOptions<T> for DefaultInitializer {
    fn initialize(&self, _name: &OptionsName) -> T {
        T::default()
    }
}
