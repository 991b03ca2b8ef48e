// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validator port.

use crate::domain::{NameFilter, OptionsName, ValidationResult};

/// A unit of validation logic run against a fully configured options instance.
///
/// The factory only calls validators whose [`target`](ValidateOptions::target) matches the name
/// being built, then aggregates their results.
///
/// # Examples
///
/// ```rust
/// use hexopts::domain::{NameFilter, OptionsName, ValidationResult};
/// use hexopts::ports::ValidateOptions;
///
/// #[derive(Default)]
/// struct ServerOptions {
///     port: u16,
/// }
///
/// struct PortRequired {
///     target: NameFilter,
/// }
///
/// impl ValidateOptions<ServerOptions> for PortRequired {
///     fn target(&self) -> &NameFilter {
///         &self.target
///     }
///
///     fn validate(&self, _name: &OptionsName, options: &ServerOptions) -> ValidationResult {
///         if options.port == 0 {
///             ValidationResult::invalid("port must be set")
///         } else {
///             ValidationResult::valid()
///         }
///     }
/// }
/// ```
pub trait ValidateOptions<T>: Send + Sync {
    /// The names this validator applies to.
    fn target(&self) -> &NameFilter;

    /// Inspects `options`, built for `name`, and returns a verdict.
    fn validate(&self, name: &OptionsName, options: &T) -> ValidationResult;
}
