// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closure-backed configurators.

use crate::domain::{BoxError, NameFilter, OptionsName};
use crate::ports::{ConfigureOptions, DEFAULT_ORDER};

type ConfigureFn<T> = dyn Fn(&OptionsName, &mut T) -> Result<(), BoxError> + Send + Sync;

/// A configurator built from a closure, a [`NameFilter`] and an order.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::ConfigureNamed;
/// use hexopts::domain::{NameFilter, OptionsName};
/// use hexopts::ports::ConfigureOptions;
///
/// #[derive(Default)]
/// struct Greeting {
///     text: String,
/// }
///
/// let configurator = ConfigureNamed::new(NameFilter::All, |g: &mut Greeting| {
///     g.text.push_str("hello");
/// })
/// .with_order(-1);
///
/// let mut greeting = Greeting::default();
/// configurator
///     .configure(&OptionsName::default_name(), &mut greeting)
///     .unwrap();
/// assert_eq!(greeting.text, "hello");
/// assert_eq!(configurator.order(), -1);
/// ```
pub struct ConfigureNamed<T> {
    target: NameFilter,
    order: i32,
    action: Box<ConfigureFn<T>>,
}

impl<T> ConfigureNamed<T> {
    /// Wraps an infallible mutation.
    pub fn new<F>(target: impl Into<NameFilter>, action: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        Self::from_boxed(
            target.into(),
            Box::new(move |_, options| {
                action(options);
                Ok(())
            }),
        )
    }

    /// Wraps a mutation that also receives the name being built.
    pub fn with_name<F>(target: impl Into<NameFilter>, action: F) -> Self
    where
        F: Fn(&OptionsName, &mut T) + Send + Sync + 'static,
    {
        Self::from_boxed(
            target.into(),
            Box::new(move |name, options| {
                action(name, options);
                Ok(())
            }),
        )
    }

    /// Wraps a mutation that can fail. An error aborts the build.
    pub fn fallible<F, E>(target: impl Into<NameFilter>, action: F) -> Self
    where
        F: Fn(&OptionsName, &mut T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::from_boxed(
            target.into(),
            Box::new(move |name, options| action(name, options).map_err(Into::into)),
        )
    }

    fn from_boxed(target: NameFilter, action: Box<ConfigureFn<T>>) -> Self {
        Self {
            target,
            order: DEFAULT_ORDER,
            action,
        }
    }

    /// Sets the order; lower runs first.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl<T> ConfigureOptions<T> for ConfigureNamed<T> {
    fn target(&self) -> &NameFilter {
        &self.target
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn configure(&self, name: &OptionsName, options: &mut T) -> Result<(), BoxError> {
        (self.action)(name, options)
    }
}

impl<T> std::fmt::Debug for ConfigureNamed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigureNamed")
            .field("target", &self.target)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
