// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition of everything registered for one options type.

use super::services::OptionsServices;
use crate::adapters::{
    Configuration, ConfigurationChangeTokenSource, ConfigureFromConfiguration, ConfigureNamed,
    PredicateValidator,
};
use crate::domain::{BoxError, NameFilter, OptionsName, ValidationLevel, ValidationStatus};
use crate::ports::{
    Bind, ConfigureOptions, DefaultInitializer, DefaultNameSelector, InitializeOptions,
    OptionsChangeTokenSource, OptionsNameSelector, OptionsRegistry, ValidateOptions,
};
use std::sync::Arc;

/// The registered configurators, validators and change sources for `T`.
///
/// Immutable once built.
pub struct OptionsRegistrations<T> {
    initializer: Box<dyn InitializeOptions<T>>,
    configurators: Vec<Arc<dyn ConfigureOptions<T>>>,
    validators: Vec<Arc<dyn ValidateOptions<T>>>,
    change_sources: Vec<Arc<dyn OptionsChangeTokenSource>>,
    validation_level: ValidationLevel,
    name_selector: Box<dyn OptionsNameSelector>,
    // Known names in registration order, default first.
    names: Vec<OptionsName>,
}

impl<T> OptionsRegistrations<T> {
    fn note_name(&mut self, name: Option<&OptionsName>) {
        if let Some(name) = name {
            if !self.names.contains(name) {
                self.names.push(name.clone());
            }
        }
    }
}

impl<T> OptionsRegistry<T> for OptionsRegistrations<T> {
    fn initializer(&self) -> &dyn InitializeOptions<T> {
        self.initializer.as_ref()
    }

    fn configurators(&self) -> &[Arc<dyn ConfigureOptions<T>>] {
        &self.configurators
    }

    fn validators(&self) -> &[Arc<dyn ValidateOptions<T>>] {
        &self.validators
    }

    fn change_sources(&self) -> &[Arc<dyn OptionsChangeTokenSource>] {
        &self.change_sources
    }

    fn validation_level(&self) -> ValidationLevel {
        self.validation_level
    }

    fn name_selector(&self) -> &dyn OptionsNameSelector {
        self.name_selector.as_ref()
    }

    fn names(&self) -> Vec<OptionsName> {
        self.names.clone()
    }
}

/// Fluent registration for one options type.
///
/// Registration order matters: configurators with equal order run in the order they were added.
///
/// # Examples
///
/// ```
/// use hexopts::domain::{NameFilter, OptionsName};
/// use hexopts::service::OptionsBuilder;
///
/// #[derive(Default)]
/// struct Pool {
///     size: usize,
/// }
///
/// let services = OptionsBuilder::<Pool>::new()
///     .configure(|p| p.size = 4)
///     .configure_named(OptionsName::new("batch").unwrap(), |p| p.size *= 8)
///     .validate(|p| p.size > 0, "size must be positive")
///     .build();
///
/// assert_eq!(services.options().value().unwrap().size, 4);
/// let batch = services.monitor().get(&OptionsName::new("batch").unwrap()).unwrap();
/// assert_eq!(batch.size, 32);
/// ```
pub struct OptionsBuilder<T> {
    registrations: OptionsRegistrations<T>,
}

impl<T: Default + Send + Sync + 'static> OptionsBuilder<T> {
    /// Starts with no registrations, the `T::default()` initializer and
    /// [`ValidationLevel::Invalid`].
    pub fn new() -> Self {
        Self {
            registrations: OptionsRegistrations {
                initializer: Box::new(DefaultInitializer),
                configurators: Vec::new(),
                validators: Vec::new(),
                change_sources: Vec::new(),
                validation_level: ValidationLevel::default(),
                name_selector: Box::new(DefaultNameSelector),
                names: vec![OptionsName::default_name()],
            },
        }
    }
}

impl<T: Default + Send + Sync + 'static> Default for OptionsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> OptionsBuilder<T> {
    /// Replaces the instance initializer.
    pub fn with_initializer(mut self, initializer: impl InitializeOptions<T> + 'static) -> Self {
        self.registrations.initializer = Box::new(initializer);
        self
    }

    /// Sets the validation strictness.
    pub fn validation_level(mut self, level: ValidationLevel) -> Self {
        self.registrations.validation_level = level;
        self
    }

    /// Sets the selector that picks the name `value` and `current_value` resolve.
    pub fn with_name_selector(mut self, selector: impl OptionsNameSelector + 'static) -> Self {
        self.registrations.name_selector = Box::new(selector);
        self
    }

    /// Adds any configurator.
    pub fn add_configurator(mut self, configurator: impl ConfigureOptions<T> + 'static) -> Self {
        self.registrations
            .note_name(configurator.target().target());
        self.registrations
            .configurators
            .push(Arc::new(configurator));
        self
    }

    /// Configures every name, at the default order.
    pub fn configure<F>(self, action: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.add_configurator(ConfigureNamed::new(NameFilter::All, action))
    }

    /// Configures one name. The default name targets every name.
    pub fn configure_named<F>(self, name: OptionsName, action: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.add_configurator(ConfigureNamed::new(name, action))
    }

    /// Configures the names matched by `target` at an explicit order.
    pub fn configure_ordered<F>(self, target: impl Into<NameFilter>, order: i32, action: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.add_configurator(ConfigureNamed::new(target, action).with_order(order))
    }

    /// Adds a configurator that may fail; its error aborts the build.
    pub fn try_configure<F, E>(self, target: impl Into<NameFilter>, action: F) -> Self
    where
        F: Fn(&OptionsName, &mut T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.add_configurator(ConfigureNamed::fallible(target, action))
    }

    /// Adds any validator.
    pub fn add_validator(mut self, validator: impl ValidateOptions<T> + 'static) -> Self {
        self.registrations.note_name(validator.target().target());
        self.registrations.validators.push(Arc::new(validator));
        self
    }

    /// Validates every name; `predicate` returning false is `Invalid` with `message`.
    pub fn validate<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add_validator(PredicateValidator::new(NameFilter::All, predicate, message))
    }

    /// Validates one name.
    pub fn validate_named<F>(self, name: OptionsName, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add_validator(PredicateValidator::new(name, predicate, message))
    }

    /// Validates the names matched by `target`, reporting `status` on failure.
    pub fn validate_with<F>(
        self,
        target: impl Into<NameFilter>,
        status: ValidationStatus,
        predicate: F,
        message: impl Into<String>,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add_validator(PredicateValidator::new(target, predicate, message).with_status(status))
    }

    /// Adds a change source; the monitor rebuilds `source.name()` whenever it fires.
    pub fn with_change_source(mut self, source: impl OptionsChangeTokenSource + 'static) -> Self {
        self.registrations.note_name(Some(source.name()));
        self.registrations.change_sources.push(Arc::new(source));
        self
    }

    /// Binds `configuration.section(section)` into the options named `name`, and rebuilds
    /// them whenever the configuration reloads.
    pub fn bind(self, name: OptionsName, configuration: &Configuration, section: &str) -> Self
    where
        T: Bind,
    {
        self.add_configurator(ConfigureFromConfiguration::new(
            name.clone(),
            configuration.clone(),
            section,
        ))
        .with_change_source(ConfigurationChangeTokenSource::new(
            name,
            configuration.clone(),
        ))
    }

    /// Finishes registration without building any accessor.
    pub fn build_registrations(self) -> OptionsRegistrations<T> {
        self.registrations
    }

    /// Finishes registration and returns the accessors.
    pub fn build(self) -> OptionsServices<T> {
        OptionsServices::new(Arc::new(self.registrations))
    }
}
