// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds fresh options instances.

use crate::domain::{short_type_name, OptionsError, OptionsName, Result, ValidationResult};
use crate::ports::{ConfigureOptions, OptionsRegistry};
use std::sync::Arc;

/// Creates options instances for a name: initialize, configure in order, then validate.
///
/// Configurators whose filter matches the name run sorted by `(order, registration order)`,
/// each exactly once per build. Validators whose filter matches then run and their results are
/// aggregated; the registry's [`ValidationLevel`](crate::domain::ValidationLevel) decides whether
/// the aggregate is raised as [`OptionsError::ValidationFailed`].
///
/// The factory never caches; see [`OptionsCache`](super::OptionsCache).
pub struct OptionsFactory<T> {
    registry: Arc<dyn OptionsRegistry<T>>,
    options_type: String,
}

impl<T: 'static> OptionsFactory<T> {
    /// Creates a factory over `registry`.
    pub fn new(registry: Arc<dyn OptionsRegistry<T>>) -> Self {
        Self {
            registry,
            options_type: short_type_name::<T>(),
        }
    }

    /// The registry this factory reads.
    pub fn registry(&self) -> &Arc<dyn OptionsRegistry<T>> {
        &self.registry
    }

    /// The name the unnamed accessors currently resolve.
    pub fn selected_name(&self) -> OptionsName {
        self.registry.name_selector().resolve_name()
    }

    /// Short type name used in error messages.
    pub fn options_type(&self) -> &str {
        &self.options_type
    }

    /// Builds a new instance for `name`.
    pub fn create(&self, name: &OptionsName) -> Result<T> {
        let mut options = self.registry.initializer().initialize(name);

        for configurator in self.applicable_configurators(name) {
            configurator
                .configure(name, &mut options)
                .map_err(|source| OptionsError::ConfigurationAction {
                    options_type: self.options_type.clone(),
                    name: name.to_string(),
                    source,
                })?;
        }

        let results = self
            .registry
            .validators()
            .iter()
            .filter(|v| v.target().matches(name))
            .map(|v| v.validate(name, &options));
        let verdict = ValidationResult::aggregate(&self.options_type, name, results);

        if self.registry.validation_level().rejects(verdict.status()) {
            return Err(OptionsError::ValidationFailed {
                options_type: self.options_type.clone(),
                name: name.to_string(),
                message: verdict.message().unwrap_or_default().to_string(),
            });
        }
        if !verdict.is_valid() {
            tracing::debug!(
                "Accepting {} '{}' below validation threshold: {}",
                self.options_type,
                name,
                verdict.message().unwrap_or_default()
            );
        }

        tracing::debug!("Built {} options for name '{}'", self.options_type, name);
        Ok(options)
    }

    fn applicable_configurators(&self, name: &OptionsName) -> Vec<&Arc<dyn ConfigureOptions<T>>> {
        let mut configurators: Vec<_> = self
            .registry
            .configurators()
            .iter()
            .filter(|c| c.target().matches(name))
            .collect();
        // Stable: equal orders keep registration order.
        configurators.sort_by_key(|c| c.order());
        configurators
    }
}

impl<T> std::fmt::Debug for OptionsFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsFactory")
            .field("options_type", &self.options_type)
            .field("configurators", &self.registry.configurators().len())
            .field("validators", &self.registry.validators().len())
            .finish()
    }
}
