// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration lookup port.
//!
//! This is the seam where a host's composition root hands the options core "every configurator,
//! validator and change source registered for `T`". The bundled implementation is
//! [`OptionsRegistrations`](crate::service::OptionsRegistrations), produced by
//! [`OptionsBuilder`](crate::service::OptionsBuilder).

use crate::domain::{OptionsName, ValidationLevel};
use crate::ports::{ConfigureOptions, InitializeOptions, OptionsChangeTokenSource, ValidateOptions};
use std::sync::Arc;

/// Everything registered for one options type.
pub trait OptionsRegistry<T>: Send + Sync {
    /// Creates the instance that configurators mutate.
    fn initializer(&self) -> &dyn InitializeOptions<T>;

    /// Configurators in registration order. The factory sorts them by order.
    fn configurators(&self) -> &[Arc<dyn ConfigureOptions<T>>];

    /// Validators in registration order.
    fn validators(&self) -> &[Arc<dyn ValidateOptions<T>>];

    /// Change sources watched by the monitor.
    fn change_sources(&self) -> &[Arc<dyn OptionsChangeTokenSource>];

    /// Strictness applied to aggregate validation results.
    fn validation_level(&self) -> ValidationLevel;

    /// Chooses the name that `value` and `current_value` resolve.
    fn name_selector(&self) -> &dyn OptionsNameSelector {
        &DefaultNameSelector
    }

    /// Every name this registry knows about, starting with the default name.
    ///
    /// The provided implementation lists the explicit targets of configurators, then validators,
    /// then the names of change sources. Implementations that record registration order should
    /// return names in the order they were first registered.
    fn names(&self) -> Vec<OptionsName> {
        let mut names = vec![OptionsName::default_name()];
        let targets = self
            .configurators()
            .iter()
            .filter_map(|c| c.target().target().cloned())
            .chain(
                self.validators()
                    .iter()
                    .filter_map(|v| v.target().target().cloned()),
            )
            .chain(self.change_sources().iter().map(|s| s.name().clone()));
        for name in targets {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Picks the options name resolved by the unnamed accessors.
///
/// Closures returning an [`OptionsName`] implement this trait.
pub trait OptionsNameSelector: Send + Sync {
    /// The name to resolve right now.
    fn resolve_name(&self) -> OptionsName;
}

/// Always selects the default name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNameSelector;

impl OptionsNameSelector for DefaultNameSelector {
    fn resolve_name(&self) -> OptionsName {
        OptionsName::default_name()
    }
}

impl<F> OptionsNameSelector for F
where
    F: Fn() -> OptionsName + Send + Sync,
{
    fn resolve_name(&self) -> OptionsName {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selector_picks_default_name() {
        assert!(DefaultNameSelector.resolve_name().is_default());
    }

    #[test]
    fn test_closure_selector() {
        let selector = || OptionsName::new("tenant").unwrap();
        assert_eq!(selector.resolve_name().as_str(), "tenant");
    }
}
