// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holds the services of several options types and validates them together.

use super::services::OptionsServices;
use crate::domain::{short_type_name, OptionsError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;

trait ErasedServices: Send + Sync {
    fn validate_all(&self) -> Result<()>;
    fn type_name(&self) -> String;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Send + Sync + 'static> ErasedServices for OptionsServices<T> {
    fn validate_all(&self) -> Result<()> {
        OptionsServices::validate_all(self)
    }

    fn type_name(&self) -> String {
        short_type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One [`OptionsServices`] per options type, looked up by type.
///
/// # Examples
///
/// ```
/// use hexopts::service::{OptionsBuilder, OptionsContainer};
///
/// #[derive(Default)]
/// struct Http {
///     port: u16,
/// }
///
/// #[derive(Default)]
/// struct Cache {
///     entries: usize,
/// }
///
/// let mut container = OptionsContainer::new();
/// container.register(OptionsBuilder::<Http>::new().configure(|h| h.port = 8080).build());
/// container.register(
///     OptionsBuilder::<Cache>::new()
///         .validate(|c| c.entries > 0, "entries must be positive")
///         .build(),
/// );
///
/// assert_eq!(container.get::<Http>().unwrap().options().value().unwrap().port, 8080);
/// let failures = container.validate_all().unwrap_err().into_failures();
/// assert_eq!(failures.len(), 1);
/// ```
#[derive(Default)]
pub struct OptionsContainer {
    services: HashMap<TypeId, Box<dyn ErasedServices>>,
    order: Vec<TypeId>,
}

impl OptionsContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the services for `T`, replacing any earlier registration for the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, services: OptionsServices<T>) {
        let id = TypeId::of::<T>();
        if self.services.insert(id, Box::new(services)).is_some() {
            tracing::debug!("Replacing {} options services", short_type_name::<T>());
        } else {
            self.order.push(id);
        }
    }

    /// The services for `T`, if registered.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&OptionsServices<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<OptionsServices<T>>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Runs [`OptionsServices::validate_all`] for every type in registration order and returns
    /// all failures as one flat [`OptionsError::Aggregate`].
    pub fn validate_all(&self) -> Result<()> {
        let mut failures = Vec::new();
        for id in &self.order {
            let Some(services) = self.services.get(id) else {
                continue;
            };
            if let Err(e) = services.validate_all() {
                tracing::debug!("Options type {} failed validation", services.type_name());
                failures.extend(e.into_failures());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(OptionsError::Aggregate { failures })
        }
    }
}

impl std::fmt::Debug for OptionsContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<String> = self
            .order
            .iter()
            .filter_map(|id| self.services.get(id))
            .map(|s| s.type_name())
            .collect();
        f.debug_struct("OptionsContainer")
            .field("types", &types)
            .finish()
    }
}
