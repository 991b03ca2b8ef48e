// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named, validated, live-updating options objects.
//!
//! An *options type* is a plain struct holding the settings of one component. This crate
//! builds instances of it from registered configurators, validates them, caches them per name,
//! and rebuilds them when their configuration changes.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: names, validation results, configuration keys and values, errors
//! - **Ports**: the traits the core depends on (`ConfigureOptions`, `ValidateOptions`,
//!   `ChangeToken`, `ConfigSource`, `ConfigWatcher`, `Bind`)
//! - **Adapters**: closure-backed configurators and validators, change tokens, the layered
//!   `Configuration` tree and its sources
//! - **Service**: the factory, the cache and the `Options` / `OptionsSnapshot` /
//!   `OptionsMonitor` accessors
//!
//! # Building an instance
//!
//! For a name `N`:
//!
//! 1. a fresh instance is created by the initializer (`T::default()` unless replaced),
//! 2. every configurator whose filter matches `N` runs, sorted by order then registration,
//! 3. every validator whose filter matches `N` runs; the results are aggregated and, if the
//!    aggregate reaches the validation level, the build fails with
//!    [`OptionsError::ValidationFailed`](domain::OptionsError::ValidationFailed).
//!
//! # Feature Flags
//!
//! - `yaml`: YAML file configuration source (default)
//! - `env`: environment variable configuration source (default)
//! - `reload`: file watching that reloads configuration automatically
//! - `full`: all of the above
//!
//! # Quick Start
//!
//! ```rust
//! use hexopts::prelude::*;
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Bind for Server {
//!     fn bind(&mut self, section: &ConfigSection) {
//!         section.bind_value("host", &mut self.host);
//!         section.bind_value("port", &mut self.port);
//!     }
//! }
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let memory = MemorySource::new()
//!     .with_value("server.host", "localhost")
//!     .with_value("server.port", "8080");
//! let configuration = Configuration::builder()
//!     .with_source(Box::new(memory.clone()))
//!     .build();
//!
//! let services = OptionsBuilder::<Server>::new()
//!     .bind(OptionsName::default_name(), &configuration, "server")
//!     .validate(|s| s.port != 0, "port must be set")
//!     .build();
//! services.validate_all()?;
//!
//! let monitor = services.monitor();
//! assert_eq!(monitor.current_value()?.port, 8080);
//!
//! memory.set("server.port", "9090");
//! configuration.reload();
//! assert_eq!(monitor.current_value()?.port, 9090);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::{
        CheckValidator, Configuration, ConfigureNamed, FnValidator, MemorySource,
        PredicateValidator, ReloadTokenSource,
    };
    pub use crate::domain::{
        ConfigKey, ConfigSection, ConfigValue, NameFilter, OptionsError, OptionsName, Result,
        ValidationLevel, ValidationResult, ValidationStatus,
    };
    pub use crate::ports::{
        Bind, ChangeToken, ConfigSource, ConfigWatcher, ConfigureOptions, OptionsChangeTokenSource,
        OptionsNameSelector, ValidateOptions,
    };
    pub use crate::service::{
        ListenerHandle, Options, OptionsBuilder, OptionsContainer, OptionsMonitor,
        OptionsServices, OptionsSnapshot,
    };

    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarAdapter;
    #[cfg(feature = "reload")]
    pub use crate::adapters::FileWatcher;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlFileSource;
}
