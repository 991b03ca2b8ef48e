// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing the bundled implementations of the ports.
//!
//! - closure-backed configurators and validators,
//! - in-process change tokens,
//! - the [`Configuration`] tree with its sources (memory, environment, YAML),
//! - the file watcher that drives configuration reloads (feature `reload`).

pub mod configuration;
pub mod configure;
#[cfg(feature = "env")]
pub mod env_var;
pub mod memory;
pub mod reload_token;
pub mod validate;
#[cfg(feature = "yaml")]
pub mod yaml_file;

pub mod watchers;

pub use configuration::{
    Configuration, ConfigurationBuilder, ConfigurationChangeTokenSource,
    ConfigureFromConfiguration,
};
pub use configure::ConfigureNamed;
pub use memory::MemorySource;
pub use reload_token::{ReloadToken, ReloadTokenSource};
pub use validate::{CheckValidator, FnValidator, PredicateValidator};

// Re-export adapters based on feature flags
#[cfg(feature = "env")]
pub use env_var::EnvVarAdapter;
#[cfg(feature = "reload")]
pub use watchers::FileWatcher;
#[cfg(feature = "yaml")]
pub use yaml_file::YamlFileSource;
