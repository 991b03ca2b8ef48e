// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! These traits are the seams of the options core: configurators, validators and initializers
//! plug into the factory; change tokens drive the monitor; sources, binders and watchers feed the
//! configuration tree. Adapters provide the bundled implementations.

pub mod bind;
pub mod change_token;
pub mod configure;
pub mod registry;
pub mod source;
pub mod validate;
pub mod watcher;

// Re-export commonly used types
pub use bind::Bind;
pub use change_token::{ChangeToken, OptionsChangeTokenSource, Registration, TokenCallback};
pub use configure::{ConfigureOptions, DefaultInitializer, InitializeOptions, DEFAULT_ORDER};
pub use registry::{DefaultNameSelector, OptionsNameSelector, OptionsRegistry};
pub use source::ConfigSource;
pub use validate::ValidateOptions;
pub use watcher::{ChangeCallback, ConfigWatcher};
