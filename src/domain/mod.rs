// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing the core types of the options system.
//!
//! Nothing in here performs I/O or synchronization: names, validation verdicts, strictness
//! levels, configuration keys, values and sections, and the error type.

pub mod config_key;
pub mod config_section;
pub mod config_value;
pub mod errors;
pub mod options_name;
pub mod validation;

// Re-export commonly used types
pub use config_key::{ConfigKey, KEY_SEPARATOR};
pub use config_section::ConfigSection;
pub use config_value::ConfigValue;
pub use errors::{BoxError, OptionsError, Result};
pub use options_name::{NameFilter, OptionsName, DEFAULT_NAME};
pub use validation::{short_type_name, ValidationLevel, ValidationResult, ValidationStatus};
