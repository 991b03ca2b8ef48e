// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the options crate.
//!
//! Every failure the options core can surface is a variant of [`OptionsError`]. Errors are
//! returned synchronously to whichever caller triggered the build or validation; nothing is
//! retried internally.

use thiserror::Error;

/// Boxed error type returned by configurator and validator closures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for options operations.
///
/// Marked `#[non_exhaustive]` so new failure kinds can be added without breaking callers.
///
/// # Examples
///
/// ```
/// use hexopts::domain::errors::OptionsError;
///
/// let error = OptionsError::InvalidName {
///     name: "bad\nname".to_string(),
///     reason: "contains control characters".to_string(),
/// };
/// assert!(error.to_string().contains("contains control characters"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptionsError {
    /// The aggregate validation result reached the configured strictness level.
    #[error("{message}")]
    ValidationFailed {
        /// Short type name of the options being validated
        options_type: String,
        /// The options name that failed validation
        name: String,
        /// The aggregate message, including the banner line
        message: String,
    },

    /// A configurator failed while mutating an options instance.
    #[error("Configuring {options_type} object with name '{name}' failed: {source}")]
    ConfigurationAction {
        /// Short type name of the options being configured
        options_type: String,
        /// The options name being built
        name: String,
        /// The error reported by the configurator
        source: BoxError,
    },

    /// A configuration value could not be converted to the requested type.
    #[error("Failed to bind configuration value for key '{key}' to type {target_type}: {source}")]
    Binding {
        /// The configuration key being bound
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: BoxError,
    },

    /// An options name was rejected.
    #[error("Invalid options name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// One or more failures collected by an eager validation sweep.
    #[error("{}", format_aggregate(.failures))]
    Aggregate {
        /// Every failure found, in sweep order
        failures: Vec<OptionsError>,
    },

    /// An error occurred in a configuration source.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// An error occurred in a configuration watcher.
    #[error("Configuration watcher error: {message}")]
    WatcherError {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },
}

fn format_aggregate(failures: &[OptionsError]) -> String {
    let mut message = format!("{} options failure(s):", failures.len());
    for failure in failures {
        message.push('\n');
        message.push_str(failure.to_string().trim_end());
    }
    message
}

impl OptionsError {
    /// Returns true if this error, or any error inside an aggregate, is a validation failure.
    pub fn is_validation_failure(&self) -> bool {
        match self {
            OptionsError::ValidationFailed { .. } => true,
            OptionsError::Aggregate { failures } => {
                failures.iter().any(OptionsError::is_validation_failure)
            }
            _ => false,
        }
    }

    /// Flattens nested aggregates into a single list of leaf failures.
    pub fn into_failures(self) -> Vec<OptionsError> {
        match self {
            OptionsError::Aggregate { failures } => failures
                .into_iter()
                .flat_map(OptionsError::into_failures)
                .collect(),
            other => vec![other],
        }
    }
}

/// A specialized Result type for options operations.
pub type Result<T> = std::result::Result<T, OptionsError>;
