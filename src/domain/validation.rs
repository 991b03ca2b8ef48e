// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation results, aggregation, and strictness levels.

use crate::domain::errors::{OptionsError, Result};
use crate::domain::options_name::OptionsName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The options passed.
    Valid,
    /// The options are unusable.
    Invalid,
    /// The options are usable but suspicious.
    Warning,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Warning => "warning",
        };
        write!(f, "{}", text)
    }
}

/// An immutable validation verdict with an optional message.
///
/// # Examples
///
/// ```
/// use hexopts::domain::{OptionsName, ValidationResult, ValidationStatus};
///
/// let results = vec![
///     ValidationResult::valid(),
///     ValidationResult::invalid("port must be set"),
///     ValidationResult::warning("timeout is very long"),
/// ];
/// let aggregate = ValidationResult::aggregate("ServerOptions", &OptionsName::default_name(), results);
///
/// assert_eq!(aggregate.status(), ValidationStatus::Invalid);
/// let message = aggregate.message().unwrap();
/// assert!(message.contains("port must be set"));
/// assert!(message.contains("timeout is very long"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    status: ValidationStatus,
    message: Option<String>,
}

impl ValidationResult {
    /// Creates a result with the given status and optional message.
    pub fn new(status: ValidationStatus, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// A passing result without a message.
    pub fn valid() -> Self {
        Self::new(ValidationStatus::Valid, None)
    }

    /// A failing result.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ValidationStatus::Invalid, Some(message.into()))
    }

    /// A warning result.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ValidationStatus::Warning, Some(message.into()))
    }

    /// Returns the status.
    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    /// Returns the message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if the status is [`ValidationStatus::Valid`].
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    /// Combines the results produced for one options name.
    ///
    /// The status is `Invalid` if any result is invalid, else `Warning` if any is a warning,
    /// else `Valid`. A non-valid aggregate message starts with one banner line naming the
    /// options type and name, followed by every non-valid message on its own line.
    pub fn aggregate<I>(options_type: &str, name: &OptionsName, results: I) -> Self
    where
        I: IntoIterator<Item = ValidationResult>,
    {
        let failures: Vec<ValidationResult> =
            results.into_iter().filter(|r| !r.is_valid()).collect();

        let status = if failures
            .iter()
            .any(|r| r.status == ValidationStatus::Invalid)
        {
            ValidationStatus::Invalid
        } else if failures.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Warning
        };

        if status == ValidationStatus::Valid {
            return Self::valid();
        }

        let verdict = match status {
            ValidationStatus::Invalid => "is invalid",
            _ => "has warnings",
        };
        let mut message = format!("{} object with name '{}' {}:", options_type, name, verdict);
        for text in failures.iter().filter_map(|r| r.message()) {
            message.push('\n');
            message.push_str(text);
        }

        Self::new(status, Some(message))
    }
}

/// How strict validation is: which aggregate statuses turn into an error.
///
/// The default is [`ValidationLevel::Invalid`].
///
/// # Examples
///
/// ```
/// use hexopts::domain::{ValidationLevel, ValidationStatus};
///
/// let level: ValidationLevel = "warning".parse().unwrap();
/// assert!(level.rejects(ValidationStatus::Warning));
/// assert!(!ValidationLevel::default().rejects(ValidationStatus::Warning));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Never fail; results are informational only.
    None,
    /// Fail on invalid or warning results.
    Warning,
    /// Fail only on invalid results.
    #[default]
    Invalid,
}

impl ValidationLevel {
    /// Returns true if an aggregate with `status` must be raised as an error.
    pub fn rejects(self, status: ValidationStatus) -> bool {
        match self {
            ValidationLevel::None => false,
            ValidationLevel::Warning => status != ValidationStatus::Valid,
            ValidationLevel::Invalid => status == ValidationStatus::Invalid,
        }
    }
}

impl FromStr for ValidationLevel {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ValidationLevel::None),
            "warning" => Ok(ValidationLevel::Warning),
            "invalid" => Ok(ValidationLevel::Invalid),
            other => Err(OptionsError::Binding {
                key: "validation_level".to_string(),
                target_type: "ValidationLevel".to_string(),
                source: format!("unknown validation level '{}'", other).into(),
            }),
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationLevel::None => "none",
            ValidationLevel::Warning => "warning",
            ValidationLevel::Invalid => "invalid",
        };
        write!(f, "{}", text)
    }
}

/// Returns the unqualified name of `T`, without module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_name() -> OptionsName {
        OptionsName::default_name()
    }

    #[test]
    fn test_aggregate_all_valid() {
        let result = ValidationResult::aggregate(
            "AppOptions",
            &default_name(),
            vec![ValidationResult::valid(), ValidationResult::valid()],
        );
        assert!(result.is_valid());
        assert_eq!(result.message(), None);
    }

    #[test]
    fn test_aggregate_empty_is_valid() {
        let result = ValidationResult::aggregate("AppOptions", &default_name(), Vec::new());
        assert!(result.is_valid());
    }

    #[test]
    fn test_aggregate_invalid_wins() {
        let result = ValidationResult::aggregate(
            "AppOptions",
            &default_name(),
            vec![
                ValidationResult::valid(),
                ValidationResult::invalid("a"),
                ValidationResult::warning("b"),
            ],
        );
        assert_eq!(result.status(), ValidationStatus::Invalid);
        let message = result.message().unwrap();
        assert!(message.starts_with("AppOptions object with name '' is invalid:"));
        assert!(message.contains("\na"));
        assert!(message.contains("\nb"));
    }

    #[test]
    fn test_aggregate_warning_only() {
        let name = OptionsName::new("edge").unwrap();
        let result = ValidationResult::aggregate(
            "AppOptions",
            &name,
            vec![ValidationResult::valid(), ValidationResult::warning("b")],
        );
        assert_eq!(result.status(), ValidationStatus::Warning);
        assert_eq!(
            result.message(),
            Some("AppOptions object with name 'edge' has warnings:\nb")
        );
    }

    #[test]
    fn test_aggregate_banner_appears_once() {
        let result = ValidationResult::aggregate(
            "AppOptions",
            &default_name(),
            vec![ValidationResult::invalid("x"), ValidationResult::invalid("y")],
        );
        let message = result.message().unwrap();
        assert_eq!(message.matches("AppOptions object").count(), 1);
    }

    #[test]
    fn test_aggregate_skips_missing_messages() {
        let result = ValidationResult::aggregate(
            "AppOptions",
            &default_name(),
            vec![ValidationResult::new(ValidationStatus::Invalid, None)],
        );
        assert_eq!(
            result.message(),
            Some("AppOptions object with name '' is invalid:")
        );
    }

    #[test]
    fn test_level_rejects() {
        use ValidationStatus::*;
        assert!(!ValidationLevel::None.rejects(Invalid));
        assert!(!ValidationLevel::None.rejects(Warning));
        assert!(ValidationLevel::Warning.rejects(Invalid));
        assert!(ValidationLevel::Warning.rejects(Warning));
        assert!(!ValidationLevel::Warning.rejects(Valid));
        assert!(ValidationLevel::Invalid.rejects(Invalid));
        assert!(!ValidationLevel::Invalid.rejects(Warning));
    }

    #[test]
    fn test_level_default_is_invalid() {
        assert_eq!(ValidationLevel::default(), ValidationLevel::Invalid);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("None".parse::<ValidationLevel>().unwrap(), ValidationLevel::None);
        assert_eq!(
            " WARNING ".parse::<ValidationLevel>().unwrap(),
            ValidationLevel::Warning
        );
        assert!("strict".parse::<ValidationLevel>().is_err());
        assert_eq!(ValidationLevel::Invalid.to_string(), "invalid");
    }

    #[test]
    fn test_short_type_name() {
        struct LocalOptions;
        assert_eq!(short_type_name::<LocalOptions>(), "LocalOptions");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
