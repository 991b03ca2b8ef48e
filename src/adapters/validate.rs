// SPDX-License-Identifier: MIT OR Apache-2.0

//! Closure-backed validators.
//!
//! Three shapes cover the common cases: a boolean predicate with a fixed message, a check that
//! returns an error describing what is wrong, and a function returning a full
//! [`ValidationResult`].

use crate::domain::{BoxError, NameFilter, OptionsName, ValidationResult, ValidationStatus};
use crate::ports::ValidateOptions;

/// Fails with a fixed status and message when the predicate returns false.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::PredicateValidator;
/// use hexopts::domain::{NameFilter, OptionsName, ValidationStatus};
/// use hexopts::ports::ValidateOptions;
///
/// let validator = PredicateValidator::new(NameFilter::All, |port: &u16| *port != 0, "port is 0")
///     .with_status(ValidationStatus::Warning);
///
/// let result = validator.validate(&OptionsName::default_name(), &0);
/// assert_eq!(result.status(), ValidationStatus::Warning);
/// assert_eq!(result.message(), Some("port is 0"));
/// ```
pub struct PredicateValidator<T> {
    target: NameFilter,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
    status: ValidationStatus,
    message: String,
}

impl<T> PredicateValidator<T> {
    /// Creates a validator that reports `Invalid` with `message` when `predicate` is false.
    pub fn new<F>(target: impl Into<NameFilter>, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            predicate: Box::new(predicate),
            status: ValidationStatus::Invalid,
            message: message.into(),
        }
    }

    /// Sets the status reported on failure.
    pub fn with_status(mut self, status: ValidationStatus) -> Self {
        self.status = status;
        self
    }
}

impl<T> ValidateOptions<T> for PredicateValidator<T> {
    fn target(&self) -> &NameFilter {
        &self.target
    }

    fn validate(&self, _name: &OptionsName, options: &T) -> ValidationResult {
        if (self.predicate)(options) {
            ValidationResult::valid()
        } else {
            ValidationResult::new(self.status, Some(self.message.clone()))
        }
    }
}

/// Fails when the check returns an error.
///
/// The failure message is the configured message if one was given, otherwise the error's own
/// text.
pub struct CheckValidator<T> {
    target: NameFilter,
    check: Box<dyn Fn(&T) -> Result<(), BoxError> + Send + Sync>,
    status: ValidationStatus,
    message: Option<String>,
}

impl<T> CheckValidator<T> {
    /// Creates a validator that reports `Invalid` when `check` fails.
    pub fn new<F, E>(target: impl Into<NameFilter>, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            target: target.into(),
            check: Box::new(move |options| check(options).map_err(Into::into)),
            status: ValidationStatus::Invalid,
            message: None,
        }
    }

    /// Reports `message` instead of the error text.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the status reported on failure.
    pub fn with_status(mut self, status: ValidationStatus) -> Self {
        self.status = status;
        self
    }
}

impl<T> ValidateOptions<T> for CheckValidator<T> {
    fn target(&self) -> &NameFilter {
        &self.target
    }

    fn validate(&self, _name: &OptionsName, options: &T) -> ValidationResult {
        match (self.check)(options) {
            Ok(()) => ValidationResult::valid(),
            Err(e) => {
                let message = self.message.clone().unwrap_or_else(|| e.to_string());
                ValidationResult::new(self.status, Some(message))
            }
        }
    }
}

/// Delegates the whole verdict to a function of the name and the instance.
pub struct FnValidator<T> {
    target: NameFilter,
    validate: Box<dyn Fn(&OptionsName, &T) -> ValidationResult + Send + Sync>,
}

impl<T> FnValidator<T> {
    /// Creates a validator from `validate`.
    pub fn new<F>(target: impl Into<NameFilter>, validate: F) -> Self
    where
        F: Fn(&OptionsName, &T) -> ValidationResult + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            validate: Box::new(validate),
        }
    }
}

impl<T> ValidateOptions<T> for FnValidator<T> {
    fn target(&self) -> &NameFilter {
        &self.target
    }

    fn validate(&self, name: &OptionsName, options: &T) -> ValidationResult {
        (self.validate)(name, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_name() -> OptionsName {
        OptionsName::default_name()
    }

    #[test]
    fn test_predicate_validator() {
        let validator = PredicateValidator::new(NameFilter::All, |v: &i32| *v > 0, "must be positive");
        assert!(validator.validate(&default_name(), &1).is_valid());

        let result = validator.validate(&default_name(), &0);
        assert_eq!(result.status(), ValidationStatus::Invalid);
        assert_eq!(result.message(), Some("must be positive"));
    }

    #[test]
    fn test_check_validator_uses_error_text() {
        let validator = CheckValidator::new(NameFilter::All, |v: &String| {
            if v.is_empty() {
                Err("value is empty")
            } else {
                Ok(())
            }
        });
        let result = validator.validate(&default_name(), &String::new());
        assert_eq!(result.message(), Some("value is empty"));
        assert!(validator.validate(&default_name(), &"x".to_string()).is_valid());
    }

    #[test]
    fn test_check_validator_configured_message_and_status() {
        let validator = CheckValidator::new(NameFilter::All, |_: &String| Err("inner"))
            .with_message("outer")
            .with_status(ValidationStatus::Warning);
        let result = validator.validate(&default_name(), &String::new());
        assert_eq!(result.status(), ValidationStatus::Warning);
        assert_eq!(result.message(), Some("outer"));
    }

    #[test]
    fn test_fn_validator_sees_name() {
        let validator = FnValidator::new(NameFilter::All, |name: &OptionsName, _: &i32| {
            if name.is_default() {
                ValidationResult::valid()
            } else {
                ValidationResult::warning(format!("{} is deprecated", name))
            }
        });
        assert!(validator.validate(&default_name(), &0).is_valid());
        let result = validator.validate(&OptionsName::new("legacy").unwrap(), &0);
        assert_eq!(result.message(), Some("legacy is deprecated"));
    }

    #[test]
    fn test_targets() {
        let named = OptionsName::new("a").unwrap();
        let validator = PredicateValidator::new(named.clone(), |_: &i32| true, "");
        assert!(validator.target().matches(&named));
        assert!(!validator.target().matches(&default_name()));
    }
}
