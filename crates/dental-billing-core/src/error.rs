//! Error types for the billing core.

use std::fmt;

use thiserror::Error;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Field name as it appears on the form / wire format
    pub field: &'static str,
    /// Human-readable problem description
    pub problem: String,
}

/// Every field problem found while validating a draft.
///
/// Validation never stops at the first problem so that a form can highlight
/// all offending fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field failure.
    pub fn single(field: &'static str, problem: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, problem);
        errors
    }

    pub fn push(&mut self, field: &'static str, problem: impl Into<String>) {
        self.issues.push(FieldIssue {
            field,
            problem: problem.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    /// `Ok(())` when nothing was reported.
    pub fn into_result(self) -> BillingResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BillingError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", issue.field, issue.problem)?;
        }
        Ok(())
    }
}

/// Billing core errors.
///
/// Every variant is recoverable: the caller shows the `Display` text to the
/// user and the session state is left as it was before the failed call.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data format: {0}")]
    Format(String),

    #[error("Assistant error: {0}")]
    Collaborator(String),

    #[error("Request already in progress: {0}")]
    RequestInFlight(String),
}

impl BillingError {
    pub fn validation(field: &'static str, problem: impl Into<String>) -> Self {
        BillingError::Validation(ValidationErrors::single(field, problem))
    }

    /// The validation report, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            BillingError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "is required");
        errors.push("email", "is not a valid address");

        let err = BillingError::Validation(errors);
        assert_eq!(
            err.to_string(),
            "Validation failed: name is required; email is not a valid address"
        );
    }

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let err = ValidationErrors::single("cost", "must not be negative")
            .into_result()
            .unwrap_err();
        assert_eq!(err.validation_errors().unwrap().fields(), vec!["cost"]);
    }
}
