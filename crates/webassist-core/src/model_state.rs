//! Result of binding and validating a request model

use crate::error::{ApiError, FieldError};

/// Validation outcome recorded in the request extensions by model binding
///
/// An empty state is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelState {
    errors: Vec<FieldError>,
}

impl ModelState {
    /// An empty, valid state
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from `validator` errors
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Self {
        Self {
            errors: FieldError::from_validation_errors(errors),
        }
    }

    /// Whether no error has been recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record an error against `field`
    pub fn add_error(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        });
    }

    /// Every recorded error
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors recorded for one field
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// A 422 error carrying every field error
    pub fn to_api_error(&self) -> ApiError {
        ApiError::validation(self.errors.clone())
    }
}
