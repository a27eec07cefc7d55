//! Validator seam used by the `validate` combinators

use crate::Error;
use async_trait::async_trait;

/// A single (property, message) violation reported by a validator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Name of the offending property; empty for the value as a whole
    pub property: Box<str>,
    /// What is wrong with it
    pub message: Box<str>,
}

impl Violation {
    /// Create a violation
    pub fn new(property: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Qualify the property with the position of the item it came from
    pub fn at_index(self, index: usize) -> Self {
        let property = if self.property.is_empty() {
            format!("[{index}]")
        } else {
            format!("[{index}].{}", self.property)
        };
        Self {
            property: property.into_boxed_str(),
            message: self.message,
        }
    }

    /// Convert into a validation error
    pub fn into_error(self) -> Error {
        Error::Validation {
            property: self.property,
            message: self.message,
        }
    }
}

impl From<Violation> for Error {
    fn from(violation: Violation) -> Self {
        violation.into_error()
    }
}

/// Evaluates one value and reports every violation found.
///
/// Closures of shape `Fn(&T) -> Vec<Violation>` are validators.
pub trait Validator<T: ?Sized> {
    /// Every violation in `value`; empty when it is valid
    fn validate(&self, value: &T) -> Vec<Violation>;
}

impl<T, F> Validator<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Vec<Violation>,
{
    fn validate(&self, value: &T) -> Vec<Violation> {
        self(value)
    }
}

/// Validator whose check needs to suspend, e.g. to look something up
#[async_trait]
pub trait AsyncValidator<T: Sync + ?Sized>: Send + Sync {
    /// Every violation in `value`; empty when it is valid
    async fn validate(&self, value: &T) -> Vec<Violation>;
}

/// Runs several validators in order and concatenates their findings
pub struct AllOf<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T> + Send + Sync>>,
}

impl<T: ?Sized> AllOf<T> {
    /// Empty set; validates everything
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Add a validator
    pub fn with(mut self, validator: impl Validator<T> + Send + Sync + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl<T: ?Sized> Default for AllOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Validator<T> for AllOf<T> {
    fn validate(&self, value: &T) -> Vec<Violation> {
        self.validators
            .iter()
            .flat_map(|validator| validator.validate(value))
            .collect()
    }
}
