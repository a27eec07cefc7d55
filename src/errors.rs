//! Error types carried by failed outcomes, plus the crate's own fallible edges

use std::fmt;

/// Message used for a failure that was reported without any error attached
pub(crate) const UNEXPLAINED_FAILURE: &str = "operation failed without reporting an error";

/// A single error attached to a failed outcome.
///
/// The variant set is closed. Values are immutable once constructed and never
/// hold on to the fault that produced them: [`Error::Exception`] is a flattened
/// snapshot, so nothing non-serializable or sensitive leaks past the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Free-form failure
    Generic {
        /// Error description
        message: Box<str>,
    },
    /// Field-level validation failure
    Validation {
        /// Name of the offending property
        property: Box<str>,
        /// Error description
        message: Box<str>,
    },
    /// Snapshot of a raised fault
    Exception {
        /// Fault description
        message: Box<str>,
        /// Type name of the fault
        type_name: Box<str>,
        /// Captured backtrace, when one was available
        stack_trace: Option<Box<str>>,
    },
    /// The operation was cancelled
    Cancelled {
        /// What was running when cancellation was observed
        source_name: Option<Box<str>>,
    },
    /// A rule evaluated to failure
    RuleViolation {
        /// Name of the failing rule
        rule_name: Box<str>,
        /// The rule's declared failure message
        message: Option<Box<str>>,
    },
}

/// Discriminant of [`Error`], useful for routing user messaging
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Generic`]
    Generic,
    /// See [`Error::Validation`]
    Validation,
    /// See [`Error::Exception`]
    Exception,
    /// See [`Error::Cancelled`]
    Cancelled,
    /// See [`Error::RuleViolation`]
    RuleViolation,
}

impl ErrorKind {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Validation => "validation",
            Self::Exception => "exception",
            Self::Cancelled => "cancelled",
            Self::RuleViolation => "ruleViolation",
        }
    }
}

impl Error {
    /// Create a generic error
    pub fn generic(message: impl Into<Box<str>>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Create a validation error for `property`
    pub fn validation(property: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self::Validation {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create an exception snapshot
    pub fn exception(
        type_name: impl Into<Box<str>>,
        message: impl Into<Box<str>>,
        stack_trace: Option<Box<str>>,
    ) -> Self {
        Self::Exception {
            message: message.into(),
            type_name: type_name.into(),
            stack_trace,
        }
    }

    /// Create a cancellation error without a known source
    pub fn cancelled() -> Self {
        Self::Cancelled { source_name: None }
    }

    /// Create a cancellation error naming what was cancelled
    pub fn cancelled_in(source_name: impl Into<Box<str>>) -> Self {
        Self::Cancelled {
            source_name: Some(source_name.into()),
        }
    }

    /// Create a rule violation
    pub fn rule_violation(rule_name: impl Into<Box<str>>, message: Option<Box<str>>) -> Self {
        Self::RuleViolation {
            rule_name: rule_name.into(),
            message,
        }
    }

    /// Discriminant of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic { .. } => ErrorKind::Generic,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Exception { .. } => ErrorKind::Exception,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::RuleViolation { .. } => ErrorKind::RuleViolation,
        }
    }

    /// Human-readable message, if the variant carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Generic { message }
            | Self::Validation { message, .. }
            | Self::Exception { message, .. } => Some(&**message),
            Self::RuleViolation { message, .. } => message.as_deref(),
            Self::Cancelled { .. } => None,
        }
    }

    /// Check if this error records a cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Check if this error is field-level validation feedback
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub(crate) fn unexplained() -> Self {
        Self::generic(UNEXPLAINED_FAILURE)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { message } => write!(f, "{message}"),
            Self::Validation { property, message } => write!(f, "{property}: {message}"),
            Self::Exception {
                message, type_name, ..
            } => write!(f, "{type_name}: {message}"),
            Self::Cancelled {
                source_name: Some(source),
            } => write!(f, "cancelled: {source}"),
            Self::Cancelled { source_name: None } => write!(f, "cancelled"),
            Self::RuleViolation {
                rule_name,
                message: Some(message),
            } => write!(f, "rule '{rule_name}' violated: {message}"),
            Self::RuleViolation {
                rule_name,
                message: None,
            } => write!(f, "rule '{rule_name}' violated"),
        }
    }
}

impl std::error::Error for Error {}

/// Raised by combinators whose contract is to propagate cancellation
/// rather than absorb it into an outcome
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Failure at the serialization boundary
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Outcomes are produced, never read back
    #[error("{0} cannot be deserialized: outcomes are write-only on the wire")]
    Unsupported(&'static str),
}

/// Invalid configuration value
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: Box<str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::generic("x").kind(), ErrorKind::Generic);
        assert_eq!(Error::validation("name", "required").kind(), ErrorKind::Validation);
        assert!(Error::cancelled().is_cancellation());
        assert!(Error::validation("name", "required").is_validation());
        assert_eq!(ErrorKind::RuleViolation.as_str(), "ruleViolation");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::validation("age", "too low").to_string(), "age: too low");
        assert_eq!(Error::cancelled_in("load").to_string(), "cancelled: load");
        assert_eq!(
            Error::rule_violation("stock", Some("out of stock".into())).to_string(),
            "rule 'stock' violated: out of stock"
        );
        assert_eq!(Error::cancelled().message(), None);
    }
}
