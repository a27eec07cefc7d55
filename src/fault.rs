//! Normalized representation of raised faults and their classification
//!
//! A fault is anything that escapes a computation outside the outcome track:
//! an `Err` surfaced from a fallible closure or rule body, or a panic unwinding
//! out of one. Faults are snapshotted on capture; the original error value or
//! panic payload is never retained.

use crate::Error;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Type name recorded for faults that came from a panic
pub const PANIC_TYPE_NAME: &str = "panic";

/// Message used when a violation raised outside a rule carries no detail
pub const UNNAMED_VIOLATION: &str = "rule violated";

/// A raised fault, flattened at the point of capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// An error value surfaced from a fallible computation
    Error {
        /// Type name of the error
        type_name: Box<str>,
        /// Display output of the error and its source chain
        message: Box<str>,
        /// Backtrace captured with the fault, when backtraces are enabled
        backtrace: Option<Box<str>>,
    },
    /// The computation observed cancellation
    Cancelled {
        /// What was running when cancellation was observed
        source_name: Option<Box<str>>,
    },
    /// The computation explicitly reported a rule violation
    Violation {
        /// Optional detail overriding the rule's declared message
        message: Option<Box<str>>,
    },
    /// The computation panicked
    Panic {
        /// Panic message, when the payload was a string
        message: Box<str>,
    },
    /// An already-typed error raised as a fault; classified unchanged
    Typed(Error),
    /// Several faults raised together; classification uses the first one
    Aggregate(Vec<Fault>),
}

impl Fault {
    /// Snapshot an error value together with its source chain
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }

        Self::Error {
            type_name: std::any::type_name::<E>().into(),
            message: message.into_boxed_str(),
            backtrace: captured_backtrace(),
        }
    }

    /// Snapshot a panic payload caught while unwinding
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).into()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.as_str().into()
        } else {
            "panic with a non-string payload".into()
        };
        Self::Panic { message }
    }

    /// Cancellation with no named source
    pub fn cancelled() -> Self {
        Self::Cancelled { source_name: None }
    }

    /// Cancellation observed while running `source_name`
    pub fn cancelled_in(source_name: impl Into<Box<str>>) -> Self {
        Self::Cancelled {
            source_name: Some(source_name.into()),
        }
    }

    /// Rule violation using the rule's declared message
    pub fn violation() -> Self {
        Self::Violation { message: None }
    }

    /// Rule violation with a specific message
    pub fn violation_with(message: impl Into<Box<str>>) -> Self {
        Self::Violation {
            message: Some(message.into()),
        }
    }

    /// Error fault from a plain message, for callers without an error type
    pub fn message(message: impl Into<Box<str>>) -> Self {
        Self::Error {
            type_name: "message".into(),
            message: message.into(),
            backtrace: None,
        }
    }

    /// Bundle several faults
    pub fn aggregate(faults: impl IntoIterator<Item = Fault>) -> Self {
        Self::Aggregate(faults.into_iter().collect())
    }

    /// Follow aggregates down to their first inner fault.
    ///
    /// An empty aggregate has nothing to unwrap to and is returned as is.
    pub fn unwrap_aggregate(&self) -> &Fault {
        let mut current = self;
        while let Self::Aggregate(inner) = current {
            match inner.first() {
                Some(first) => current = first,
                None => break,
            }
        }
        current
    }

    /// Check if this fault is, or wraps, a cancellation
    pub fn is_cancellation(&self) -> bool {
        match self.unwrap_aggregate() {
            Self::Cancelled { .. } => true,
            Self::Typed(error) => error.is_cancellation(),
            _ => false,
        }
    }

    /// Run `f`, capturing a panic as a fault
    pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R, Fault> {
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(Self::from_panic)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error {
                type_name, message, ..
            } => write!(f, "{type_name}: {message}"),
            Self::Cancelled {
                source_name: Some(source),
            } => write!(f, "cancelled in {source}"),
            Self::Cancelled { source_name: None } => write!(f, "cancelled"),
            Self::Violation {
                message: Some(message),
            } => write!(f, "violation: {message}"),
            Self::Violation { message: None } => write!(f, "violation"),
            Self::Panic { message } => write!(f, "panicked: {message}"),
            Self::Typed(error) => write!(f, "{error}"),
            Self::Aggregate(inner) => {
                write!(f, "{} faults", inner.len())?;
                if let Some(first) = inner.first() {
                    write!(f, ", first: {first}")?;
                }
                Ok(())
            }
        }
    }
}

// `Fault` must not implement `std::error::Error`, or this impl overlaps `From<T> for T`.
impl<E> From<E> for Fault
where
    E: std::error::Error + 'static,
{
    fn from(error: E) -> Self {
        let raised: &dyn Any = &error;
        if let Some(typed) = raised.downcast_ref::<Error>() {
            return Self::Typed(typed.clone());
        }
        if raised.is::<crate::Cancelled>() {
            return Self::cancelled();
        }
        Self::from_error(&error)
    }
}

/// Map a raised fault onto the error model.
///
/// Aggregates are unwrapped to their first inner fault before classification.
pub fn classify(fault: &Fault) -> Error {
    match fault.unwrap_aggregate() {
        Fault::Cancelled { source_name } => Error::Cancelled {
            source_name: source_name.clone(),
        },
        Fault::Violation { message } => {
            Error::generic(message.as_deref().unwrap_or(UNNAMED_VIOLATION))
        }
        Fault::Typed(error) => error.clone(),
        other => exception_snapshot(other, None),
    }
}

/// Map a fault raised inside a rule onto the error model.
///
/// Cancellation names the rule as its source. A typed error is kept as raised.
/// Any other fault is reported with the rule's declared message; the fault's
/// own detail stays with the observer.
pub fn classify_for_rule(fault: &Fault, rule_name: &str, rule_message: &str) -> Error {
    if fault.is_cancellation() {
        return Error::cancelled_in(rule_name);
    }
    match fault.unwrap_aggregate() {
        Fault::Typed(error) => error.clone(),
        Fault::Violation { message } => Error::RuleViolation {
            rule_name: rule_name.into(),
            message: message.clone().or_else(|| Some(rule_message.into())),
        },
        other => exception_snapshot(other, Some(rule_message)),
    }
}

fn exception_snapshot(fault: &Fault, message_override: Option<&str>) -> Error {
    let (type_name, message, stack_trace) = match fault {
        Fault::Error {
            type_name,
            message,
            backtrace,
        } => (type_name.clone(), message.clone(), backtrace.clone()),
        Fault::Panic { message } => (PANIC_TYPE_NAME.into(), message.clone(), None),
        // Only reachable for an empty aggregate.
        other => ("aggregate".into(), other.to_string().into_boxed_str(), None),
    };
    Error::Exception {
        message: message_override.map_or(message, Into::into),
        type_name,
        stack_trace,
    }
}

fn captured_backtrace() -> Option<Box<str>> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string().into_boxed_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Debug, thiserror::Error)]
    #[error("write failed")]
    struct WriteFailed(#[source] DiskFull);

    #[test]
    fn test_from_error_flattens_source_chain() {
        let fault = Fault::from(WriteFailed(DiskFull));
        match fault {
            Fault::Error {
                type_name, message, ..
            } => {
                assert!(type_name.ends_with("WriteFailed"));
                assert_eq!(&*message, "write failed: disk full");
            }
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn test_catch_panic() {
        let result = Fault::catch(|| -> u32 { panic!("boom") });
        assert_eq!(
            result,
            Err(Fault::Panic {
                message: "boom".into()
            })
        );
        assert_eq!(Fault::catch(|| 7), Ok(7));
    }

    #[test]
    fn test_aggregate_unwraps_to_first_inner() {
        let fault = Fault::aggregate([
            Fault::aggregate([Fault::cancelled_in("load"), Fault::message("later")]),
            Fault::message("ignored"),
        ]);
        assert!(fault.is_cancellation());
        assert_eq!(classify(&fault), Error::cancelled_in("load"));

        let empty = Fault::aggregate([]);
        assert_eq!(empty.unwrap_aggregate(), &empty);
        assert!(!empty.is_cancellation());
    }

    #[test]
    fn test_classify_for_rule() {
        let cancelled = classify_for_rule(&Fault::cancelled(), "credit", "credit too low");
        assert_eq!(cancelled, Error::cancelled_in("credit"));

        let violation = classify_for_rule(&Fault::violation(), "credit", "credit too low");
        assert_eq!(
            violation,
            Error::rule_violation("credit", Some("credit too low".into()))
        );

        let exception = classify_for_rule(&Fault::from(DiskFull), "credit", "credit too low");
        match exception {
            Error::Exception {
                message, type_name, ..
            } => {
                assert_eq!(&*message, "credit too low");
                assert!(type_name.ends_with("DiskFull"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_panic_snapshot() {
        let error = classify(&Fault::Panic {
            message: "index out of bounds".into(),
        });
        assert_eq!(
            error,
            Error::exception(PANIC_TYPE_NAME, "index out of bounds", None)
        );
    }

    #[test]
    fn test_typed_error_is_classified_unchanged() {
        let fault = Fault::from(Error::validation("email", "required"));
        assert_eq!(fault, Fault::Typed(Error::validation("email", "required")));
        assert_eq!(classify(&fault), Error::validation("email", "required"));
        assert_eq!(
            classify_for_rule(&fault, "signup", "signup rejected"),
            Error::validation("email", "required")
        );

        let fault = Fault::from(Error::cancelled());
        assert!(fault.is_cancellation());
        assert_eq!(classify(&fault), Error::cancelled());
        assert_eq!(
            classify_for_rule(&fault, "signup", "signup rejected"),
            Error::cancelled_in("signup")
        );
    }

    #[test]
    fn test_violation_outside_a_rule_is_generic() {
        assert_eq!(classify(&Fault::violation()), Error::generic(UNNAMED_VIOLATION));
        assert_eq!(
            classify(&Fault::violation_with("limit exceeded")),
            Error::generic("limit exceeded")
        );
    }

    #[test]
    fn test_cancelled_error_converts_to_cancellation() {
        fn check() -> Result<(), Fault> {
            Err(crate::Cancelled)?
        }
        assert_eq!(check(), Err(Fault::cancelled()));
    }
}
