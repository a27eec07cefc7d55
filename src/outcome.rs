//! Outcome core: the success/failure value every fallible operation returns

use crate::{classify, Error, Fault};

/// Result of an operation that can fail.
///
/// `Outcome<()>` is the value-less shape; `Outcome<T>` carries a value on
/// success. Success is derived from the error list, so an outcome is a success
/// exactly when it has no errors. The `with_*` methods consume the outcome and
/// return a new one, and they can only move it from success to failure.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<T = ()> {
    pub(crate) value: Option<T>,
    pub(crate) messages: Vec<String>,
    pub(crate) errors: Vec<Error>,
    // Set while the only error is the placeholder for a failure that was
    // reported without one.
    pub(crate) unexplained: bool,
}

/// Internal two-track view used by the combinators
pub(crate) enum Track<T> {
    Success {
        value: T,
        messages: Vec<String>,
    },
    Failure {
        value: Option<T>,
        messages: Vec<String>,
        errors: Vec<Error>,
        unexplained: bool,
    },
}

impl Outcome<()> {
    /// Value-less success
    pub fn ok() -> Self {
        Self::success(())
    }
}

impl<T> Outcome<T> {
    /// Success carrying `value`
    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            messages: Vec::new(),
            errors: Vec::new(),
            unexplained: false,
        }
    }

    /// Failure carrying `error`
    pub fn failure(error: Error) -> Self {
        Self {
            value: None,
            messages: Vec::new(),
            errors: vec![error],
            unexplained: false,
        }
    }

    /// Failure that keeps a partial value inspectable
    pub fn failure_with_value(value: T, error: Error) -> Self {
        Self {
            value: Some(value),
            ..Self::failure(error)
        }
    }

    /// Failure carrying every error in `errors`.
    ///
    /// An empty list still yields a failure, with a generic placeholder error
    /// describing that nothing was reported.
    pub fn failure_many(errors: impl IntoIterator<Item = Error>) -> Self {
        let errors: Vec<Error> = errors.into_iter().collect();
        if errors.is_empty() {
            return Self::unexplained_failure(None, Vec::new());
        }
        Self {
            value: None,
            messages: Vec::new(),
            errors,
            unexplained: false,
        }
    }

    /// Failure classified from a raised fault
    pub fn from_fault(fault: Fault) -> Self {
        Self::failure(classify(&fault))
    }

    /// Cancelled failure with no named source
    pub fn cancelled() -> Self {
        Self::failure(Error::cancelled())
    }

    /// Lift an `Option`, failing with `error` when it is empty
    pub fn from_option(value: Option<T>, error: Error) -> Self {
        match value {
            Some(value) => Self::success(value),
            None => Self::failure(error),
        }
    }

    /// Lift a `Result`, snapshotting the error as a fault
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: Into<Fault>,
    {
        match result {
            Ok(value) => Self::success(value),
            Err(error) => Self::from_fault(error.into()),
        }
    }

    /// Start building an outcome
    pub fn builder() -> OutcomeBuilder<T> {
        OutcomeBuilder::new()
    }

    /// Check if the outcome is a success
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if the outcome is a failure
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Check if the outcome failed because of cancellation
    pub fn is_cancelled(&self) -> bool {
        self.errors.iter().any(Error::is_cancellation)
    }

    /// The success value, or the partial value a failure was built with
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the value out, discarding messages and errors
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Messages in the order they were recorded
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Errors in the order they were recorded
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Split into value, messages, and errors
    pub fn into_parts(self) -> (Option<T>, Vec<String>, Vec<Error>) {
        (self.value, self.messages, self.errors)
    }

    /// Leave the algebra
    pub fn into_result(self) -> Result<T, Vec<Error>> {
        match self.into_track() {
            Track::Success { value, .. } => Ok(value),
            Track::Failure { errors, .. } => Err(errors),
        }
    }

    /// Append an error, turning the outcome into a failure
    pub fn with_error(mut self, error: Error) -> Self {
        self.push_error(error);
        self
    }

    /// Append several errors; an empty list leaves the outcome unchanged
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Error>) -> Self {
        for error in errors {
            self.push_error(error);
        }
        self
    }

    /// Append a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Append several messages
    pub fn with_messages<I, M>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
        self
    }

    /// Combine two outcomes.
    ///
    /// Failure dominates success, messages and errors concatenate in call
    /// order, and `other`'s value wins when both sides have one.
    pub fn merge(self, other: Outcome<T>) -> Outcome<T> {
        let failed = self.is_failure() || other.is_failure();
        let mut messages = self.messages;
        messages.extend(other.messages);

        let mut errors = if self.unexplained {
            Vec::new()
        } else {
            self.errors
        };
        if !other.unexplained {
            errors.extend(other.errors);
        }

        let value = other.value.or(self.value);
        if failed && errors.is_empty() {
            return Self::unexplained_failure(value, messages);
        }
        Self {
            value,
            messages,
            errors,
            unexplained: false,
        }
    }

    pub(crate) fn unexplained_failure(value: Option<T>, messages: Vec<String>) -> Self {
        Self {
            value,
            messages,
            errors: vec![Error::unexplained()],
            unexplained: true,
        }
    }

    /// Check if this failure was reported without an error of its own
    pub(crate) fn is_unexplained(&self) -> bool {
        self.unexplained
    }

    fn push_error(&mut self, error: Error) {
        if self.unexplained {
            self.errors.clear();
            self.unexplained = false;
        }
        self.errors.push(error);
    }

    pub(crate) fn into_track(self) -> Track<T> {
        match (self.errors.is_empty(), self.value) {
            (true, Some(value)) => Track::Success {
                value,
                messages: self.messages,
            },
            // Not constructible through the public surface.
            (true, None) => Track::Failure {
                value: None,
                messages: self.messages,
                errors: vec![Error::unexplained()],
                unexplained: true,
            },
            (false, value) => Track::Failure {
                value,
                messages: self.messages,
                errors: self.errors,
                unexplained: self.unexplained,
            },
        }
    }

    pub(crate) fn from_track(track: Track<T>) -> Self {
        match track {
            Track::Success { value, messages } => Self {
                value: Some(value),
                messages,
                errors: Vec::new(),
                unexplained: false,
            },
            Track::Failure {
                value,
                messages,
                errors,
                unexplained,
            } => Self {
                value,
                messages,
                errors,
                unexplained,
            },
        }
    }

    /// Failure assembled from the parts of another failure
    pub(crate) fn failed(messages: Vec<String>, errors: Vec<Error>, unexplained: bool) -> Self {
        Self {
            value: None,
            messages,
            errors,
            unexplained,
        }
    }
}

impl<T> Default for Outcome<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::success(T::default())
    }
}

impl<T> From<Error> for Outcome<T> {
    fn from(error: Error) -> Self {
        Self::failure(error)
    }
}

/// Mutable construction surface for an [`Outcome`].
///
/// Nothing built here is observable until [`OutcomeBuilder::build`] hands out
/// the finished outcome.
#[derive(Debug)]
pub struct OutcomeBuilder<T = ()> {
    value: Option<T>,
    messages: Vec<String>,
    errors: Vec<Error>,
    failed: bool,
}

impl OutcomeBuilder<()> {
    /// Builder for a value-less outcome
    pub fn unit() -> Self {
        Self::new().value(())
    }
}

impl<T> OutcomeBuilder<T> {
    /// Empty builder
    pub fn new() -> Self {
        Self {
            value: None,
            messages: Vec::new(),
            errors: Vec::new(),
            failed: false,
        }
    }

    /// Set the value
    pub fn value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    /// Record an error
    pub fn with_error(mut self, error: Error) -> Self {
        self.errors.push(error);
        self
    }

    /// Record several errors
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Error>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Record a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Record several messages
    pub fn with_messages<I, M>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.messages.extend(messages.into_iter().map(Into::into));
        self
    }

    /// Mark the outcome failed even if no error gets recorded
    pub fn fail(mut self) -> Self {
        self.failed = true;
        self
    }

    /// Finish the outcome.
    ///
    /// A success without a value, or a failure without errors, becomes a
    /// failure with a generic error explaining what was missing.
    pub fn build(self) -> Outcome<T> {
        if !self.errors.is_empty() {
            return Outcome {
                value: self.value,
                messages: self.messages,
                errors: self.errors,
                unexplained: false,
            };
        }
        if self.failed {
            return Outcome::unexplained_failure(self.value, self.messages);
        }
        match self.value {
            Some(value) => Outcome {
                value: Some(value),
                messages: self.messages,
                errors: Vec::new(),
                unexplained: false,
            },
            None => Outcome {
                value: None,
                messages: self.messages,
                errors: vec![Error::generic("success outcome is missing its value")],
                unexplained: false,
            },
        }
    }
}

impl<T> Default for OutcomeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
