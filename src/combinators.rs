//! Combinators over [`Outcome`]
//!
//! Every combinator acts on the success track only; a failure passes through
//! unchanged apart from losing its value when the value type changes. The
//! `_async` variants take async callbacks and otherwise behave identically.
//! Only the taps, `attempt`, and `handle` capture panics from their callbacks
//! as faults; a panic in any other callback unwinds to the caller unless the
//! chain runs inside [`crate::Pending`].

use crate::outcome::Track;
use crate::{classify, Error, Fault, Outcome, Validator, Violation};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

impl<T> Outcome<T> {
    /// Transform the success value
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self.into_track() {
            Track::Success { value, messages } => {
                Outcome::success(f(value)).with_messages(messages)
            }
            Track::Failure {
                messages,
                errors,
                unexplained,
                ..
            } => Outcome::failed(messages, errors, unexplained),
        }
    }

    /// Continue with a downstream outcome.
    ///
    /// The downstream outcome replaces this one entirely: its messages and
    /// errors are not merged with the ones recorded so far.
    pub fn bind<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self.into_track() {
            Track::Success { value, .. } => f(value),
            Track::Failure {
                messages,
                errors,
                unexplained,
                ..
            } => Outcome::failed(messages, errors, unexplained),
        }
    }

    /// Run a side effect on the success value.
    ///
    /// A panic inside `action` replaces the outcome with a failure.
    pub fn tap<F>(self, action: F) -> Outcome<T>
    where
        F: FnOnce(&T),
    {
        match self.value.as_ref() {
            Some(value) if self.is_success() => match Fault::catch(|| action(value)) {
                Ok(()) => self,
                Err(fault) => Outcome::from_fault(fault),
            },
            _ => self,
        }
    }

    /// Run a fallible side effect on the success value.
    ///
    /// An `Err` or a panic replaces the outcome with a failure.
    pub fn try_tap<F, E>(self, action: F) -> Outcome<T>
    where
        F: FnOnce(&T) -> Result<(), E>,
        E: Into<Fault>,
    {
        match self.value.as_ref() {
            Some(value) if self.is_success() => match Fault::catch(|| action(value)) {
                Ok(Ok(())) => self,
                Ok(Err(error)) => Outcome::from_fault(error.into()),
                Err(fault) => Outcome::from_fault(fault),
            },
            _ => self,
        }
    }

    /// Run a side effect on the errors of a failure
    pub fn tap_failure<F>(self, action: F) -> Outcome<T>
    where
        F: FnOnce(&[Error]),
    {
        if self.is_failure() {
            // A panicking failure hook has nothing better to report than the
            // failure already in hand.
            let _ = Fault::catch(|| action(&self.errors));
        }
        self
    }

    /// Fail with `error` unless `predicate` holds for the value
    pub fn filter<P>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> bool,
    {
        let keep = match self.value.as_ref() {
            Some(value) if self.is_success() => predicate(value),
            _ => true,
        };
        if keep {
            self
        } else {
            Outcome::failed(self.messages, vec![error], false)
        }
    }

    /// Precondition form of [`Outcome::filter`]
    pub fn ensure<P>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> bool,
    {
        self.filter(predicate, error)
    }

    /// Fail with `error` when `predicate` holds for the value
    pub fn unless<P>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> bool,
    {
        self.filter(|value| !predicate(value), error)
    }

    /// Keep-and-transform or drop the value.
    ///
    /// Dropping is still a success; it just leaves no value behind.
    pub fn choose<U, F>(self, chooser: F) -> Outcome<Option<U>>
    where
        F: FnOnce(T) -> Option<U>,
    {
        self.map(chooser)
    }

    /// Run `validator` over the value, collecting every violation.
    ///
    /// The failing outcome keeps the value so callers can show it alongside
    /// the field-level feedback.
    pub fn validate<V>(self, validator: &V) -> Outcome<T>
    where
        V: Validator<T> + ?Sized,
    {
        match self.value.as_ref() {
            Some(value) if self.is_success() => {
                let errors: Vec<Error> = validator
                    .validate(value)
                    .into_iter()
                    .map(Violation::into_error)
                    .collect();
                self.with_errors(errors)
            }
            _ => self,
        }
    }

    /// Substitute `fallback` for a failure, discarding its errors
    pub fn or_else<F>(self, fallback: F) -> Outcome<T>
    where
        F: FnOnce() -> Outcome<T>,
    {
        if self.is_success() {
            self
        } else {
            fallback()
        }
    }

    /// Rewrite the errors of a failure
    pub fn map_errors<F>(mut self, f: F) -> Outcome<T>
    where
        F: FnMut(Error) -> Error,
    {
        if self.is_failure() {
            self.errors = self.errors.into_iter().map(f).collect();
            self.unexplained = false;
        }
        self
    }

    /// Fold both tracks into a single value
    pub fn match_outcome<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> R,
        F: FnOnce(Vec<Error>) -> R,
    {
        match self.into_track() {
            Track::Success { value, .. } => on_success(value),
            Track::Failure { errors, .. } => on_failure(errors),
        }
    }

    /// Run whichever branch applies and return the outcome unchanged.
    ///
    /// If a branch panics, the captured fault is handed to `on_failure` (a
    /// second time when `on_failure` itself was the branch that panicked), and
    /// the original outcome is still returned.
    pub fn handle<S, F>(self, on_success: S, mut on_failure: F) -> Outcome<T>
    where
        S: FnOnce(&T),
        F: FnMut(&[Error]),
    {
        let raised = match self.value.as_ref() {
            Some(value) if self.is_success() => Fault::catch(|| on_success(value)).err(),
            _ => Fault::catch(|| on_failure(&self.errors)).err(),
        };
        if let Some(fault) = raised {
            let errors = [classify(&fault)];
            let _ = Fault::catch(|| on_failure(&errors));
        }
        self
    }

    /// Wrap a computation that may fail or panic
    pub fn attempt<F, E>(op: F) -> Outcome<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<Fault>,
    {
        match Fault::catch(op) {
            Ok(result) => Outcome::from_result(result),
            Err(fault) => Outcome::from_fault(fault),
        }
    }

    /// [`Outcome::map`] with an async transform
    pub async fn map_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        match self.into_track() {
            Track::Success { value, messages } => {
                Outcome::success(f(value).await).with_messages(messages)
            }
            Track::Failure {
                messages,
                errors,
                unexplained,
                ..
            } => Outcome::failed(messages, errors, unexplained),
        }
    }

    /// [`Outcome::bind`] with an async continuation
    pub async fn bind_async<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        match self.into_track() {
            Track::Success { value, .. } => f(value).await,
            Track::Failure {
                messages,
                errors,
                unexplained,
                ..
            } => Outcome::failed(messages, errors, unexplained),
        }
    }

    /// [`Outcome::tap`] with an async side effect; the value is handed over
    /// by clone so the effect may hold it across suspension points
    pub async fn tap_async<F, Fut>(self, action: F) -> Outcome<T>
    where
        T: Clone,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        let value = match self.value.as_ref() {
            Some(value) if self.is_success() => value.clone(),
            _ => return self,
        };
        match AssertUnwindSafe(action(value)).catch_unwind().await {
            Ok(()) => self,
            Err(payload) => Outcome::from_fault(Fault::from_panic(payload)),
        }
    }

    /// [`Outcome::filter`] with an async predicate
    pub async fn filter_async<P, Fut>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        let holds = match self.value.as_ref() {
            Some(value) if self.is_success() => predicate(value).await,
            _ => return self,
        };
        if holds {
            self
        } else {
            Outcome::failed(self.messages, vec![error], false)
        }
    }

    /// [`Outcome::ensure`] with an async predicate
    pub async fn ensure_async<P, Fut>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.filter_async(predicate, error).await
    }

    /// [`Outcome::unless`] with an async predicate
    pub async fn unless_async<P, Fut>(self, predicate: P, error: Error) -> Outcome<T>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.filter_async(
            |value| {
                let holds = predicate(value);
                async move { !holds.await }
            },
            error,
        )
        .await
    }

    /// [`Outcome::validate`] with a validator that suspends
    pub async fn validate_async<V>(self, validator: &V) -> Outcome<T>
    where
        V: crate::AsyncValidator<T> + ?Sized,
        T: Sync,
    {
        let violations = match self.value.as_ref() {
            Some(value) if self.is_success() => validator.validate(value).await,
            _ => return self,
        };
        self.with_errors(violations.into_iter().map(Violation::into_error))
    }

    /// [`Outcome::or_else`] with an async fallback
    pub async fn or_else_async<F, Fut>(self, fallback: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        if self.is_success() {
            self
        } else {
            fallback().await
        }
    }

    /// [`Outcome::attempt`] for an async computation
    pub async fn attempt_async<Fut, E>(op: Fut) -> Outcome<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<Fault>,
    {
        match AssertUnwindSafe(op).catch_unwind().await {
            Ok(result) => Outcome::from_result(result),
            Err(payload) => Outcome::from_fault(Fault::from_panic(payload)),
        }
    }

    /// Sequence many outcomes into one.
    ///
    /// Every input is inspected: the result carries the errors of all failing
    /// inputs in order, and the messages of all inputs.
    pub fn collect<I>(outcomes: I) -> Outcome<Vec<T>>
    where
        I: IntoIterator<Item = Outcome<T>>,
    {
        let mut values = Vec::new();
        let mut messages = Vec::new();
        let mut errors = Vec::new();
        let mut unexplained_seen = false;

        for outcome in outcomes {
            match outcome.into_track() {
                Track::Success {
                    value,
                    messages: recorded,
                } => {
                    values.push(value);
                    messages.extend(recorded);
                }
                Track::Failure {
                    messages: recorded,
                    errors: raised,
                    unexplained,
                    ..
                } => {
                    messages.extend(recorded);
                    if unexplained {
                        unexplained_seen = true;
                    } else {
                        errors.extend(raised);
                    }
                }
            }
        }

        if errors.is_empty() && unexplained_seen {
            return Outcome::unexplained_failure(None, messages);
        }
        if errors.is_empty() {
            Outcome::success(values).with_messages(messages)
        } else {
            Outcome::failed(messages, errors, false)
        }
    }
}

impl Outcome<()> {
    /// Fold value-less outcomes with [`Outcome::merge`]
    pub fn combine<I>(outcomes: I) -> Outcome<()>
    where
        I: IntoIterator<Item = Outcome<()>>,
    {
        outcomes.into_iter().fold(Outcome::ok(), Outcome::merge)
    }
}

impl<T> Outcome<Vec<T>> {
    /// Transform every item of a collection value
    pub fn map_each<U, F>(self, f: F) -> Outcome<Vec<U>>
    where
        F: FnMut(T) -> U,
    {
        self.map(|items| items.into_iter().map(f).collect())
    }

    /// Keep-and-transform or drop each item; dropping everything yields an
    /// empty collection, not a failure
    pub fn choose_each<U, F>(self, chooser: F) -> Outcome<Vec<U>>
    where
        F: FnMut(T) -> Option<U>,
    {
        self.map(|items| items.into_iter().filter_map(chooser).collect())
    }

    /// Validate every item, collecting all violations.
    ///
    /// Properties are prefixed with the item index, e.g. `[2].name`.
    pub fn validate_each<V>(self, validator: &V) -> Outcome<Vec<T>>
    where
        V: Validator<T> + ?Sized,
    {
        let errors = match self.value.as_ref() {
            Some(items) if self.is_success() => item_violations(items, validator),
            _ => return self,
        };
        self.with_errors(errors)
    }

    /// Validate every item with an async validator, one item at a time so
    /// error order stays deterministic
    pub async fn validate_each_async<V>(self, validator: &V) -> Outcome<Vec<T>>
    where
        V: crate::AsyncValidator<T> + ?Sized,
        T: Sync,
    {
        let mut errors = Vec::new();
        match self.value.as_ref() {
            Some(items) if self.is_success() => {
                for (index, item) in items.iter().enumerate() {
                    let violations = validator.validate(item).await;
                    errors.extend(
                        violations
                            .into_iter()
                            .map(|violation| violation.at_index(index).into_error()),
                    );
                }
            }
            _ => return self,
        }
        self.with_errors(errors)
    }
}

pub(crate) fn item_violations<T, V>(items: &[T], validator: &V) -> Vec<Error>
where
    V: Validator<T> + ?Sized,
{
    items
        .iter()
        .enumerate()
        .flat_map(|(index, item)| {
            validator
                .validate(item)
                .into_iter()
                .map(move |violation| violation.at_index(index).into_error())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::cell::Cell;

    fn failed() -> Outcome<i32> {
        Outcome::failure(Error::generic("bad")).with_message("tried")
    }

    #[test]
    fn test_failure_is_absorbing() {
        let original = failed();
        let mapped = original.clone().map(|v| v * 2);
        assert!(mapped.is_failure());
        assert_eq!(mapped.errors(), original.errors());
        assert_eq!(mapped.messages(), original.messages());

        let tapped = failed().tap(|_| panic!("never runs"));
        assert_eq!(tapped, original);

        let filtered = failed().filter(|_| false, Error::generic("other"));
        assert_eq!(filtered, original);
    }

    #[test]
    fn test_bind_skips_on_failure() {
        let calls = Cell::new(0);
        let outcome = Outcome::<()>::failure(Error::generic("bad")).bind(|()| {
            calls.set(calls.get() + 1);
            Outcome::success(1)
        });
        assert!(outcome.is_failure());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_bind_replaces_outcome() {
        let outcome = Outcome::success(2)
            .with_message("upstream")
            .bind(|v| Outcome::success(v + 1).with_message("downstream"));
        assert_eq!(outcome.value(), Some(&3));
        assert_eq!(outcome.messages(), ["downstream".to_string()]);
    }

    #[test]
    fn test_map_keeps_messages() {
        let outcome = Outcome::success(2).with_message("loaded").map(|v| v * 10);
        assert_eq!(outcome.value(), Some(&20));
        assert_eq!(outcome.messages(), ["loaded".to_string()]);
    }

    #[test]
    fn test_tap_panic_becomes_failure() {
        let outcome = Outcome::success(1).tap(|_| panic!("side effect blew up"));
        assert!(outcome.is_failure());
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::Exception);
        assert_eq!(outcome.errors()[0].message(), Some("side effect blew up"));
    }

    #[test]
    fn test_try_tap_error_becomes_failure() {
        let outcome = Outcome::success("x").try_tap(|v| v.parse::<u8>().map(|_| ()));
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::Exception);

        let outcome = Outcome::success("7").try_tap(|v| v.parse::<u8>().map(|_| ()));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_ensure_and_unless() {
        let too_small = Error::validation("qty", "must be positive");
        assert!(Outcome::success(3).ensure(|v| *v > 0, too_small.clone()).is_success());
        let outcome = Outcome::success(0).ensure(|v| *v > 0, too_small.clone());
        assert_eq!(outcome.errors(), [too_small.clone()]);

        assert!(Outcome::success(3).unless(|v| *v > 0, too_small.clone()).is_failure());
        assert!(Outcome::success(0).unless(|v| *v > 0, too_small).is_success());
    }

    #[test]
    fn test_choose() {
        let kept = Outcome::success(4).choose(|v| (v % 2 == 0).then_some(v / 2));
        assert_eq!(kept.value(), Some(&Some(2)));

        let dropped = Outcome::success(3).choose(|v| (v % 2 == 0).then_some(v / 2));
        assert!(dropped.is_success());
        assert_eq!(dropped.value(), Some(&None));

        let items = Outcome::success(vec![1, 2, 3]).choose_each(|v| (v > 5).then_some(v));
        assert!(items.is_success());
        assert_eq!(items.value(), Some(&Vec::new()));
    }

    #[test]
    fn test_validate_each_is_exhaustive() {
        let validator = |v: &i32| {
            if *v < 0 {
                vec![Violation::new("amount", "must not be negative")]
            } else {
                Vec::new()
            }
        };
        let outcome = Outcome::success(vec![-1, 5, -3]).validate_each(&validator);
        assert!(outcome.is_failure());
        assert_eq!(
            outcome.errors(),
            [
                Error::validation("[0].amount", "must not be negative"),
                Error::validation("[2].amount", "must not be negative"),
            ]
        );
    }

    #[test]
    fn test_validate_single_value() {
        let validator = |name: &String| {
            let mut violations = Vec::new();
            if name.is_empty() {
                violations.push(Violation::new("name", "required"));
            }
            if name.len() < 3 {
                violations.push(Violation::new("name", "too short"));
            }
            violations
        };
        let outcome = Outcome::success(String::new()).validate(&validator);
        assert_eq!(outcome.errors().len(), 2);
        assert_eq!(outcome.value(), Some(&String::new()));
    }

    #[test]
    fn test_or_else_discards_errors() {
        let outcome = failed().or_else(|| Outcome::success(9));
        assert_eq!(outcome, Outcome::success(9));
        let outcome = Outcome::success(1).or_else(|| Outcome::success(9));
        assert_eq!(outcome.value(), Some(&1));
    }

    #[test]
    fn test_match_outcome() {
        let describe = |outcome: Outcome<i32>| {
            outcome.match_outcome(|v| format!("ok {v}"), |e| format!("{} errors", e.len()))
        };
        assert_eq!(describe(Outcome::success(2)), "ok 2");
        assert_eq!(describe(failed()), "1 errors");
    }

    #[test]
    fn test_handle_feeds_raised_fault_to_failure_branch() {
        let failures = Cell::new(0);
        let outcome = Outcome::success(1).handle(
            |_| panic!("success branch failed"),
            |errors| {
                assert_eq!(errors[0].kind(), ErrorKind::Exception);
                failures.set(failures.get() + 1);
            },
        );
        assert_eq!(outcome, Outcome::success(1));
        assert_eq!(failures.get(), 1);
    }

    #[test]
    fn test_handle_failure_branch_raising_is_called_twice() {
        let calls = Cell::new(0);
        let outcome = failed().handle(
            |_| {},
            |_| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    panic!("failure branch failed");
                }
            },
        );
        assert_eq!(calls.get(), 2);
        assert_eq!(outcome, failed());
    }

    #[test]
    fn test_attempt() {
        let outcome = Outcome::attempt(|| "42".parse::<u32>());
        assert_eq!(outcome.value(), Some(&42));

        let outcome = Outcome::<u32>::attempt(|| -> Result<u32, Fault> { panic!("kaboom") });
        assert_eq!(outcome.errors()[0].message(), Some("kaboom"));

        let outcome = Outcome::<u32>::attempt(|| Err(Fault::cancelled_in("import")));
        assert_eq!(outcome.errors(), [Error::cancelled_in("import")]);

        let outcome = Outcome::<u32>::attempt(|| Err(Error::cancelled()));
        assert!(outcome.is_cancelled());

        let outcome = Outcome::<u32>::from_result(Err(Error::validation("email", "required")));
        assert_eq!(outcome.errors(), [Error::validation("email", "required")]);
    }

    #[test]
    fn test_collect_gathers_every_failure() {
        let outcome = Outcome::collect(vec![
            Outcome::success(1),
            Outcome::failure(Error::generic("a")),
            Outcome::success(3),
            Outcome::failure(Error::generic("b")),
        ]);
        assert_eq!(outcome.errors(), [Error::generic("a"), Error::generic("b")]);

        let outcome = Outcome::collect(vec![Outcome::success(1), Outcome::success(2)]);
        assert_eq!(outcome.value(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_combine() {
        let outcome = Outcome::combine(vec![
            Outcome::ok().with_message("one"),
            Outcome::failure(Error::generic("two")),
        ]);
        assert!(outcome.is_failure());
        assert_eq!(outcome.messages(), ["one".to_string()]);
        assert!(Outcome::combine(Vec::new()).is_success());
    }

    #[test]
    fn test_map_errors() {
        let outcome = failed().map_errors(|e| Error::generic(format!("wrapped: {e}")));
        assert_eq!(outcome.errors(), [Error::generic("wrapped: bad")]);
    }

    #[test]
    fn test_tap_failure_only_sees_failures() {
        let seen = Cell::new(0);
        let outcome = Outcome::success(1).tap_failure(|_| seen.set(seen.get() + 1));
        assert!(outcome.is_success());
        assert_eq!(seen.get(), 0);

        let outcome = failed().tap_failure(|errors| seen.set(errors.len()));
        assert_eq!(seen.get(), 1);
        assert_eq!(outcome, failed());

        let outcome = failed().tap_failure(|_| panic!("alerting is down"));
        assert_eq!(outcome, failed());
    }

    #[tokio::test]
    async fn test_async_filters() {
        let taken = Error::validation("name", "taken");
        let outcome = Outcome::success("bob")
            .filter_async(|name| std::future::ready(name.len() > 2), taken.clone())
            .await;
        assert!(outcome.is_success());

        let outcome = Outcome::success("bob")
            .unless_async(|name| std::future::ready(*name == "bob"), taken.clone())
            .await;
        assert_eq!(outcome.errors(), [taken.clone()]);

        let outcome = failed()
            .unless_async(|_| std::future::ready(false), taken)
            .await;
        assert_eq!(outcome, failed());
    }

    struct ReservedWord;

    #[async_trait::async_trait]
    impl crate::AsyncValidator<String> for ReservedWord {
        async fn validate(&self, value: &String) -> Vec<Violation> {
            tokio::task::yield_now().await;
            if value == "root" {
                vec![Violation::new("username", "reserved")]
            } else {
                Vec::new()
            }
        }
    }

    #[tokio::test]
    async fn test_validate_async() {
        let outcome = Outcome::success("root".to_string())
            .validate_async(&ReservedWord)
            .await;
        assert_eq!(outcome.errors(), [Error::validation("username", "reserved")]);
        assert_eq!(outcome.value().map(String::as_str), Some("root"));

        let outcome = Outcome::success("alice".to_string())
            .validate_async(&ReservedWord)
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_validate_each_async_keeps_item_order() {
        let names = vec!["root".to_string(), "alice".to_string(), "root".to_string()];
        let outcome = Outcome::success(names).validate_each_async(&ReservedWord).await;
        assert_eq!(
            outcome.errors(),
            [
                Error::validation("[0].username", "reserved"),
                Error::validation("[2].username", "reserved"),
            ]
        );

        let outcome = Outcome::<Vec<String>>::failure(Error::generic("no users"))
            .validate_each_async(&ReservedWord)
            .await;
        assert_eq!(outcome.errors(), [Error::generic("no users")]);
    }

    #[tokio::test]
    async fn test_async_variants() {
        let outcome = Outcome::success(2)
            .map_async(|v| async move { v + 1 })
            .await
            .bind_async(|v| async move { Outcome::success(v * 2) })
            .await
            .ensure_async(|v| std::future::ready(*v == 6), Error::generic("not six"))
            .await;
        assert_eq!(outcome.value(), Some(&6));

        let outcome = Outcome::success(1)
            .tap_async(|_| async { panic!("async effect failed") })
            .await;
        assert!(outcome.is_failure());

        let outcome = failed().or_else_async(|| async { Outcome::success(0) }).await;
        assert!(outcome.is_success());

        let outcome = Outcome::<u8>::attempt_async(async { "300".parse::<u8>() }).await;
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::Exception);
    }
}
