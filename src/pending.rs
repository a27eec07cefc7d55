//! Combinators over pending outcomes
//!
//! [`Pending`] wraps a future that resolves to an [`Outcome`] together with a
//! cancellation token; [`PendingPage`] does the same for a [`PagedOutcome`].
//! Awaiting either settles the future: cancellation observed before or during
//! the wait becomes a `Cancelled` failure, and a panic while polling becomes an
//! exception snapshot. Every combinator settles the upstream computation and
//! then delegates to the immediate form, so both forms share one set of
//! semantics.

use crate::{
    classify, AsyncValidator, Cancelled, Error, Fault, LogLevels, Outcome, OutcomeLogger,
    PagedOutcome, Validator,
};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Outcome shapes a pending computation can settle into
pub trait Settled: Sized {
    /// Result reported when the token is cancelled first
    fn cancelled() -> Self;

    /// Result reported when polling raised a fault
    fn faulted(fault: Fault) -> Self;
}

impl<T> Settled for Outcome<T> {
    fn cancelled() -> Self {
        Outcome::cancelled()
    }

    fn faulted(fault: Fault) -> Self {
        Outcome::from_fault(fault)
    }
}

impl<T> Settled for PagedOutcome<T> {
    fn cancelled() -> Self {
        PagedOutcome::failure(Error::cancelled())
    }

    fn faulted(fault: Fault) -> Self {
        PagedOutcome::failure(classify(&fault))
    }
}

/// A deferred outcome bound to a cancellation token
#[must_use = "pending outcomes do nothing unless awaited"]
pub struct Pending<F> {
    future: Pin<Box<F>>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    token: CancellationToken,
    done: bool,
}

impl<F> Pending<F>
where
    F: Future,
    F::Output: Settled,
{
    /// Bind `future` to `token`
    pub fn new(future: F, token: &CancellationToken) -> Self {
        Self {
            future: Box::pin(future),
            cancelled: Box::pin(token.clone().cancelled_owned()),
            token: token.clone(),
            done: false,
        }
    }

    /// The token this computation observes
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn chain<G>(self, next: impl FnOnce(Self) -> G) -> Pending<G>
    where
        G: Future,
        G::Output: Settled,
    {
        let token = self.token.clone();
        Pending::new(next(self), &token)
    }
}

impl<F, T> Pending<F>
where
    F: Future<Output = Outcome<T>>,
{
    /// Deferred [`Outcome::map`]
    pub fn map<U, M>(self, f: M) -> Pending<impl Future<Output = Outcome<U>>>
    where
        M: FnOnce(T) -> U,
    {
        self.chain(|upstream| async move { upstream.await.map(f) })
    }

    /// Deferred [`Outcome::map_async`]
    pub fn map_async<U, M, Fut>(self, f: M) -> Pending<impl Future<Output = Outcome<U>>>
    where
        M: FnOnce(T) -> Fut,
        Fut: Future<Output = U>,
    {
        self.chain(|upstream| async move { upstream.await.map_async(f).await })
    }

    /// Deferred [`Outcome::bind`]
    pub fn bind<U, B>(self, f: B) -> Pending<impl Future<Output = Outcome<U>>>
    where
        B: FnOnce(T) -> Outcome<U>,
    {
        self.chain(|upstream| async move { upstream.await.bind(f) })
    }

    /// Deferred [`Outcome::bind_async`]; the continuation is itself
    /// cancellable at its suspension points
    pub fn bind_async<U, B, Fut>(self, f: B) -> Pending<impl Future<Output = Outcome<U>>>
    where
        B: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        self.chain(|upstream| async move { upstream.await.bind_async(f).await })
    }

    /// Deferred [`Outcome::tap`]
    pub fn tap<A>(self, action: A) -> Pending<impl Future<Output = Outcome<T>>>
    where
        A: FnOnce(&T),
    {
        self.chain(|upstream| async move { upstream.await.tap(action) })
    }

    /// Deferred [`Outcome::tap_async`]
    pub fn tap_async<A, Fut>(self, action: A) -> Pending<impl Future<Output = Outcome<T>>>
    where
        T: Clone,
        A: FnOnce(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.chain(|upstream| async move { upstream.await.tap_async(action).await })
    }

    /// Deferred [`Outcome::try_tap`]
    pub fn try_tap<A, E>(self, action: A) -> Pending<impl Future<Output = Outcome<T>>>
    where
        A: FnOnce(&T) -> Result<(), E>,
        E: Into<Fault>,
    {
        self.chain(|upstream| async move { upstream.await.try_tap(action) })
    }

    /// Deferred [`Outcome::tap_failure`]
    pub fn tap_failure<A>(self, action: A) -> Pending<impl Future<Output = Outcome<T>>>
    where
        A: FnOnce(&[Error]),
    {
        self.chain(|upstream| async move { upstream.await.tap_failure(action) })
    }

    /// Deferred [`Outcome::filter`]
    pub fn filter<P>(self, predicate: P, error: Error) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.filter(predicate, error) })
    }

    /// Deferred [`Outcome::filter_async`]
    pub fn filter_async<P, Fut>(
        self,
        predicate: P,
        error: Error,
    ) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.chain(|upstream| async move { upstream.await.filter_async(predicate, error).await })
    }

    /// Deferred [`Outcome::ensure`]
    pub fn ensure<P>(self, predicate: P, error: Error) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.ensure(predicate, error) })
    }

    /// Deferred [`Outcome::ensure_async`]
    pub fn ensure_async<P, Fut>(
        self,
        predicate: P,
        error: Error,
    ) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.chain(|upstream| async move { upstream.await.ensure_async(predicate, error).await })
    }

    /// Deferred [`Outcome::unless`]
    pub fn unless<P>(self, predicate: P, error: Error) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.unless(predicate, error) })
    }

    /// Deferred [`Outcome::unless_async`]
    pub fn unless_async<P, Fut>(
        self,
        predicate: P,
        error: Error,
    ) -> Pending<impl Future<Output = Outcome<T>>>
    where
        P: FnOnce(&T) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.chain(|upstream| async move { upstream.await.unless_async(predicate, error).await })
    }

    /// Deferred [`Outcome::choose`]
    pub fn choose<U, C>(self, chooser: C) -> Pending<impl Future<Output = Outcome<Option<U>>>>
    where
        C: FnOnce(T) -> Option<U>,
    {
        self.chain(|upstream| async move { upstream.await.choose(chooser) })
    }

    /// Deferred [`Outcome::validate`]
    pub fn validate<'v, V>(self, validator: &'v V) -> Pending<impl Future<Output = Outcome<T>> + 'v>
    where
        V: Validator<T> + ?Sized,
        F: 'v,
        T: 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate(validator) })
    }

    /// Deferred [`Outcome::validate_async`]
    pub fn validate_async<'v, V>(
        self,
        validator: &'v V,
    ) -> Pending<impl Future<Output = Outcome<T>> + 'v>
    where
        V: AsyncValidator<T> + ?Sized,
        F: 'v,
        T: Sync + 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate_async(validator).await })
    }

    /// Deferred [`Outcome::or_else`]
    pub fn or_else<B>(self, fallback: B) -> Pending<impl Future<Output = Outcome<T>>>
    where
        B: FnOnce() -> Outcome<T>,
    {
        self.chain(|upstream| async move { upstream.await.or_else(fallback) })
    }

    /// Deferred [`Outcome::or_else_async`]; the fallback is cancellable too
    pub fn or_else_async<B, Fut>(self, fallback: B) -> Pending<impl Future<Output = Outcome<T>>>
    where
        B: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        self.chain(|upstream| async move { upstream.await.or_else_async(fallback).await })
    }

    /// Deferred [`Outcome::map_errors`]
    pub fn map_errors<M>(self, f: M) -> Pending<impl Future<Output = Outcome<T>>>
    where
        M: FnMut(Error) -> Error,
    {
        self.chain(|upstream| async move { upstream.await.map_errors(f) })
    }

    /// Deferred [`Outcome::handle`]
    pub fn handle<S, H>(
        self,
        on_success: S,
        on_failure: H,
    ) -> Pending<impl Future<Output = Outcome<T>>>
    where
        S: FnOnce(&T),
        H: FnMut(&[Error]),
    {
        self.chain(|upstream| async move { upstream.await.handle(on_success, on_failure) })
    }

    /// Deferred [`Outcome::log`]
    pub fn log<'l>(
        self,
        logger: Option<&'l dyn OutcomeLogger>,
        template: &'l str,
        levels: LogLevels,
    ) -> Pending<impl Future<Output = Outcome<T>> + 'l>
    where
        F: 'l,
        T: 'l,
    {
        self.chain(|upstream| async move { upstream.await.log(logger, template, levels) })
    }

    /// Deferred [`Outcome::match_outcome`].
    ///
    /// Unlike the other pending combinators this one does not absorb
    /// cancellation: if the token is cancelled by the time the decision would
    /// be made, the caller gets [`Cancelled`] instead of a branch result.
    pub async fn match_outcome<R, S, H>(self, on_success: S, on_failure: H) -> Result<R, Cancelled>
    where
        S: FnOnce(T) -> R,
        H: FnOnce(Vec<Error>) -> R,
    {
        let token = self.token.clone();
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        let outcome = self.await;
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(outcome.match_outcome(on_success, on_failure))
    }
}

impl<F, T> Pending<F>
where
    F: Future<Output = Outcome<Vec<T>>>,
{
    /// Deferred [`Outcome::map_each`]
    pub fn map_each<U, M>(self, f: M) -> Pending<impl Future<Output = Outcome<Vec<U>>>>
    where
        M: FnMut(T) -> U,
    {
        self.chain(|upstream| async move { upstream.await.map_each(f) })
    }

    /// Deferred [`Outcome::choose_each`]
    pub fn choose_each<U, C>(self, chooser: C) -> Pending<impl Future<Output = Outcome<Vec<U>>>>
    where
        C: FnMut(T) -> Option<U>,
    {
        self.chain(|upstream| async move { upstream.await.choose_each(chooser) })
    }

    /// Deferred [`Outcome::validate_each`]
    pub fn validate_each<'v, V>(
        self,
        validator: &'v V,
    ) -> Pending<impl Future<Output = Outcome<Vec<T>>> + 'v>
    where
        V: Validator<T> + ?Sized,
        F: 'v,
        T: 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate_each(validator) })
    }

    /// Deferred [`Outcome::validate_each_async`]
    pub fn validate_each_async<'v, V>(
        self,
        validator: &'v V,
    ) -> Pending<impl Future<Output = Outcome<Vec<T>>> + 'v>
    where
        V: AsyncValidator<T> + ?Sized,
        F: 'v,
        T: Sync + 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate_each_async(validator).await })
    }
}

impl<F> Future for Pending<F>
where
    F: Future,
    F::Output: Settled,
{
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.done {
            return Poll::Ready(Settled::faulted(Fault::message(
                "pending outcome polled after completion",
            )));
        }
        // Cancellation wins ties, including a token cancelled before the first poll.
        if self.cancelled.as_mut().poll(cx).is_ready() {
            self.done = true;
            return Poll::Ready(Settled::cancelled());
        }

        let future = self.future.as_mut();
        let polled = panic::catch_unwind(AssertUnwindSafe(|| future.poll(cx)));
        match polled {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(outcome)) => {
                self.done = true;
                Poll::Ready(outcome)
            }
            Err(payload) => {
                self.done = true;
                Poll::Ready(Settled::faulted(Fault::from_panic(payload)))
            }
        }
    }
}

/// A deferred page bound to a cancellation token
#[must_use = "pending pages do nothing unless awaited"]
pub struct PendingPage<F> {
    inner: Pending<F>,
}

impl<F, T> PendingPage<F>
where
    F: Future<Output = PagedOutcome<T>>,
{
    /// Bind `future` to `token`
    pub fn new(future: F, token: &CancellationToken) -> Self {
        Self {
            inner: Pending::new(future, token),
        }
    }

    /// The token this computation observes
    pub fn token(&self) -> &CancellationToken {
        self.inner.token()
    }

    fn chain<U, G>(self, next: impl FnOnce(Self) -> G) -> PendingPage<G>
    where
        G: Future<Output = PagedOutcome<U>>,
    {
        let token = self.token().clone();
        PendingPage::new(next(self), &token)
    }

    /// Deferred [`PagedOutcome::map_items`]
    pub fn map_items<U, M>(self, f: M) -> PendingPage<impl Future<Output = PagedOutcome<U>>>
    where
        M: FnMut(T) -> U,
    {
        self.chain(|upstream| async move { upstream.await.map_items(f) })
    }

    /// Deferred [`PagedOutcome::bind`]
    pub fn bind<U, B>(self, f: B) -> PendingPage<impl Future<Output = PagedOutcome<U>>>
    where
        B: FnOnce(Vec<T>) -> Outcome<Vec<U>>,
    {
        self.chain(|upstream| async move { upstream.await.bind(f) })
    }

    /// Deferred [`PagedOutcome::choose`]
    pub fn choose<U, C>(self, chooser: C) -> PendingPage<impl Future<Output = PagedOutcome<U>>>
    where
        C: FnMut(T) -> Option<U>,
    {
        self.chain(|upstream| async move { upstream.await.choose(chooser) })
    }

    /// Deferred [`PagedOutcome::filter`]
    pub fn filter<P>(
        self,
        predicate: P,
        error: Error,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.filter(predicate, error) })
    }

    /// Deferred [`PagedOutcome::ensure`]
    pub fn ensure<P>(
        self,
        predicate: P,
        error: Error,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.ensure(predicate, error) })
    }

    /// Deferred [`PagedOutcome::unless`]
    pub fn unless<P>(
        self,
        predicate: P,
        error: Error,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.chain(|upstream| async move { upstream.await.unless(predicate, error) })
    }

    /// Deferred [`PagedOutcome::tap`]
    pub fn tap<A>(self, action: A) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        A: FnOnce(&[T]),
    {
        self.chain(|upstream| async move { upstream.await.tap(action) })
    }

    /// Deferred [`PagedOutcome::try_tap`]
    pub fn try_tap<A, E>(self, action: A) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        A: FnOnce(&[T]) -> Result<(), E>,
        E: Into<Fault>,
    {
        self.chain(|upstream| async move { upstream.await.try_tap(action) })
    }

    /// Deferred [`PagedOutcome::validate`]
    pub fn validate<'v, V>(
        self,
        validator: &'v V,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>> + 'v>
    where
        V: Validator<T> + ?Sized,
        F: 'v,
        T: 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate(validator) })
    }

    /// Deferred [`PagedOutcome::validate_async`]
    pub fn validate_async<'v, V>(
        self,
        validator: &'v V,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>> + 'v>
    where
        V: AsyncValidator<T> + ?Sized,
        F: 'v,
        T: Sync + 'v,
    {
        self.chain(|upstream| async move { upstream.await.validate_async(validator).await })
    }

    /// Deferred [`PagedOutcome::or_else`]
    pub fn or_else<B>(self, fallback: B) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        B: FnOnce() -> PagedOutcome<T>,
    {
        self.chain(|upstream| async move { upstream.await.or_else(fallback) })
    }

    /// Deferred [`PagedOutcome::handle`]
    pub fn handle<S, H>(
        self,
        on_success: S,
        on_failure: H,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>>>
    where
        S: FnOnce(&[T]),
        H: FnMut(&[Error]),
    {
        self.chain(|upstream| async move { upstream.await.handle(on_success, on_failure) })
    }

    /// Deferred [`PagedOutcome::log`]
    pub fn log<'l>(
        self,
        logger: Option<&'l dyn OutcomeLogger>,
        template: &'l str,
        levels: LogLevels,
    ) -> PendingPage<impl Future<Output = PagedOutcome<T>> + 'l>
    where
        F: 'l,
        T: 'l,
    {
        self.chain(|upstream| async move { upstream.await.log(logger, template, levels) })
    }

    /// Deferred [`PagedOutcome::match_outcome`]; cancellation is propagated
    /// the same way as [`Pending::match_outcome`]
    pub async fn match_outcome<R, S, H>(self, on_success: S, on_failure: H) -> Result<R, Cancelled>
    where
        S: FnOnce(Vec<T>) -> R,
        H: FnOnce(Vec<Error>) -> R,
    {
        let token = self.token().clone();
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        let page = self.await;
        if token.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(page.match_outcome(on_success, on_failure))
    }
}

impl<F, T> Future for PendingPage<F>
where
    F: Future<Output = PagedOutcome<T>>,
{
    type Output = PagedOutcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

/// Bind any outcome-producing future to a cancellation token
pub trait OutcomeFutureExt<T>: Future<Output = Outcome<T>> + Sized {
    /// Wrap in [`Pending`] to use the deferred combinators
    fn pending(self, token: &CancellationToken) -> Pending<Self> {
        Pending::new(self, token)
    }
}

impl<T, F> OutcomeFutureExt<T> for F where F: Future<Output = Outcome<T>> {}

/// Bind any page-producing future to a cancellation token
pub trait PagedFutureExt<T>: Future<Output = PagedOutcome<T>> + Sized {
    /// Wrap in [`PendingPage`] to use the deferred page combinators
    fn pending_page(self, token: &CancellationToken) -> PendingPage<Self> {
        PendingPage::new(self, token)
    }
}

impl<T, F> PagedFutureExt<T> for F where F: Future<Output = PagedOutcome<T>> {}

/// Settle `future` under `token` without chaining further combinators
pub async fn settle<T, F>(future: F, token: &CancellationToken) -> Outcome<T>
where
    F: Future<Output = Outcome<T>>,
{
    Pending::new(future, token).await
}

/// Wrap an async computation that may fail, panic, or be cancelled
pub async fn attempt<T, E, Fut>(op: Fut, token: &CancellationToken) -> Outcome<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<Fault>,
{
    Pending::new(Outcome::attempt_async(op), token).await
}
