//! Paginated collection outcomes

use crate::{AsyncValidator, Error, Fault, Outcome, Validator};

/// Page size used when a failure is built without paging information
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// An outcome whose value is one page of a larger collection.
///
/// Only `current_page`, `page_size`, and `total_count` are stored; page counts
/// and navigation flags are always derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct PagedOutcome<T> {
    outcome: Outcome<Vec<T>>,
    current_page: u32,
    page_size: u32,
    total_count: u64,
}

impl<T> PagedOutcome<T> {
    /// One successful page.
    ///
    /// A page number or page size of zero yields a failure instead; both are
    /// then clamped to 1 so the stored fields stay in range.
    pub fn success(items: Vec<T>, total_count: u64, current_page: u32, page_size: u32) -> Self {
        let outcome = Outcome::success(items);
        let outcome = match (current_page, page_size) {
            (0, _) => outcome.with_error(Error::validation("currentPage", "must be at least 1")),
            (_, 0) => outcome.with_error(Error::validation("pageSize", "must be at least 1")),
            _ => outcome,
        };
        Self {
            outcome,
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            total_count,
        }
    }

    /// Empty first page of an empty collection
    pub fn empty(page_size: u32) -> Self {
        Self::success(Vec::new(), 0, 1, page_size)
    }

    /// Failed page read
    pub fn failure(error: Error) -> Self {
        Self::from_outcome(Outcome::failure(error), 0, 1, DEFAULT_PAGE_SIZE)
    }

    /// Attach paging to an existing collection outcome
    pub fn from_outcome(
        outcome: Outcome<Vec<T>>,
        total_count: u64,
        current_page: u32,
        page_size: u32,
    ) -> Self {
        Self {
            outcome,
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            total_count,
        }
    }

    /// Check if the page read succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Check if the page read failed
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// Items on this page; empty when a failure carries no items
    pub fn items(&self) -> &[T] {
        self.outcome.value().map(Vec::as_slice).unwrap_or_default()
    }

    /// Messages recorded so far
    pub fn messages(&self) -> &[String] {
        self.outcome.messages()
    }

    /// Errors recorded so far
    pub fn errors(&self) -> &[Error] {
        self.outcome.errors()
    }

    /// 1-based page number
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Maximum items per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Items across all pages
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of pages; 0 for an empty collection
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    /// Check if a page follows this one
    pub fn has_next_page(&self) -> bool {
        u64::from(self.current_page) < self.total_pages()
    }

    /// Check if a page precedes this one
    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// Number of the following page, if any
    pub fn next_page(&self) -> Option<u32> {
        self.current_page.checked_add(1).filter(|_| self.has_next_page())
    }

    /// Number of the preceding page, if any
    pub fn previous_page(&self) -> Option<u32> {
        self.has_previous_page().then(|| self.current_page - 1)
    }

    /// The underlying collection outcome
    pub fn as_outcome(&self) -> &Outcome<Vec<T>> {
        &self.outcome
    }

    /// Drop paging and keep the collection outcome
    pub fn into_outcome(self) -> Outcome<Vec<T>> {
        self.outcome
    }

    /// Append an error
    pub fn with_error(self, error: Error) -> Self {
        self.rewrap(|outcome| outcome.with_error(error))
    }

    /// Append several errors
    pub fn with_errors(self, errors: impl IntoIterator<Item = Error>) -> Self {
        self.rewrap(|outcome| outcome.with_errors(errors))
    }

    /// Append a message
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.rewrap(|outcome| outcome.with_message(message))
    }

    /// Append several messages
    pub fn with_messages<I, M>(self, messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.rewrap(|outcome| outcome.with_messages(messages))
    }

    /// Combine two pages with [`Outcome::merge`].
    ///
    /// Paging follows the value: it comes from `other` when `other` carries
    /// items, and from `self` otherwise.
    pub fn merge(self, other: PagedOutcome<T>) -> Self {
        let paging = if other.outcome.value().is_some() {
            (other.current_page, other.page_size, other.total_count)
        } else {
            (self.current_page, self.page_size, self.total_count)
        };
        let (current_page, page_size, total_count) = paging;
        Self {
            outcome: self.outcome.merge(other.outcome),
            current_page,
            page_size,
            total_count,
        }
    }

    /// Transform every item on the page
    pub fn map_items<U, F>(self, f: F) -> PagedOutcome<U>
    where
        F: FnMut(T) -> U,
    {
        self.rewrap(|outcome| outcome.map_each(f))
    }

    /// Continue with a downstream outcome for the whole page, keeping paging
    pub fn bind<U, F>(self, f: F) -> PagedOutcome<U>
    where
        F: FnOnce(Vec<T>) -> Outcome<Vec<U>>,
    {
        self.rewrap(|outcome| outcome.bind(f))
    }

    /// Keep-and-transform or drop each item.
    ///
    /// Dropping never fails the page; `total_count` still describes the
    /// source collection.
    pub fn choose<U, F>(self, chooser: F) -> PagedOutcome<U>
    where
        F: FnMut(T) -> Option<U>,
    {
        self.rewrap(|outcome| outcome.choose_each(chooser))
    }

    /// Fail with `error` unless `predicate` holds for the page
    pub fn filter<P>(self, predicate: P, error: Error) -> Self
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.rewrap(|outcome| outcome.filter(|items| predicate(items.as_slice()), error))
    }

    /// Precondition form of [`PagedOutcome::filter`]
    pub fn ensure<P>(self, predicate: P, error: Error) -> Self
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.filter(predicate, error)
    }

    /// Fail with `error` when `predicate` holds for the page
    pub fn unless<P>(self, predicate: P, error: Error) -> Self
    where
        P: FnOnce(&[T]) -> bool,
    {
        self.filter(|items| !predicate(items), error)
    }

    /// Run a side effect on the page
    pub fn tap<F>(self, action: F) -> Self
    where
        F: FnOnce(&[T]),
    {
        self.rewrap(|outcome| outcome.tap(|items| action(items.as_slice())))
    }

    /// Run a fallible side effect on the page; an `Err` or a panic fails it
    pub fn try_tap<F, E>(self, action: F) -> Self
    where
        F: FnOnce(&[T]) -> Result<(), E>,
        E: Into<Fault>,
    {
        self.rewrap(|outcome| outcome.try_tap(|items| action(items.as_slice())))
    }

    /// Validate every item, collecting all violations
    pub fn validate<V>(self, validator: &V) -> Self
    where
        V: Validator<T> + ?Sized,
    {
        self.rewrap(|outcome| outcome.validate_each(validator))
    }

    /// [`PagedOutcome::validate`] with an async validator
    pub async fn validate_async<V>(self, validator: &V) -> Self
    where
        V: AsyncValidator<T> + ?Sized,
        T: Sync,
    {
        let Self {
            outcome,
            current_page,
            page_size,
            total_count,
        } = self;
        Self {
            outcome: outcome.validate_each_async(validator).await,
            current_page,
            page_size,
            total_count,
        }
    }

    /// Substitute `fallback` for a failed page read
    pub fn or_else<F>(self, fallback: F) -> Self
    where
        F: FnOnce() -> PagedOutcome<T>,
    {
        if self.is_success() {
            self
        } else {
            fallback()
        }
    }

    /// Fold both tracks into a single value
    pub fn match_outcome<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(Vec<T>) -> R,
        F: FnOnce(Vec<Error>) -> R,
    {
        self.outcome.match_outcome(on_success, on_failure)
    }

    /// Run whichever branch applies and return the page unchanged; see
    /// [`Outcome::handle`]
    pub fn handle<S, F>(self, on_success: S, on_failure: F) -> Self
    where
        S: FnOnce(&[T]),
        F: FnMut(&[Error]),
    {
        self.rewrap(|outcome| outcome.handle(|items| on_success(items.as_slice()), on_failure))
    }

    fn rewrap<U, F>(self, f: F) -> PagedOutcome<U>
    where
        F: FnOnce(Outcome<Vec<T>>) -> Outcome<Vec<U>>,
    {
        PagedOutcome {
            outcome: f(self.outcome),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}
