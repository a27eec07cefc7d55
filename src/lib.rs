//! Railway-Oriented Outcomes and Rule Evaluation
//!
//! Operations that can fail return an [`Outcome`] instead of panicking or
//! bubbling an error: a value, an ordered message log, and an append-only error
//! list. Success is derived from the error list being empty. Combinators keep
//! work on the success track and let a failure pass through untouched.
//! Faults raised inside them (an `Err` lifted with `?`, or a panic) are caught
//! at the boundary and become typed errors.
//!
//! Rules are evaluated by a [`RuleEngine`], which never lets a fault escape a
//! rule and stops a [`RuleSet`] at its first failure.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // 1. Compose outcomes
//! let total = Outcome::from_option(order, Error::generic("order not found"))
//!     .ensure(|o| !o.lines.is_empty(), Error::validation("lines", "required"))
//!     .validate(&order_validator)
//!     .map(|o| o.total());
//!
//! // 2. Defer over futures, bound to a cancellation token
//! let saved = repo.load(id)
//!     .pending(&token)
//!     .bind_async(|order| repo.save(order))
//!     .await;
//!
//! // 3. Register and apply rules
//! let rules = RuleSet::builder()
//!     .register(CreditLimit::new(limit))
//!     .register_fn("in_stock", "item out of stock", |_| Ok(stock_outcome()))
//!     .build();
//! let checked = RuleEngine::new().apply_all(&rules, &token).await;
//! ```

#![warn(missing_docs)]

// === Core Types ===
mod errors;
mod fault;
mod outcome;
mod paged;

// === Combinators ===
mod combinators;
mod pending;
mod retry;
mod validation;

// === Rules ===
mod context;
mod engine;
mod rule;

// === Observability ===
mod logging;
mod observer;

// === Boundary ===
mod config;
mod wire;

// === Test Support ===
#[cfg(any(test, feature = "test-harness"))]
pub mod testing;

// === Re-exports ===

// Types
pub use outcome::{Outcome, OutcomeBuilder};
pub use paged::{PagedOutcome, DEFAULT_PAGE_SIZE};

// Errors
pub use errors::{Cancelled, ConfigError, Error, ErrorKind, WireError};
pub use fault::{classify, classify_for_rule, Fault, PANIC_TYPE_NAME, UNNAMED_VIOLATION};

// Combinators
pub use pending::{
    attempt, settle, OutcomeFutureExt, PagedFutureExt, Pending, PendingPage, Settled,
};
pub use retry::{retry, RetryPolicy};
pub use validation::{AllOf, AsyncValidator, Validator, Violation};

// Rules
pub use context::RuleContext;
pub use engine::{RuleEngine, RuleSet, RuleSetBuilder};
pub use rule::{AsyncFnRule, Enablement, FnRule, Rule};

// Observability
pub use logging::{LogFields, LogLevels, NoOpLogger, OutcomeLogger, TracingLogger};
pub use observer::{NoOpObserver, RuleObserver, TracingObserver};

// Config & wire
pub use config::{
    RailConfig, ENV_FAILURE_LEVEL, ENV_RETRY_ATTEMPTS, ENV_STACK_TRACES, ENV_SUCCESS_LEVEL,
};
pub use wire::{WireOptions, WireOutcome, WirePage};

// Cancellation signal used throughout the API
pub use tokio_util::sync::CancellationToken;
