//! Test fixtures: tracing setup and call-counting rules

use crate::{Error, Fault, Outcome, Rule, RuleContext};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Install a `fmt` subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Shared handle on a rule's body invocation count
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Invocations so far
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a [`CountingRule`] body does when it runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleBehavior {
    /// Succeed
    Pass,
    /// Fail with a generic error
    Fail,
    /// Fail without attaching any error
    FailSilently,
    /// Panic
    Panic,
    /// Return an error fault
    Fault,
    /// Wait until the evaluation is cancelled
    WaitForCancel,
}

#[derive(Debug, thiserror::Error)]
#[error("fixture fault")]
struct FixtureFault;

/// Rule fixture that counts how often its body runs
pub struct CountingRule {
    name: Box<str>,
    message: Box<str>,
    behavior: RuleBehavior,
    enabled: bool,
    calls: CallCounter,
}

impl CountingRule {
    /// Enabled rule named `name`; its message is "`name` failed"
    pub fn new(name: &str, behavior: RuleBehavior) -> Self {
        Self {
            name: name.into(),
            message: format!("{name} failed").into_boxed_str(),
            behavior,
            enabled: true,
            calls: CallCounter::default(),
        }
    }

    /// Disable the rule
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Counter shared with this rule
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl Rule for CountingRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn message(&self) -> &str {
        &self.message
    }

    async fn is_enabled(&self, _context: &RuleContext) -> bool {
        self.enabled
    }

    async fn evaluate(&self, context: &RuleContext) -> Result<Outcome, Fault> {
        self.calls.bump();
        match self.behavior {
            RuleBehavior::Pass => Ok(Outcome::ok()),
            RuleBehavior::Fail => Ok(Outcome::failure(Error::generic(self.message.clone()))),
            RuleBehavior::FailSilently => Ok(Outcome::failure_many([])),
            RuleBehavior::Panic => panic!("{} panicked", self.name),
            RuleBehavior::Fault => Err(FixtureFault.into()),
            RuleBehavior::WaitForCancel => {
                context.cancellation.cancelled().await;
                Err(Fault::cancelled())
            }
        }
    }
}
