//! Per-evaluation rule context

use crate::Fault;
use tokio_util::sync::CancellationToken;

/// Context handed to a rule for one evaluation
#[derive(Clone)]
pub struct RuleContext {
    /// Name of the rule being evaluated
    pub rule_name: Box<str>,
    /// Position of the rule in its set (0 for a single `apply`)
    pub index: usize,
    /// Cancellation signal for this evaluation
    pub cancellation: CancellationToken,
    /// When the evaluation started (millis since UNIX epoch)
    pub started_at_millis: u64,
}

impl RuleContext {
    /// Create a context for the rule at `index`
    pub fn new(
        rule_name: impl Into<Box<str>>,
        index: usize,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            index,
            cancellation,
            started_at_millis: Self::now_millis(),
        }
    }

    /// Get current time in milliseconds since UNIX epoch
    pub fn now_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Calculate elapsed time since evaluation started
    pub fn elapsed_millis(&self) -> u64 {
        Self::now_millis().saturating_sub(self.started_at_millis)
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Bail out of a rule body with `?` once cancellation was requested
    pub fn check_cancelled(&self) -> Result<(), Fault> {
        if self.is_cancelled() {
            Err(Fault::cancelled_in(self.rule_name.clone()))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for RuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleContext")
            .field("rule_name", &self.rule_name)
            .field("index", &self.index)
            .field("cancelled", &self.is_cancelled())
            .field("started_at_millis", &self.started_at_millis)
            .finish()
    }
}
