//! Rule observer trait

use super::{Error, Fault, RuleContext};

/// Observer trait for external observability.
///
/// The only place the full detail of a fault raised by a rule is reported;
/// the outward error carries the rule's declared message instead.
pub trait RuleObserver: Send + Sync + 'static {
    fn on_rule_started(&self, context: &RuleContext);
    fn on_rule_skipped(&self, context: &RuleContext);
    fn on_rule_passed(&self, context: &RuleContext, duration_millis: u64);
    fn on_rule_failed(&self, context: &RuleContext, errors: &[Error]);
    fn on_rule_faulted(&self, context: &RuleContext, fault: &Fault);
    fn on_rule_cancelled(&self, context: &RuleContext);
    fn on_short_circuit(&self, context: &RuleContext, remaining: usize);
}

/// No-op observer
pub struct NoOpObserver;

impl RuleObserver for NoOpObserver {
    fn on_rule_started(&self, _context: &RuleContext) {}
    fn on_rule_skipped(&self, _context: &RuleContext) {}
    fn on_rule_passed(&self, _context: &RuleContext, _duration_millis: u64) {}
    fn on_rule_failed(&self, _context: &RuleContext, _errors: &[Error]) {}
    fn on_rule_faulted(&self, _context: &RuleContext, _fault: &Fault) {}
    fn on_rule_cancelled(&self, _context: &RuleContext) {}
    fn on_short_circuit(&self, _context: &RuleContext, _remaining: usize) {}
}

/// Tracing-based observer
pub struct TracingObserver;

impl RuleObserver for TracingObserver {
    fn on_rule_started(&self, context: &RuleContext) {
        tracing::debug!(rule = %context.rule_name, index = context.index, "Rule started");
    }

    fn on_rule_skipped(&self, context: &RuleContext) {
        tracing::debug!(rule = %context.rule_name, "Rule disabled, skipped");
    }

    fn on_rule_passed(&self, context: &RuleContext, duration_millis: u64) {
        tracing::debug!(rule = %context.rule_name, duration_ms = duration_millis, "Rule passed");
    }

    fn on_rule_failed(&self, context: &RuleContext, errors: &[Error]) {
        tracing::info!(rule = %context.rule_name, error_count = errors.len(), "Rule failed");
    }

    fn on_rule_faulted(&self, context: &RuleContext, fault: &Fault) {
        tracing::warn!(rule = %context.rule_name, fault = %fault, "Rule faulted");
    }

    fn on_rule_cancelled(&self, context: &RuleContext) {
        tracing::info!(rule = %context.rule_name, "Rule cancelled");
    }

    fn on_short_circuit(&self, context: &RuleContext, remaining: usize) {
        tracing::info!(rule = %context.rule_name, remaining, "Rule set short-circuited");
    }
}
