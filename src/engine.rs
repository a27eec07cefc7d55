//! Rule evaluation engine and rule registry

use crate::{
    classify_for_rule, Error, Fault, FnRule, NoOpObserver, Outcome, Rule, RuleContext, RuleObserver,
};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An ordered, immutable list of rules
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    /// Start registering rules
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rules are registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Explicit registry the host populates with concrete rules
#[derive(Default)]
pub struct RuleSetBuilder {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSetBuilder {
    /// Append a rule
    pub fn register(self, rule: impl Rule + 'static) -> Self {
        self.register_arc(Arc::new(rule))
    }

    /// Append a shared rule
    pub fn register_arc(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule backed by an immediate closure
    pub fn register_fn<B>(
        self,
        name: impl Into<Box<str>>,
        message: impl Into<Box<str>>,
        body: B,
    ) -> Self
    where
        B: Fn(&RuleContext) -> Result<Outcome, Fault> + Send + Sync + 'static,
    {
        self.register(FnRule::new(name, message, body))
    }

    /// Finish registration; order of registration is evaluation order
    pub fn build(self) -> RuleSet {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name()) {
                tracing::warn!(rule = %rule.name(), "Rule registered more than once");
            }
        }
        RuleSet { rules: self.rules }
    }
}

/// Evaluates rules, turning every raised fault into a typed error.
///
/// Holds only immutable configuration, so one engine can serve concurrent
/// `apply` calls.
#[derive(Clone)]
pub struct RuleEngine {
    observer: Arc<dyn RuleObserver>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// Engine with no observer
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoOpObserver))
    }

    /// Engine reporting to `observer`
    pub fn with_observer(observer: Arc<dyn RuleObserver>) -> Self {
        Self { observer }
    }

    /// Evaluate a single rule.
    ///
    /// A disabled rule passes without running its body. Faults and panics
    /// from the gate or the body never escape: cancellation becomes
    /// `Cancelled` naming the rule, anything else carries the rule's message.
    pub async fn apply(&self, rule: &dyn Rule, token: &CancellationToken) -> Outcome {
        self.apply_at(rule, 0, token).await
    }

    /// Evaluate `rules` in order, stopping at the first failure.
    ///
    /// Rules after the failing one are not evaluated. Messages from the rules
    /// that passed are kept on the result.
    pub async fn apply_all(&self, rules: &RuleSet, token: &CancellationToken) -> Outcome {
        let mut merged = Outcome::ok();
        for (index, rule) in rules.iter().enumerate() {
            let outcome = self.apply_at(rule, index, token).await;
            let failed = outcome.is_failure();
            merged = merged.merge(outcome);
            if failed {
                let remaining = rules.len() - index - 1;
                if remaining > 0 {
                    let context = RuleContext::new(rule.name(), index, token.clone());
                    self.observer.on_short_circuit(&context, remaining);
                }
                break;
            }
        }
        merged
    }

    async fn apply_at(&self, rule: &dyn Rule, index: usize, token: &CancellationToken) -> Outcome {
        let context = RuleContext::new(rule.name(), index, token.clone());
        if token.is_cancelled() {
            self.observer.on_rule_cancelled(&context);
            return Outcome::failure(Error::cancelled_in(rule.name()));
        }

        let gate = tokio::select! {
            biased;
            _ = token.cancelled() => Err(Fault::cancelled_in(rule.name())),
            caught = AssertUnwindSafe(rule.is_enabled(&context)).catch_unwind() => {
                caught.map_err(Fault::from_panic)
            }
        };
        let enabled = match gate {
            Ok(enabled) => enabled,
            Err(fault) => return self.faulted(rule, &context, fault),
        };
        if !enabled {
            self.observer.on_rule_skipped(&context);
            return Outcome::ok();
        }

        self.observer.on_rule_started(&context);
        let settled = tokio::select! {
            biased;
            _ = token.cancelled() => Err(Fault::cancelled_in(rule.name())),
            caught = AssertUnwindSafe(rule.evaluate(&context)).catch_unwind() => match caught {
                Ok(result) => result,
                Err(payload) => Err(Fault::from_panic(payload)),
            },
        };

        match settled {
            Ok(outcome) if outcome.is_success() => {
                self.observer.on_rule_passed(&context, context.elapsed_millis());
                outcome
            }
            Ok(outcome) => {
                let outcome = if outcome.is_unexplained() {
                    let (_, messages, _) = outcome.into_parts();
                    Outcome::failed(messages, vec![violation_of(rule)], false)
                } else {
                    outcome
                };
                self.observer.on_rule_failed(&context, outcome.errors());
                outcome
            }
            Err(fault) => self.faulted(rule, &context, fault),
        }
    }

    fn faulted(&self, rule: &dyn Rule, context: &RuleContext, fault: Fault) -> Outcome {
        if fault.is_cancellation() {
            self.observer.on_rule_cancelled(context);
        } else {
            self.observer.on_rule_faulted(context, &fault);
        }
        Outcome::failure(classify_for_rule(&fault, rule.name(), rule.message()))
    }
}

fn violation_of(rule: &dyn Rule) -> Error {
    let message = rule.message();
    let message = (!message.is_empty()).then(|| message.into());
    Error::rule_violation(rule.name(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingRule, RuleBehavior};
    use crate::{AsyncFnRule, Enablement, ErrorKind};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObserver(Mutex<Vec<String>>);

    impl RecordingObserver {
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl RuleObserver for RecordingObserver {
        fn on_rule_started(&self, context: &RuleContext) {
            self.push(format!("started {}", context.rule_name));
        }
        fn on_rule_skipped(&self, context: &RuleContext) {
            self.push(format!("skipped {}", context.rule_name));
        }
        fn on_rule_passed(&self, context: &RuleContext, _duration_millis: u64) {
            self.push(format!("passed {}", context.rule_name));
        }
        fn on_rule_failed(&self, context: &RuleContext, _errors: &[Error]) {
            self.push(format!("failed {}", context.rule_name));
        }
        fn on_rule_faulted(&self, context: &RuleContext, fault: &Fault) {
            self.push(format!("faulted {}: {fault}", context.rule_name));
        }
        fn on_rule_cancelled(&self, context: &RuleContext) {
            self.push(format!("cancelled {}", context.rule_name));
        }
        fn on_short_circuit(&self, context: &RuleContext, remaining: usize) {
            self.push(format!("short-circuit {} {remaining}", context.rule_name));
        }
    }

    #[tokio::test]
    async fn test_disabled_rule_never_runs() {
        let rule = CountingRule::new("inventory", RuleBehavior::Fail).disabled();
        let calls = rule.counter();
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert!(outcome.is_success());
        assert!(outcome.errors().is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_apply_all_short_circuits() {
        let rule_a = CountingRule::new("rule_a", RuleBehavior::Fail);
        let rule_b = CountingRule::new("rule_b", RuleBehavior::Fail);
        let (calls_a, calls_b) = (rule_a.counter(), rule_b.counter());
        let rules = RuleSet::builder().register(rule_a).register(rule_b).build();

        let observer = Arc::new(RecordingObserver::default());
        let engine = RuleEngine::with_observer(observer.clone());
        let outcome = engine.apply_all(&rules, &CancellationToken::new()).await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(calls_a.get(), 1);
        assert_eq!(calls_b.get(), 0);
        assert!(observer
            .0
            .lock()
            .unwrap()
            .contains(&"short-circuit rule_a 1".to_string()));
    }

    #[tokio::test]
    async fn test_apply_all_keeps_messages_of_passed_rules() {
        let rules = RuleSet::builder()
            .register_fn("first", "", |_| Ok(Outcome::ok().with_message("first ok")))
            .register_fn("second", "", |_| Ok(Outcome::ok().with_message("second ok")))
            .build();
        let outcome = RuleEngine::new()
            .apply_all(&rules, &CancellationToken::new())
            .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.messages(), ["first ok", "second ok"]);
        assert_eq!(rules.names().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[tokio::test]
    async fn test_panic_becomes_exception_with_rule_message() {
        let rule = CountingRule::new("pricing", RuleBehavior::Panic);
        let observer = Arc::new(RecordingObserver::default());
        let outcome = RuleEngine::with_observer(observer.clone())
            .apply(&rule, &CancellationToken::new())
            .await;

        let error = &outcome.errors()[0];
        assert_eq!(error.kind(), ErrorKind::Exception);
        assert_eq!(error.message(), Some("pricing failed"));
        let events = observer.0.lock().unwrap();
        assert!(events.iter().any(|e| e.starts_with("faulted pricing")));
    }

    #[tokio::test]
    async fn test_failure_without_errors_gets_rule_violation() {
        let rule = CountingRule::new("credit", RuleBehavior::FailSilently);
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert_eq!(
            outcome.errors(),
            [Error::rule_violation("credit", Some("credit failed".into()))]
        );
    }

    #[tokio::test]
    async fn test_violation_fault() {
        let rule = FnRule::new("age", "must be an adult", |_| Err(Fault::violation()));
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert_eq!(
            outcome.errors(),
            [Error::rule_violation("age", Some("must be an adult".into()))]
        );
    }

    #[tokio::test]
    async fn test_aggregate_cancellation_names_rule() {
        let rule = FnRule::new("batch", "batch failed", |_| {
            Err(Fault::aggregate([Fault::cancelled(), Fault::message("later")]))
        });
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert_eq!(outcome.errors(), [Error::cancelled_in("batch")]);
    }

    #[tokio::test]
    async fn test_cancellation_while_evaluating() {
        let rule = CountingRule::new("slow", RuleBehavior::WaitForCancel);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let outcome = RuleEngine::new().apply(&rule, &token).await;
        assert_eq!(outcome.errors(), [Error::cancelled_in("slow")]);
    }

    #[tokio::test]
    async fn test_cancelled_before_apply() {
        let rule = CountingRule::new("never", RuleBehavior::Pass);
        let calls = rule.counter();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = RuleEngine::new().apply(&rule, &token).await;
        assert!(outcome.is_cancelled());
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_panicking_gate_is_contained() {
        let rule = AsyncFnRule::new("gated", "gate broke", |_| async { Ok(Outcome::ok()) })
            .with_enablement(Enablement::when(|_| panic!("gate exploded")));
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::Exception);
        assert_eq!(outcome.errors()[0].message(), Some("gate broke"));
    }

    #[tokio::test]
    async fn test_cancellation_while_gate_suspends() {
        let rule = AsyncFnRule::new("lookup", "lookup failed", |_| async { Ok(Outcome::ok()) })
            .with_enablement(Enablement::when_async(|_| async {
                std::future::pending::<()>().await;
                true
            }));
        let rules = RuleSet::builder().register(rule).build();
        let observer = Arc::new(RecordingObserver::default());
        let engine = RuleEngine::with_observer(observer.clone());

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let applied = engine.apply_all(&rules, &token);
        let outcome = tokio::time::timeout(Duration::from_secs(5), applied)
            .await
            .expect("gate should observe cancellation");
        assert_eq!(outcome.errors(), [Error::cancelled_in("lookup")]);
        let events = observer.0.lock().unwrap();
        assert_eq!(*events, ["cancelled lookup".to_string()]);
    }

    #[tokio::test]
    async fn test_typed_error_raised_in_rule_is_kept() {
        let rule = FnRule::new("signup", "signup rejected", |_| {
            let checked: Result<Outcome, Error> = Err(Error::validation("email", "required"));
            Ok(checked?)
        });
        let outcome = RuleEngine::new().apply(&rule, &CancellationToken::new()).await;
        assert_eq!(outcome.errors(), [Error::validation("email", "required")]);
    }

    #[tokio::test]
    async fn test_concurrent_apply() {
        let engine = RuleEngine::new();
        let rule = CountingRule::new("shared", RuleBehavior::Pass);
        let calls = rule.counter();
        let token = CancellationToken::new();
        let (a, b) = tokio::join!(engine.apply(&rule, &token), engine.apply(&rule, &token));
        assert!(a.is_success() && b.is_success());
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_error_fault_reports_rule_message() {
        crate::testing::init_tracing();
        let rule = CountingRule::new("shipping", RuleBehavior::Fault);
        let engine = RuleEngine::with_observer(Arc::new(crate::TracingObserver));
        let outcome = engine.apply(&rule, &CancellationToken::new()).await;
        match &outcome.errors()[0] {
            Error::Exception {
                message, type_name, ..
            } => {
                assert_eq!(&**message, "shipping failed");
                assert!(type_name.ends_with("FixtureFault"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_names_still_register() {
        let rules = RuleSet::builder()
            .register(CountingRule::new("dup", RuleBehavior::Pass))
            .register(CountingRule::new("dup", RuleBehavior::Pass))
            .build();
        assert_eq!(rules.len(), 2);
        assert_eq!(format!("{rules:?}"), r#"["dup", "dup"]"#);
    }
}
