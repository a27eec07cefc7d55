//! Rule capability and ready-made rules

use crate::{Fault, Outcome, RuleContext};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// An evaluatable condition that yields an outcome rather than a bare boolean.
///
/// Evaluation is always deferred; an immediate rule is one whose future never
/// suspends. Rules do not classify their own faults: return `Err(fault)` (or
/// use `?`) and the engine turns it into a typed error. A failure outcome
/// without errors is accepted and gets the rule's violation attached.
///
/// # Example
///
/// ```rust,ignore
/// struct CreditLimit { limit: u64, requested: u64 }
///
/// #[async_trait]
/// impl Rule for CreditLimit {
///     fn name(&self) -> &str { "credit_limit" }
///     fn message(&self) -> &str { "requested amount exceeds the credit limit" }
///
///     async fn evaluate(&self, ctx: &RuleContext) -> Result<Outcome, Fault> {
///         ctx.check_cancelled()?;
///         if self.requested <= self.limit {
///             Ok(Outcome::ok())
///         } else {
///             Err(Fault::violation())
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Rule: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> &str;

    /// Message reported when the rule is violated
    fn message(&self) -> &str;

    /// Whether the body runs at all; a disabled rule passes
    async fn is_enabled(&self, _context: &RuleContext) -> bool {
        true
    }

    /// Run the rule body
    async fn evaluate(&self, context: &RuleContext) -> Result<Outcome, Fault>;
}

/// Enable gate for the closure-backed rules
pub enum Enablement {
    /// Always run the body
    Always,
    /// Never run the body
    Never,
    /// Decide per evaluation
    When(Box<dyn Fn(&RuleContext) -> bool + Send + Sync>),
    /// Decide per evaluation, asynchronously
    WhenAsync(Box<dyn Fn(RuleContext) -> BoxFuture<'static, bool> + Send + Sync>),
}

impl Enablement {
    /// Gate on a synchronous predicate
    pub fn when(predicate: impl Fn(&RuleContext) -> bool + Send + Sync + 'static) -> Self {
        Self::When(Box::new(predicate))
    }

    /// Gate on an asynchronous predicate
    pub fn when_async<P, Fut>(predicate: P) -> Self
    where
        P: Fn(RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::WhenAsync(Box::new(move |ctx| predicate(ctx).boxed()))
    }

    /// Resolve the gate for one evaluation
    pub async fn resolve(&self, context: &RuleContext) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::When(predicate) => predicate(context),
            Self::WhenAsync(predicate) => predicate(context.clone()).await,
        }
    }
}

impl std::fmt::Debug for Enablement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Always => "Always",
            Self::Never => "Never",
            Self::When(_) => "When",
            Self::WhenAsync(_) => "WhenAsync",
        };
        f.write_str(name)
    }
}

type SyncBody = Box<dyn Fn(&RuleContext) -> Result<Outcome, Fault> + Send + Sync>;
type AsyncBody =
    Box<dyn Fn(RuleContext) -> BoxFuture<'static, Result<Outcome, Fault>> + Send + Sync>;

/// Rule with an immediate closure body
pub struct FnRule {
    name: Box<str>,
    message: Box<str>,
    enablement: Enablement,
    body: SyncBody,
}

impl FnRule {
    /// Rule running `body` on every enabled evaluation
    pub fn new<B>(name: impl Into<Box<str>>, message: impl Into<Box<str>>, body: B) -> Self
    where
        B: Fn(&RuleContext) -> Result<Outcome, Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            enablement: Enablement::Always,
            body: Box::new(body),
        }
    }

    /// Rule that passes while `predicate` holds and is violated otherwise
    pub fn check<P>(name: impl Into<Box<str>>, message: impl Into<Box<str>>, predicate: P) -> Self
    where
        P: Fn(&RuleContext) -> bool + Send + Sync + 'static,
    {
        Self::new(name, message, move |ctx| {
            Ok(if predicate(ctx) {
                Outcome::ok()
            } else {
                Outcome::failure_many([])
            })
        })
    }

    /// Replace the enable gate
    pub fn with_enablement(mut self, enablement: Enablement) -> Self {
        self.enablement = enablement;
        self
    }
}

#[async_trait]
impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn message(&self) -> &str {
        &self.message
    }

    async fn is_enabled(&self, context: &RuleContext) -> bool {
        self.enablement.resolve(context).await
    }

    async fn evaluate(&self, context: &RuleContext) -> Result<Outcome, Fault> {
        (self.body)(context)
    }
}

/// Rule with an async closure body
pub struct AsyncFnRule {
    name: Box<str>,
    message: Box<str>,
    enablement: Enablement,
    body: AsyncBody,
}

impl AsyncFnRule {
    /// Rule awaiting `body` on every enabled evaluation
    pub fn new<B, Fut>(name: impl Into<Box<str>>, message: impl Into<Box<str>>, body: B) -> Self
    where
        B: Fn(RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome, Fault>> + Send + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            enablement: Enablement::Always,
            body: Box::new(move |ctx| body(ctx).boxed()),
        }
    }

    /// Replace the enable gate
    pub fn with_enablement(mut self, enablement: Enablement) -> Self {
        self.enablement = enablement;
        self
    }
}

#[async_trait]
impl Rule for AsyncFnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn message(&self) -> &str {
        &self.message
    }

    async fn is_enabled(&self, context: &RuleContext) -> bool {
        self.enablement.resolve(context).await
    }

    async fn evaluate(&self, context: &RuleContext) -> Result<Outcome, Fault> {
        (self.body)(context.clone()).await
    }
}
