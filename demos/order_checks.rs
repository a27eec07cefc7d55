//! Order intake: validate, run business rules, retry a flaky reservation,
//! then print the wire shape of each result.
//!
//! Order 1 passes, 2 fails validation, 3 fails the stock rule, 4 trips the
//! faulting fraud screen, and 404 is never found.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example order_checks
//! ```

use outcome_rail::{
    retry, AllOf, AsyncFnRule, CancellationToken, Enablement, Error, Fault, FnRule, Outcome,
    OutcomeFutureExt, PagedOutcome, RailConfig, RuleEngine, RuleSet, TracingLogger,
    TracingObserver, Violation,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, serde::Serialize)]
struct Order {
    id: u32,
    customer: String,
    quantity: u32,
    unit_price_cents: u64,
}

impl Order {
    fn total_cents(&self) -> u64 {
        u64::from(self.quantity) * self.unit_price_cents
    }
}

fn order_validator() -> AllOf<Order> {
    AllOf::new()
        .with(|order: &Order| {
            if order.customer.trim().is_empty() {
                vec![Violation::new("customer", "required")]
            } else {
                Vec::new()
            }
        })
        .with(|order: &Order| {
            if order.quantity == 0 {
                vec![Violation::new("quantity", "must be at least 1")]
            } else {
                Vec::new()
            }
        })
}

fn order_rules(order: &Order) -> RuleSet {
    let total = order.total_cents();
    let quantity = order.quantity;
    RuleSet::builder()
        .register(FnRule::check("credit_limit", "order exceeds the credit limit", move |_| {
            total <= 50_000
        }))
        .register(
            AsyncFnRule::new("stock", "not enough stock", move |ctx| async move {
                ctx.check_cancelled()?;
                tokio::task::yield_now().await;
                Ok::<_, Fault>(if quantity <= 20 {
                    Outcome::ok().with_message("stock reserved")
                } else {
                    Outcome::failure_many([])
                })
            })
            .with_enablement(Enablement::when(|ctx| !ctx.is_cancelled())),
        )
        .register(
            FnRule::new("fraud_screen", "fraud screen unavailable", |_| {
                Err(Fault::message("screening service timed out"))
            })
            .with_enablement(Enablement::when(move |_| total > 20_000)),
        )
        .build()
}

async fn load_order(id: u32) -> Outcome<Order> {
    tokio::task::yield_now().await;
    let order = (id != 404).then(|| Order {
        id,
        customer: if id == 2 { String::new() } else { format!("customer-{id}") },
        quantity: match id {
            3 => 40,
            4 => 18,
            _ => 2,
        },
        unit_price_cents: 1_250,
    });
    Outcome::from_option(order, Error::generic(format!("order {id} not found")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let config = RailConfig::from_env()?;
    let engine = RuleEngine::with_observer(Arc::new(TracingObserver));
    let token = CancellationToken::new();
    let validator = order_validator();

    for id in [1, 2, 3, 4, 404] {
        let order = load_order(id)
            .pending(&token)
            .validate(&validator)
            .log(Some(&TracingLogger), "order {status}: {errors}", config.log_levels)
            .await;

        let checked = match order.value() {
            Some(found) if order.is_success() => {
                let found = found.clone();
                let verdict = engine.apply_all(&order_rules(&found), &token).await;
                order.merge(verdict.map(move |()| found))
            }
            _ => order,
        };
        println!("order {id}: {}", checked.to_json(&config.wire)?);
    }

    let attempts = AtomicU32::new(0);
    let reserved = retry(&config.retry, &token, |attempt| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt < 2 {
                Outcome::failure(Error::generic("warehouse busy"))
            } else {
                Outcome::success(format!("reservation-{attempt}"))
            }
        }
    })
    .await;
    println!(
        "reservation after {} attempts: {}",
        attempts.load(Ordering::SeqCst),
        reserved.to_json(&config.wire)?
    );

    let page =
        PagedOutcome::success(vec![1u32, 2, 3], 10, 1, 3).map_items(|id| format!("order-{id}"));
    println!("page: {}", page.to_json(&config.wire)?);
    Ok(())
}
