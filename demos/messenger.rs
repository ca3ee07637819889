//! # Example: messenger
//!
//! Decoupled components talking through [`Messenger`] and [`AsyncMessenger`].
//!
//! Shows how to:
//! - Register closures and a [`Handler`] implementation.
//! - Route by context (topic) and by message type.
//! - Read the [`Delivery`] report, including a failing handler.
//!
//! ## Flow
//! ```text
//! Inventory ──send(StockLow)──────────────► Messenger ──► Purchasing (no context)
//! Checkout  ──send(OrderPlaced, "eu")─────► AsyncMessenger ──┬─► Billing  ("eu")
//!                                                            └─► Audit    ("eu", fails)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=courier=debug cargo run --example messenger
//! ```

use std::sync::Arc;

use courier::{
    AsyncMessenger, Context, Delivery, Handler, HandlerError, HandlerRef, HandlerResult, Messenger,
    MessengerConfig, Recipient,
};

#[derive(Debug)]
struct StockLow {
    sku: &'static str,
    left: u32,
}

#[derive(Debug)]
struct OrderPlaced {
    id: u64,
    total_cents: u64,
}

/// Handler implemented as a type rather than a closure.
struct Audit {
    limit_cents: u64,
}

#[async_trait::async_trait]
impl Handler<OrderPlaced> for Audit {
    async fn handle(&self, order: Arc<OrderPlaced>) -> HandlerResult {
        if order.total_cents > self.limit_cents {
            return Err(HandlerError::fail(format!(
                "order {} exceeds audit limit",
                order.id
            )));
        }
        println!("[audit] order {} ok", order.id);
        Ok(())
    }
}

fn report(label: &str, delivery: &Delivery) {
    println!(
        "[{label}] matched={} delivered={} failed={}",
        delivery.matched,
        delivery.delivered,
        delivery.failed()
    );
    for failure in &delivery.failures {
        println!("[{label}]   {:?}: {}", failure.recipient, failure.error);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // === Synchronous ===
    let messenger = Messenger::new(MessengerConfig::default());
    messenger.register("purchasing", |msg: &StockLow| {
        println!("[purchasing] reorder {} ({} left)", msg.sku, msg.left);
        Ok(())
    })?;

    let delivery = messenger.send(&StockLow { sku: "A-100", left: 2 });
    report("stock", &delivery);

    // Same type, but nobody listens on this topic.
    let delivery = messenger.send_with_context(&StockLow { sku: "B-7", left: 0 }, "warehouse-2");
    report("stock@warehouse-2", &delivery);

    // === Asynchronous ===
    let orders = AsyncMessenger::new(MessengerConfig::default().with_max_parallel(4));
    orders.register_with_context("billing", "eu", |order: Arc<OrderPlaced>| async move {
        println!("[billing] charge {} cents for order {}", order.total_cents, order.id);
        Ok(())
    })?;

    let audit: HandlerRef<OrderPlaced> = Arc::new(Audit { limit_cents: 10_000 });
    let eu = Context::from("eu");
    orders.register_handler(Recipient::named("audit"), Some(&eu), audit)?;

    let delivery = orders
        .send_with_context(OrderPlaced { id: 1, total_cents: 4_200 }, "eu")
        .await;
    report("order 1", &delivery);

    let delivery = orders
        .send_with_context(OrderPlaced { id: 2, total_cents: 25_000 }, "eu")
        .await;
    report("order 2", &delivery);

    orders.unregister("audit");
    let delivery = orders
        .send_with_context(OrderPlaced { id: 3, total_cents: 25_000 }, "eu")
        .await;
    report("order 3", &delivery);

    Ok(())
}
