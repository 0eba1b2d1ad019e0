use std::time::Instant;

use fury_core::pool::Pool;
use fury_core::Fury;
use fury_derive::FuryClass;
use tracing_subscriber::EnvFilter;

#[derive(Debug, FuryClass)]
struct Order {
    id: i64,
    customer: String,
    line_items: Vec<String>,
}

fn setup_subscriber() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

/// Serializes and deserializes a batch of orders through a small pool of
/// engine handles, the way a request-handling loop would reuse one `Fury`
/// per in-flight call instead of registering types on every message.
fn run_batch(pool: &Pool<Fury>, orders: &[Order]) -> usize {
    let mut total_bytes = 0;
    for order in orders {
        let mut fury = pool.acquire(Fury::new);
        let bytes = fury.serialize(order).unwrap();
        total_bytes += bytes.len();
        let decoded: Order = fury.deserialize(&bytes).unwrap();
        assert_eq!(decoded.id, order.id);
    }
    total_bytes
}

fn main() {
    setup_subscriber();

    let pool: Pool<Fury> = Pool::new(2, 8, Fury::new);
    let orders: Vec<Order> = (0..64)
        .map(|i| Order { id: i, customer: format!("customer-{i}"), line_items: vec!["widget".to_string(), "gadget".to_string()] })
        .collect();

    let start = Instant::now();
    let total_bytes = run_batch(&pool, &orders);
    let elapsed = start.elapsed();

    println!("round-tripped {} orders ({} bytes) in {:?}", orders.len(), total_bytes, elapsed);
    println!("pool handles live: {}", pool.live_count());
}
