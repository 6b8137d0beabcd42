// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Retrying a flaky remote call with the default policy.
//!
//! Run with: `cargo run --example flaky_service`

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pulse::Clock;
use redial::{AttemptRecord, Failure, Redial, RetryPolicy};

/// Pretends to call a remote service that throttles the first two requests.
async fn describe_table(calls: &AtomicU32) -> Result<String, Failure> {
    let call = calls.fetch_add(1, Ordering::SeqCst);

    if call < 2 {
        Err(Failure::msg("rate of requests exceeds throughput")
            .code("ProvisionedThroughputExceededException")
            .retry_after(Duration::from_millis(50)))
    } else {
        Ok("orders table: 12 partitions, ACTIVE".to_string())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::new();

    let policy = RetryPolicy::builder()
        .max_attempts(5)
        .base_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(2))
        .build()?;

    let engine = Redial::new(&clock)
        .policy(policy)
        .name("describe_table")
        .event_sink(|record: &AttemptRecord| {
            println!(
                "attempt {} -> {}{}",
                record.index(),
                record.outcome(),
                record
                    .delay()
                    .map(|delay| format!(" (next in {}ms)", delay.as_millis()))
                    .unwrap_or_default(),
            );
        });

    let calls = AtomicU32::new(0);
    let description = engine.execute(|| describe_table(&calls)).await?;

    println!("{description}");
    Ok(())
}
