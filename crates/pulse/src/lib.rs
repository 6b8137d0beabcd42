// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Controllable time primitives: clocks, delays, and stopwatches.
//!
//! Working with time is notoriously difficult to test: real sleeps slow test suites down and
//! make timing-sensitive assertions flaky. This crate routes all time-related operations
//! through a [`Clock`] so that production code uses the system clock while tests drive the
//! passage of time manually.
//!
//! # Core Types
//!
//! - [`Clock`]: the entry point for reading time and creating delays and stopwatches.
//! - [`Delay`]: a future that completes after a duration has elapsed on its clock.
//! - [`Stopwatch`]: measures elapsed time against a clock.
//! - [`Timeout`] / [`FutureExt::timeout`]: races a future against a deadline.
//!
//! # Testing
//!
//! With the `test-util` feature enabled (in `dev-dependencies` only, never in production),
//! [`ClockControl`] creates clocks whose time only moves when the test says so:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use pulse::Clock;
//!
//! async fn produce_value(clock: &Clock) -> u64 {
//!     clock.delay(Duration::from_secs(60)).await;
//!     123
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let clock = Clock::new();
//!     assert_eq!(produce_value(&clock).await, 123);
//! }
//!
//! #[cfg(test)]
//! mod tests {
//!     use super::*;
//!     use pulse::ClockControl;
//!
//!     #[tokio::test]
//!     async fn test_produce_value() {
//!         // Automatically advance timers for instant, deterministic testing
//!         let clock = ClockControl::new().auto_advance_timers(true).to_clock();
//!         assert_eq!(produce_value(&clock).await, 123);
//!     }
//! }
//! ```
//!
//! Enabling `auto_advance_timers` makes every registered delay fire immediately by jumping
//! the clock forward to its deadline, which lets retry loops and other sleep-heavy code run
//! instantly in tests.

mod clock;
#[cfg(any(feature = "test-util", test))]
mod clock_control;
mod delay;
mod future_ext;
mod stopwatch;
mod timeout;

pub use clock::Clock;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub use clock_control::ClockControl;
pub use delay::Delay;
pub use future_ext::FutureExt;
pub use stopwatch::Stopwatch;
pub use timeout::{Elapsed, Timeout};
