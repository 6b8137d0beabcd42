// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Policy-driven retry engine for resilient remote calls.
//!
//! Remote services fail, and most of those failures are worth exactly one of two
//! reactions: try again after backing off, or stop immediately. This crate packages that
//! decision into a single engine: the caller supplies an operation and a
//! [`RetryPolicy`], and [`Redial`] runs the loop — invoke, classify, back off, retry —
//! emitting one structured event per attempt along the way.
//!
//! # Core Types
//!
//! - [`Redial`]: the execution engine; one configured instance serves any number of
//!   concurrent calls.
//! - [`RetryPolicy`]: immutable, validated configuration for attempts, elapsed-time
//!   bounds, backoff growth, jitter, and which failure kinds are retryable.
//! - [`Failure`] / [`FailureKind`] / [`Classifier`] (re-exported from `mishap`): the
//!   failure value an operation returns and the taxonomy it is classified into.
//! - [`AttemptRecord`] / [`EventSink`]: the per-attempt observability boundary.
//! - [`CallError`]: the terminal outcome of an unsuccessful call, distinguishing
//!   non-retryable failures, budget exhaustion, and cancellation.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use pulse::ClockControl;
//! use redial::{Failure, Redial, RetryPolicy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let runtime = tokio::runtime::Builder::new_current_thread().build()?;
//! # runtime.block_on(async {
//! // In tests, an auto-advancing clock makes backoff sleeps instantaneous.
//! let clock = ClockControl::new().auto_advance_timers(true).to_clock();
//!
//! let policy = RetryPolicy::builder()
//!     .max_attempts(4)
//!     .base_delay(Duration::from_millis(100))
//!     .build()?;
//!
//! let engine = Redial::new(&clock).policy(policy).name("describe_table");
//!
//! let mut remaining_failures = 2;
//! let result = engine
//!     .execute(|| {
//!         let fail = remaining_failures > 0;
//!         if fail {
//!             remaining_failures -= 1;
//!         }
//!         async move {
//!             if fail {
//!                 Err(Failure::msg("please slow down").code("ThrottlingException"))
//!             } else {
//!                 Ok("table description")
//!             }
//!         }
//!     })
//!     .await?;
//!
//! assert_eq!(result, "table description");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })?;
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Decisions
//!
//! After each failed attempt the engine classifies the [`Failure`] into a
//! [`FailureKind`] and then decides, in order:
//!
//! 1. Kind not in [`RetryPolicy::retryable_kinds`] → stop with
//!    [`CallError::NotRetryable`]. This is authoritative even when budget remains; by
//!    default only `Transient` and `Throttling` are retryable.
//! 2. Budget spent (attempts or elapsed time) → stop with [`CallError::Exhausted`].
//! 3. Otherwise sleep and go again. A server-provided retry-after hint within the
//!    policy's maximum delay takes precedence over computed backoff.
//!
//! # Timing and Tests
//!
//! All sleeps and elapsed-time measurements go through a [`pulse::Clock`], so tests drive
//! retry loops with a controlled clock instead of real sleeping. See
//! [`pulse::ClockControl`].
//!
//! ## Features
//!
//! - `logs`: structured logging of attempt transitions via `tracing`, switched on per
//!   engine with [`Redial::use_logs`].
//! - `serde`: serialization support for [`RetryPolicy`], [`Jitter`], and kind sets.

#[doc(inline)]
pub use mishap::{Classifier, Failure, FailureKind, KindSet};

mod backoff;
mod budget;
mod constants;
mod engine;
mod error;
mod events;
mod policy;
mod rnd;

pub use budget::RetryBudget;
pub use engine::Redial;
pub use error::CallError;
pub use events::{AttemptOutcome, AttemptRecord, EventSink};
pub use policy::{Jitter, PolicyError, RetryPolicy, RetryPolicyBuilder};
