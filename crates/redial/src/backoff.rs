// Copyright (c) Microsoft Corporation.

use std::cmp::min;
use std::time::Duration;

use crate::policy::{Jitter, RetryPolicy};
use crate::rnd::Rnd;

/// Computes the delay before each retry of one logical call.
///
/// The schedule is created per call and owns the state that the jitter modes need across
/// attempts (the previously chosen delay for decorrelated jitter). The policy itself stays
/// stateless.
#[derive(Debug)]
pub(crate) struct DelaySchedule {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: Jitter,
    rnd: Rnd,
    // Previously chosen delay, seeded with the base delay.
    previous: Duration,
}

impl DelaySchedule {
    pub fn new(policy: &RetryPolicy, rnd: Rnd) -> Self {
        Self {
            base_delay: policy.base_delay(),
            max_delay: policy.max_delay(),
            multiplier: policy.multiplier(),
            jitter: policy.jitter(),
            rnd,
            previous: policy.base_delay(),
        }
    }

    /// Returns the delay to wait after the failed attempt `attempt_index` (1-based).
    ///
    /// A server-provided `retry_after` hint takes precedence when it does not exceed the
    /// configured maximum delay; larger hints are ignored. Otherwise the delay is the
    /// capped exponential `base * multiplier^(attempt_index - 1)` with the policy's jitter
    /// mode applied. The result never exceeds the maximum delay.
    pub fn next_delay(&mut self, attempt_index: u32, retry_after: Option<Duration>) -> Duration {
        debug_assert!(attempt_index >= 1, "attempt indices are 1-based");

        if let Some(hint) = retry_after {
            if hint <= self.max_delay {
                self.previous = hint;
                return hint;
            }
        }

        // A zero base delay means immediate retries.
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let chosen = match self.jitter {
            Jitter::None => self.capped_exponential(attempt_index),
            Jitter::Full => scale(self.capped_exponential(attempt_index), self.rnd.next_f64()),
            Jitter::Decorrelated => {
                let upper = self.previous.saturating_mul(3).max(self.base_delay);
                min(uniform_between(self.base_delay, upper, &self.rnd), self.max_delay)
            }
        };

        self.previous = chosen;
        chosen
    }

    fn capped_exponential(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index.saturating_sub(1)).unwrap_or(i32::MAX);
        let grown = secs_to_duration_saturating(self.base_delay.as_secs_f64() * self.multiplier.powi(exponent));
        min(grown, self.max_delay)
    }
}

/// Scales a delay by a factor in `[0, 1)`.
fn scale(delay: Duration, factor: f64) -> Duration {
    secs_to_duration_saturating(delay.as_secs_f64() * factor)
}

fn uniform_between(lo: Duration, hi: Duration, rnd: &Rnd) -> Duration {
    let span = hi.saturating_sub(lo).as_secs_f64();
    secs_to_duration_saturating(span.mul_add(rnd.next_f64(), lo.as_secs_f64()))
}

fn secs_to_duration_saturating(secs: f64) -> Duration {
    if secs <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
