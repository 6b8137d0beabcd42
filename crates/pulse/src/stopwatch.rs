// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, Instant};

use crate::Clock;

/// A stopwatch that facilitates the measurement of elapsed time.
///
/// An instance of `Stopwatch` is created by calling [`Clock::stopwatch()`] or by passing a
/// [`Clock`] to the [`Stopwatch::new()`] constructor. Elapsed time is read from the clock
/// the stopwatch was created from, so controlled clocks yield controlled measurements.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use pulse::Clock;
///
/// # fn measure(clock: &Clock) -> Duration {
/// let stopwatch = clock.stopwatch();
/// // Perform some operation...
/// stopwatch.elapsed()
/// # }
/// ```
#[derive(Debug)]
pub struct Stopwatch {
    clock: Clock,
    start: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch that starts measuring elapsed time now.
    ///
    /// > **Note**: Consider using [`Clock::stopwatch()`] as a shortcut.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            start: clock.instant(),
        }
    }

    /// Returns the elapsed time since the stopwatch was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.instant().saturating_duration_since(self.start)
    }
}
