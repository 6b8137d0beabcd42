// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, Instant, SystemTime};

/// Provides an abstraction for time-related operations.
///
/// The clock is used for:
///
/// - Retrieving the current absolute time in UTC.
/// - Creating [`Stopwatch`][crate::Stopwatch] instances that simplify elapsed-time
///   measurements.
/// - Creating [`Delay`][crate::Delay] instances that suspend the current task.
///
/// # Clock construction
///
/// [`Clock::new`] creates a clock backed by the operating system. Delays created from a
/// system clock are driven by the Tokio timer and must be awaited inside a Tokio runtime
/// with time enabled.
///
/// In tests, construct a clock via [`ClockControl`][crate::ClockControl] (available with
/// the `test-util` feature) or [`Clock::new_frozen`] so the passage of time is controlled
/// manually.
///
/// # Cloning and shared state
///
/// Cloning a clock is inexpensive and every clone shares the same underlying time source.
/// For controlled clocks, time adjustments performed through one clone are visible to every
/// other clone.
///
/// # Examples
///
/// ```
/// use std::time::SystemTime;
///
/// use pulse::Clock;
///
/// # fn read_time(clock: &Clock) {
/// let time1: SystemTime = clock.system_time();
/// let time2: SystemTime = clock.system_time();
///
/// assert!(time2 >= time1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Clock(pub(crate) ClockRepr);

#[derive(Debug, Clone)]
pub(crate) enum ClockRepr {
    System,
    #[cfg(any(feature = "test-util", test))]
    Control(crate::ClockControl),
}

impl Clock {
    /// Creates a clock backed by the operating system.
    ///
    /// Delays created from this clock are driven by the Tokio timer and must be awaited
    /// within a Tokio runtime that has time enabled.
    #[must_use]
    pub fn new() -> Self {
        Self(ClockRepr::System)
    }

    /// Creates a new frozen clock.
    ///
    /// This is a convenience method equivalent to calling `ClockControl::new().to_clock()`.
    ///
    /// > **Note**: The returned clock will not advance time; all time and timers are frozen.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::thread::sleep;
    /// use std::time::Duration;
    ///
    /// use pulse::Clock;
    ///
    /// let clock = Clock::new_frozen();
    ///
    /// let system_time = clock.system_time();
    /// sleep(Duration::from_micros(1));
    ///
    /// assert_eq!(system_time, clock.system_time());
    /// ```
    #[cfg(any(feature = "test-util", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
    #[must_use]
    pub fn new_frozen() -> Self {
        crate::ClockControl::new().to_clock()
    }

    /// Creates a new frozen clock at the specified timestamp.
    #[cfg(any(feature = "test-util", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
    #[must_use]
    pub fn new_frozen_at(time: impl Into<SystemTime>) -> Self {
        crate::ClockControl::new_at(time).to_clock()
    }

    /// Retrieves the current system time as [`SystemTime`].
    ///
    /// > **Note**: The system time is not monotonic and can be affected by system clock
    /// > changes. For relative time measurements, use [`Stopwatch`][crate::Stopwatch].
    #[must_use]
    pub fn system_time(&self) -> SystemTime {
        match &self.0 {
            ClockRepr::System => SystemTime::now(),
            #[cfg(any(feature = "test-util", test))]
            ClockRepr::Control(control) => control.system_time(),
        }
    }

    /// Retrieves the current [`Instant`].
    ///
    /// An `Instant` represents a monotonic time point guaranteed to never decrease. Unlike
    /// [`system_time`][Self::system_time], it is not affected by system clock changes.
    ///
    /// > **Important**: When measuring elapsed time, use [`Instant::duration_since`] against
    /// > another instant read from the same clock rather than `Instant::elapsed`. The
    /// > `elapsed` method bypasses the clock and goes directly to system time, so it won't
    /// > respect controlled time in tests.
    #[must_use]
    pub fn instant(&self) -> Instant {
        match &self.0 {
            ClockRepr::System => Instant::now(),
            #[cfg(any(feature = "test-util", test))]
            ClockRepr::Control(control) => control.instant(),
        }
    }

    /// Creates a new [`Delay`][crate::Delay] that will complete after the specified duration.
    ///
    /// If the duration is [`Duration::ZERO`], the delay completes immediately.
    /// If the duration is [`Duration::MAX`], the delay never completes.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use pulse::Clock;
    ///
    /// # async fn delay_example(clock: &Clock) {
    /// let stopwatch = clock.stopwatch();
    ///
    /// clock.delay(Duration::from_millis(10)).await;
    ///
    /// assert!(stopwatch.elapsed() >= Duration::from_millis(10));
    /// # }
    /// ```
    #[must_use]
    pub fn delay(&self, duration: Duration) -> crate::Delay {
        crate::Delay::new(self, duration)
    }

    /// Creates a new [`Stopwatch`][crate::Stopwatch] that starts measuring elapsed time.
    #[must_use]
    pub fn stopwatch(&self) -> crate::Stopwatch {
        crate::Stopwatch::new(self)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Self> for Clock {
    fn as_ref(&self) -> &Self {
        self
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use crate::ClockControl;

    use super::*;

    static_assertions::assert_impl_all!(Clock: Debug, Send, Sync, Clone, AsRef<Clock>);

    #[test]
    fn system_clock_time_moves_forward() {
        let clock = Clock::new();
        let first = clock.system_time();
        let second = clock.system_time();
        assert!(second >= first);

        let instant1 = clock.instant();
        let instant2 = clock.instant();
        assert!(instant2 >= instant1);
    }

    #[test]
    fn controlled_clock_tracks_advances() {
        let control = ClockControl::new();
        let clock = control.to_clock();

        let now = clock.system_time();
        assert_eq!(now, control.system_time());

        control.advance(Duration::from_secs(10));

        assert_eq!(clock.system_time(), now.checked_add(Duration::from_secs(10)).unwrap());
    }

    #[test]
    fn frozen_clock_does_not_advance() {
        let clock = Clock::new_frozen();

        let time = clock.system_time();
        let instant = clock.instant();

        std::thread::sleep(Duration::from_micros(1));

        assert_eq!(time, clock.system_time());
        assert_eq!(instant, clock.instant());
    }

    #[test]
    fn frozen_at_uses_given_time() {
        let specific = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let clock = Clock::new_frozen_at(specific);

        assert_eq!(clock.system_time(), specific);
    }

    #[test]
    fn default_is_system_clock() {
        let clock = Clock::default();
        assert!(matches!(clock.0, ClockRepr::System));
    }

    #[test]
    fn as_ref_ok() {
        let clock = Clock::new_frozen();
        let _: &Clock = clock.as_ref();
    }
}
