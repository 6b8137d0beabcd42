// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::Waker;
use std::time::{Duration, Instant, SystemTime};

use crate::Clock;
use crate::clock::ClockRepr;

/// Controls the passage of time for clocks created from it.
///
/// `ClockControl` exists for tests: it produces clocks whose time only moves when
/// [`advance`][Self::advance] is called. Delays registered against a controlled clock fire
/// when the clock is advanced past their deadline.
///
/// With [`auto_advance_timers`][Self::auto_advance_timers] enabled, every delay immediately
/// jumps the clock forward to its own deadline, so sleep-heavy code completes instantly
/// while still observing consistent time.
///
/// All clones of a `ClockControl`, and all clocks created from it, share the same state.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use pulse::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// let before = clock.system_time();
/// control.advance(Duration::from_secs(30));
///
/// assert_eq!(clock.system_time(), before + Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClockControl {
    shared: Arc<ControlShared>,
}

#[derive(Debug)]
struct ControlShared {
    start_time: SystemTime,
    start_instant: Instant,
    inner: Mutex<ControlInner>,
}

#[derive(Debug)]
struct ControlInner {
    offset: Duration,
    auto_advance_timers: bool,
    next_key: u64,
    timers: BTreeMap<u64, Timer>,
}

#[derive(Debug)]
struct Timer {
    due: Instant,
    waker: Waker,
}

impl ClockControl {
    /// Creates a new control whose clocks start at the current system time.
    #[must_use]
    pub fn new() -> Self {
        Self::new_at(SystemTime::now())
    }

    /// Creates a new control whose clocks start at the specified timestamp.
    #[must_use]
    pub fn new_at(time: impl Into<SystemTime>) -> Self {
        Self {
            shared: Arc::new(ControlShared {
                start_time: time.into(),
                start_instant: Instant::now(),
                inner: Mutex::new(ControlInner {
                    offset: Duration::ZERO,
                    auto_advance_timers: false,
                    next_key: 0,
                    timers: BTreeMap::new(),
                }),
            }),
        }
    }

    /// Configures whether registering a timer automatically advances the clock to the
    /// timer's deadline.
    ///
    /// When enabled, a [`Delay`][crate::Delay] created from this control's clock completes
    /// on its first poll after jumping time forward, which is convenient for testing
    /// retry loops and other code that sleeps between steps.
    ///
    /// **Default**: disabled.
    #[must_use]
    pub fn auto_advance_timers(self, enabled: bool) -> Self {
        self.lock().auto_advance_timers = enabled;
        self
    }

    /// Creates a clock driven by this control.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock(ClockRepr::Control(self.clone()))
    }

    /// Advances the clock by the given duration, waking every timer whose deadline has
    /// been reached.
    pub fn advance(&self, duration: Duration) {
        let wakers = {
            let mut inner = self.lock();
            inner.offset = inner.offset.saturating_add(duration);
            let now = self.instant_at(inner.offset);
            take_due(&mut inner, now)
        };

        for waker in wakers {
            waker.wake();
        }
    }

    /// Advances the clock by the given number of milliseconds.
    ///
    /// This is a convenience method equivalent to calling [`advance`][Self::advance] with
    /// `Duration::from_millis(millis)`.
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Returns the current system time of clocks driven by this control.
    #[must_use]
    pub fn system_time(&self) -> SystemTime {
        let offset = self.lock().offset;
        self.shared.start_time.checked_add(offset).unwrap_or(self.shared.start_time)
    }

    /// Returns the current instant of clocks driven by this control.
    #[must_use]
    pub fn instant(&self) -> Instant {
        let offset = self.lock().offset;
        self.instant_at(offset)
    }

    /// Returns the number of currently registered timers.
    #[must_use]
    pub fn timers_len(&self) -> usize {
        self.lock().timers.len()
    }

    /// Registers a timer due at `due`.
    ///
    /// Returns `None` when the deadline has already been reached (possibly because the
    /// clock auto-advanced to it), in which case the caller is ready immediately.
    pub(crate) fn register_timer(&self, due: Instant, waker: Waker) -> Option<u64> {
        let (key, wakers) = {
            let mut inner = self.lock();
            let now = self.instant_at(inner.offset);

            if now >= due {
                return None;
            }

            if inner.auto_advance_timers {
                inner.offset = inner.offset.saturating_add(due.duration_since(now));
                let now = self.instant_at(inner.offset);
                (None, take_due(&mut inner, now))
            } else {
                let key = inner.next_key;
                inner.next_key = inner.next_key.wrapping_add(1);
                inner.timers.insert(key, Timer { due, waker });
                (Some(key), Vec::new())
            }
        };

        for waker in wakers {
            waker.wake();
        }

        key
    }

    pub(crate) fn update_waker(&self, key: u64, waker: &Waker) {
        if let Some(timer) = self.lock().timers.get_mut(&key) {
            timer.waker.clone_from(waker);
        }
    }

    pub(crate) fn unregister_timer(&self, key: u64) {
        drop(self.lock().timers.remove(&key));
    }

    pub(crate) fn is_elapsed(&self, due: Instant) -> bool {
        self.instant() >= due
    }

    fn instant_at(&self, offset: Duration) -> Instant {
        self.shared
            .start_instant
            .checked_add(offset)
            .unwrap_or(self.shared.start_instant)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControlInner> {
        // A poisoned lock means a panic elsewhere already sank the test; the state itself
        // is always left consistent.
        match self.shared.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ClockControl {
    fn default() -> Self {
        Self::new()
    }
}

fn take_due(inner: &mut ControlInner, now: Instant) -> Vec<Waker> {
    let due_keys: Vec<u64> = inner
        .timers
        .iter()
        .filter(|(_, timer)| timer.due <= now)
        .map(|(key, _)| *key)
        .collect();

    due_keys
        .into_iter()
        .filter_map(|key| inner.timers.remove(&key))
        .map(|timer| timer.waker)
        .collect()
}
