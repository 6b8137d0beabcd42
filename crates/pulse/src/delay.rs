// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
#[cfg(any(feature = "test-util", test))]
use std::time::Instant;

use crate::Clock;
use crate::clock::ClockRepr;

/// Asynchronously delays for the specified duration.
///
/// For clocks backed by the operating system, the delay is driven by the Tokio timer and
/// must be awaited inside a Tokio runtime with time enabled. For controlled clocks, the
/// delay completes when the [`ClockControl`][crate::ClockControl] advances past its
/// deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use pulse::{Clock, Delay};
///
/// # async fn delay_example(clock: &Clock) {
/// let stopwatch = clock.stopwatch();
///
/// Delay::new(clock, Duration::from_millis(10)).await;
///
/// assert!(stopwatch.elapsed() >= Duration::from_millis(10));
/// # }
/// ```
#[derive(Debug)]
pub struct Delay(DelayRepr);

#[derive(Debug)]
enum DelayRepr {
    System(Pin<Box<tokio::time::Sleep>>),
    #[cfg(any(feature = "test-util", test))]
    Control(ControlDelay),
}

impl Delay {
    /// Creates a new delay that will complete after the specified duration.
    ///
    /// If the duration is [`Duration::ZERO`], the delay completes immediately.
    /// If the duration is [`Duration::MAX`], the delay never completes.
    ///
    /// > **Note**: Consider using [`Clock::delay()`] as a shortcut for creating delays.
    #[must_use]
    pub fn new(clock: &Clock, duration: Duration) -> Self {
        match &clock.0 {
            ClockRepr::System => Self(DelayRepr::System(Box::pin(tokio::time::sleep(duration)))),
            #[cfg(any(feature = "test-util", test))]
            ClockRepr::Control(control) => {
                let due = control.instant().checked_add(duration);
                Self(DelayRepr::Control(ControlDelay {
                    control: control.clone(),
                    due,
                    key: None,
                }))
            }
        }
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().0 {
            DelayRepr::System(sleep) => sleep.as_mut().poll(cx),
            #[cfg(any(feature = "test-util", test))]
            DelayRepr::Control(delay) => delay.poll_control(cx),
        }
    }
}

/// Delay against a controlled clock; completes when the control advances past `due`.
#[cfg(any(feature = "test-util", test))]
#[derive(Debug)]
struct ControlDelay {
    control: crate::ClockControl,
    // `None` means the deadline overflowed the instant range; the delay never completes.
    due: Option<Instant>,
    key: Option<u64>,
}

#[cfg(any(feature = "test-util", test))]
impl ControlDelay {
    fn poll_control(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(due) = self.due else {
            return Poll::Pending;
        };

        match self.key {
            Some(key) => {
                if self.control.is_elapsed(due) {
                    self.control.unregister_timer(key);
                    self.key = None;
                    Poll::Ready(())
                } else {
                    self.control.update_waker(key, cx.waker());
                    Poll::Pending
                }
            }
            None => match self.control.register_timer(due, cx.waker().clone()) {
                None => Poll::Ready(()),
                Some(key) => {
                    self.key = Some(key);
                    Poll::Pending
                }
            },
        }
    }
}

#[cfg(any(feature = "test-util", test))]
impl Drop for ControlDelay {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.control.unregister_timer(key);
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::task::Waker;

    use crate::ClockControl;

    use super::*;

    static_assertions::assert_impl_all!(Delay: Send, Sync, Unpin);

    #[test]
    fn control_delay_completes_after_advance() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut delay = Delay::new(&clock, Duration::from_millis(5));

        assert_eq!(poll_delay(&mut delay), Poll::Pending);
        assert_eq!(control.timers_len(), 1);

        control.advance(Duration::from_millis(5));

        assert_eq!(control.timers_len(), 0);
        assert_eq!(poll_delay(&mut delay), Poll::Ready(()));
    }

    #[test]
    fn zero_duration_is_immediately_ready() {
        let clock = Clock::new_frozen();
        let mut delay = Delay::new(&clock, Duration::ZERO);

        assert_eq!(poll_delay(&mut delay), Poll::Ready(()));
    }

    #[test]
    fn max_duration_never_completes() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut delay = Delay::new(&clock, Duration::MAX);

        assert_eq!(poll_delay(&mut delay), Poll::Pending);

        control.advance(Duration::from_secs(1_000_000));

        assert_eq!(poll_delay(&mut delay), Poll::Pending);
    }

    #[test]
    fn drop_unregisters_timer() {
        let control = ClockControl::new();
        let clock = control.to_clock();

        {
            let mut delay = Delay::new(&clock, Duration::from_secs(1));
            assert_eq!(poll_delay(&mut delay), Poll::Pending);
            assert_eq!(control.timers_len(), 1);
        }

        assert_eq!(control.timers_len(), 0);
    }

    #[tokio::test]
    async fn auto_advance_completes_without_real_waiting() {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        let before = clock.instant();

        clock.delay(Duration::from_secs(3600)).await;

        assert_eq!(clock.instant(), before + Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn system_delay_elapses() {
        let clock = Clock::new();
        let start = std::time::Instant::now();

        clock.delay(Duration::from_millis(15)).await;

        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    fn poll_delay(delay: &mut Delay) -> Poll<()> {
        let mut cx = Context::from_waker(Waker::noop());
        Pin::new(delay).poll(&mut cx)
    }
}
