// Copyright (c) Microsoft Corporation.

use std::time::Duration;

use crate::{Clock, Delay, Timeout};

/// Extensions for the [`Future`] trait.
pub trait FutureExt: Future {
    /// Applies a deadline to the future.
    ///
    /// This extension uses a [`Clock`] to control the flow of time and enables easy
    /// testability.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use pulse::{Clock, Delay, FutureExt};
    ///
    /// # async fn timeout_example(clock: &Clock) {
    /// // Create a long-running future
    /// let future = Delay::new(&clock, Duration::from_millis(700));
    ///
    /// // Apply a deadline to the future and await it
    /// let timeout_error = future
    ///     .timeout(Duration::from_millis(200), &clock)
    ///     .await
    ///     .unwrap_err();
    ///
    /// assert_eq!(timeout_error.to_string(), "deadline elapsed");
    /// # }
    /// ```
    fn timeout(self, timeout: Duration, clock: &Clock) -> Timeout<Self>
    where
        Self: Sized,
    {
        Timeout::new(self, Delay::new(clock, timeout))
    }
}

impl<T> FutureExt for T where T: Future {}
