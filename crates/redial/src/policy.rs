// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use mishap::KindSet;

use crate::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_JITTER, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, DEFAULT_MAX_ELAPSED, DEFAULT_MULTIPLIER,
    DEFAULT_RETRYABLE_KINDS,
};

/// Defines how randomness is applied to computed backoff delays.
///
/// Jitter spreads retries from many clients over time, preventing the synchronized retry
/// storms that make a struggling service struggle harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Jitter {
    /// No randomization; the capped exponential delay is used as computed.
    ///
    /// **Example with `100ms` base delay:** `100ms, 200ms, 400ms, ...`
    None,

    /// A uniformly random delay in `[0, computed]`.
    ///
    /// Spreads retries across the whole backoff window; the recommended default.
    Full,

    /// A uniformly random delay in `[base, previous * 3]`, capped at the maximum delay.
    ///
    /// Grows from the previous delay rather than the attempt number, which keeps delays
    /// spread out while never collapsing back to zero.
    Decorrelated,
}

/// Immutable configuration for one logical remote call.
///
/// A policy bounds how many attempts are made (`max_attempts`), optionally how long the
/// whole call may take (`max_elapsed`), how the delay between attempts grows
/// (`base_delay`, `max_delay`, `multiplier`, `jitter`), and which
/// [`FailureKind`][mishap::FailureKind]s are worth retrying at all (`retryable_kinds`).
///
/// Policies are built with [`RetryPolicy::builder`], which validates its inputs; reading
/// any field back returns exactly the value supplied.
///
/// # Defaults
///
/// | Parameter | Default | Description |
/// |-----------|---------|-------------|
/// | `max_attempts` | `3` | Initial try plus 2 retries |
/// | `max_elapsed` | `0` (unbounded) | Bound on the whole retry loop |
/// | `base_delay` | `100ms` | Starting point for backoff growth |
/// | `max_delay` | `20s` | Cap on any single delay |
/// | `multiplier` | `2.0` | Growth factor between attempts |
/// | `jitter` | [`Jitter::Full`] | Randomization of computed delays |
/// | `retryable_kinds` | `{Transient, Throttling}` | Kinds that trigger a retry |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use redial::RetryPolicy;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(50))
///     .max_delay(Duration::from_secs(5))
///     .build()?;
///
/// assert_eq!(policy.max_attempts(), 5);
/// # Ok::<(), redial::PolicyError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct RetryPolicy {
    max_attempts: u32,
    max_elapsed: Duration,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: Jitter,
    retryable_kinds: KindSet,
}

impl RetryPolicy {
    /// Creates a builder initialized with the documented defaults.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Returns the maximum number of attempts, including the initial try.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the bound on the total duration of a call; zero means unbounded.
    #[must_use]
    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Returns the base delay used for backoff calculations.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Returns the cap applied to any single delay.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Returns the backoff growth factor.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns the jitter mode applied to computed delays.
    #[must_use]
    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Returns the set of failure kinds that trigger a retry.
    #[must_use]
    pub fn retryable_kinds(&self) -> KindSet {
        self.retryable_kinds
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_elapsed: DEFAULT_MAX_ELAPSED,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: DEFAULT_JITTER,
            retryable_kinds: DEFAULT_RETRYABLE_KINDS,
        }
    }
}

/// Builder for [`RetryPolicy`].
///
/// Created by [`RetryPolicy::builder`]. Every setter has a documented default, so only the
/// values that differ need to be specified. [`build`][Self::build] validates the
/// combination and rejects configurations that cannot express a sane retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: u32,
    max_elapsed: Duration,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: Jitter,
    retryable_kinds: KindSet,
}

impl RetryPolicyBuilder {
    /// Sets the maximum number of attempts, including the initial try.
    ///
    /// Attempt 1 is always the initial try, so `max_attempts(1)` disables retries
    /// entirely. Zero is rejected by [`build`][Self::build].
    ///
    /// **Default**: 3.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the bound on the total duration of a call.
    ///
    /// Once this much time has elapsed since the call started, no further retries are
    /// attempted. The bound applies to the whole loop, not to a single attempt, and is
    /// checked at decision points; it does not interrupt an attempt in flight.
    ///
    /// **Default**: zero (unbounded).
    #[must_use]
    pub fn max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Sets the base delay used for backoff calculations.
    ///
    /// A zero base delay means immediate retries.
    ///
    /// **Default**: 100 milliseconds.
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the cap applied to any single delay.
    ///
    /// Computed delays and server-provided retry-after hints never exceed this value;
    /// hints larger than the cap are ignored in favor of computed backoff.
    ///
    /// **Default**: 20 seconds.
    #[must_use]
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sets the backoff growth factor.
    ///
    /// The computed delay before retry `n` is `base_delay * multiplier^(n-1)`. Values
    /// of 1.0 or less (and non-finite values) are rejected by [`build`][Self::build].
    ///
    /// **Default**: 2.0.
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter mode applied to computed delays.
    ///
    /// **Default**: [`Jitter::Full`].
    #[must_use]
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the failure kinds that trigger a retry.
    ///
    /// Kinds outside this set terminate the call immediately, even when budget remains.
    /// An empty set means nothing is ever retried.
    ///
    /// **Default**: `{Transient, Throttling}`.
    #[must_use]
    pub fn retryable_kinds(mut self, kinds: KindSet) -> Self {
        self.retryable_kinds = kinds;
        self
    }

    /// Validates the configuration and builds the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NoAttempts`] when `max_attempts` is zero and
    /// [`PolicyError::Multiplier`] when the multiplier is not greater than 1.0.
    pub fn build(self) -> Result<RetryPolicy, PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }

        if !self.multiplier.is_finite() || self.multiplier <= 1.0 {
            return Err(PolicyError::Multiplier { value: self.multiplier });
        }

        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
            jitter: self.jitter,
            retryable_kinds: self.retryable_kinds,
        })
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_elapsed: DEFAULT_MAX_ELAPSED,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: DEFAULT_JITTER,
            retryable_kinds: DEFAULT_RETRYABLE_KINDS,
        }
    }
}

/// Error returned when a [`RetryPolicyBuilder`] is given an invalid configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// `max_attempts` was zero; attempt 1 is the initial try, so at least one attempt is
    /// required.
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    /// The multiplier was not greater than 1.0, so delays would not grow.
    #[error("multiplier must be greater than 1.0 (got {value})")]
    Multiplier {
        /// The rejected multiplier value.
        value: f64,
    },
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for RetryPolicy {
    /// Deserialization routes through the builder, so invalid configurations are rejected
    /// with the same errors as programmatic construction.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "kebab-case", default)]
        struct PolicyRepr {
            max_attempts: u32,
            max_elapsed: Duration,
            base_delay: Duration,
            max_delay: Duration,
            multiplier: f64,
            jitter: Jitter,
            retryable_kinds: KindSet,
        }

        impl Default for PolicyRepr {
            fn default() -> Self {
                Self {
                    max_attempts: DEFAULT_MAX_ATTEMPTS,
                    max_elapsed: DEFAULT_MAX_ELAPSED,
                    base_delay: DEFAULT_BASE_DELAY,
                    max_delay: DEFAULT_MAX_DELAY,
                    multiplier: DEFAULT_MULTIPLIER,
                    jitter: DEFAULT_JITTER,
                    retryable_kinds: DEFAULT_RETRYABLE_KINDS,
                }
            }
        }

        let repr = PolicyRepr::deserialize(deserializer)?;

        RetryPolicy::builder()
            .max_attempts(repr.max_attempts)
            .max_elapsed(repr.max_elapsed)
            .base_delay(repr.base_delay)
            .max_delay(repr.max_delay)
            .multiplier(repr.multiplier)
            .jitter(repr.jitter)
            .retryable_kinds(repr.retryable_kinds)
            .build()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use mishap::FailureKind;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(RetryPolicy: Debug, Clone, PartialEq, Send, Sync);
    assert_impl_all!(PolicyError: Debug, Clone, PartialEq, std::error::Error, Send, Sync);

    #[test]
    fn default_policy_matches_documented_defaults() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.max_elapsed(), Duration::ZERO);
        assert_eq!(policy.base_delay(), Duration::from_millis(100));
        assert_eq!(policy.max_delay(), Duration::from_secs(20));
        assert!((policy.multiplier() - 2.0).abs() < f64::EPSILON);
        assert_eq!(policy.jitter(), Jitter::Full);
        assert!(policy.retryable_kinds().contains(FailureKind::Transient));
        assert!(policy.retryable_kinds().contains(FailureKind::Throttling));
        assert_eq!(policy.retryable_kinds().len(), 2);
    }

    #[test]
    fn builder_round_trips_every_field() {
        let kinds = KindSet::empty().with(FailureKind::Throttling).with(FailureKind::NotFound);

        let policy = RetryPolicy::builder()
            .max_attempts(7)
            .max_elapsed(Duration::from_secs(90))
            .base_delay(Duration::from_millis(250))
            .max_delay(Duration::from_secs(10))
            .multiplier(1.5)
            .jitter(Jitter::Decorrelated)
            .retryable_kinds(kinds)
            .build()
            .unwrap();

        assert_eq!(policy.max_attempts(), 7);
        assert_eq!(policy.max_elapsed(), Duration::from_secs(90));
        assert_eq!(policy.base_delay(), Duration::from_millis(250));
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
        assert!((policy.multiplier() - 1.5).abs() < f64::EPSILON);
        assert_eq!(policy.jitter(), Jitter::Decorrelated);
        assert_eq!(policy.retryable_kinds(), kinds);
    }

    #[test]
    fn zero_attempts_rejected() {
        let result = RetryPolicy::builder().max_attempts(0).build();
        assert_eq!(result.unwrap_err(), PolicyError::NoAttempts);
    }

    #[rstest::rstest]
    #[case(1.0)]
    #[case(0.5)]
    #[case(0.0)]
    #[case(-2.0)]
    fn multiplier_of_one_or_less_rejected(#[case] value: f64) {
        let result = RetryPolicy::builder().multiplier(value).build();
        assert_eq!(result.unwrap_err(), PolicyError::Multiplier { value });
    }

    #[test]
    fn non_finite_multiplier_rejected() {
        let result = RetryPolicy::builder().multiplier(f64::NAN).build();
        assert!(matches!(result.unwrap_err(), PolicyError::Multiplier { .. }));
    }

    #[test]
    fn error_display_is_actionable() {
        assert_eq!(PolicyError::NoAttempts.to_string(), "max_attempts must be at least 1");
        assert_eq!(
            PolicyError::Multiplier { value: 1.0 }.to_string(),
            "multiplier must be greater than 1.0 (got 1)"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .base_delay(Duration::from_millis(200))
            .build()
            .unwrap();

        let json = serde_json::to_string(&policy).unwrap();
        let back: RetryPolicy = serde_json::from_str(&json).unwrap();

        assert_eq!(back, policy);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_invalid_policy() {
        let json = r#"{"max-attempts": 0}"#;
        let result: Result<RetryPolicy, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_missing_fields_use_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }
}
