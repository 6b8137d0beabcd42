// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use mishap::{Failure, FailureKind};

/// Terminal outcome of a call that did not succeed.
///
/// The two failure-carrying variants make "the error is not worth retrying" and "the
/// budget ran out" explicitly distinguishable, so callers can log and alert on them
/// differently. In both cases the original [`Failure`] — cause chain included — is
/// preserved and exposed through [`source`][std::error::Error::source].
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The final attempt's failure kind is not in the policy's retryable set.
    ///
    /// Non-retryable classifications are authoritative: the call stops even when attempts
    /// and time remain in the budget.
    #[error("attempt {attempts} failed with non-retryable {kind} failure")]
    NotRetryable {
        /// The failure returned by the final attempt.
        #[source]
        failure: Failure,
        /// The classification that stopped the call.
        kind: FailureKind,
        /// Total attempts made.
        attempts: u32,
        /// Time elapsed since the call started.
        elapsed: Duration,
    },

    /// Every allowed attempt failed with a retryable failure.
    #[error("retries exhausted after {attempts} attempt(s); last failure was {kind}")]
    Exhausted {
        /// The failure returned by the final attempt.
        #[source]
        failure: Failure,
        /// The classification of the final failure.
        kind: FailureKind,
        /// Total attempts made.
        attempts: u32,
        /// Time elapsed since the call started.
        elapsed: Duration,
    },

    /// The caller's cancellation signal fired during a backoff sleep.
    #[error("cancelled while backing off after {attempts} attempt(s)")]
    Cancelled {
        /// Total attempts made before cancellation.
        attempts: u32,
        /// Time elapsed since the call started.
        elapsed: Duration,
    },
}

impl CallError {
    /// Returns the total number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NotRetryable { attempts, .. } | Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Returns the time elapsed between the start of the call and its resolution.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::NotRetryable { elapsed, .. } | Self::Exhausted { elapsed, .. } | Self::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    /// Returns the final failure's classification, or `None` for a cancelled call.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::NotRetryable { kind, .. } | Self::Exhausted { kind, .. } => Some(*kind),
            Self::Cancelled { .. } => None,
        }
    }

    /// Returns the final failure, or `None` for a cancelled call.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::NotRetryable { failure, .. } | Self::Exhausted { failure, .. } => Some(failure),
            Self::Cancelled { .. } => None,
        }
    }

    /// Consumes the error and returns the final failure, or `None` for a cancelled call.
    #[must_use]
    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Self::NotRetryable { failure, .. } | Self::Exhausted { failure, .. } => Some(failure),
            Self::Cancelled { .. } => None,
        }
    }

    /// Returns whether the call ended because it was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
