// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime};

use mishap::FailureKind;

/// How a single attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    /// The attempt failed with a retryable failure; another attempt follows after the
    /// recorded delay.
    Retried,

    /// The attempt succeeded. Terminal.
    Succeeded,

    /// The attempt failed with a non-retryable failure. Terminal.
    Rejected,

    /// The attempt failed and the retry budget is spent. Terminal.
    Exhausted,

    /// The call was cancelled while backing off after this attempt. Terminal.
    Cancelled,
}

impl Display for AttemptOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retried => write!(f, "retried"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Rejected => write!(f, "rejected"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A structured record of one attempt of a call.
///
/// Records are ephemeral: the engine creates one per attempt, hands it to the
/// [`EventSink`], and discards it. A cancelled backoff produces one additional terminal
/// record for the attempt it interrupted.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    index: u32,
    kind: Option<FailureKind>,
    delay: Option<Duration>,
    at: SystemTime,
    outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub(crate) fn new(
        index: u32,
        kind: Option<FailureKind>,
        delay: Option<Duration>,
        at: SystemTime,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            index,
            kind,
            delay,
            at,
            outcome,
        }
    }

    /// Returns the attempt index (1-based; attempt 1 is the initial try).
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the classification of the attempt's failure, or `None` if it succeeded.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        self.kind
    }

    /// Returns the delay chosen before the next attempt, or `None` if no attempt follows.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Returns when the record was created, on the engine's clock.
    #[must_use]
    pub fn at(&self) -> SystemTime {
        self.at
    }

    /// Returns how the attempt resolved.
    #[must_use]
    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }

    /// Returns whether this record ends the call.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.outcome != AttemptOutcome::Retried
    }
}

/// Receives one [`AttemptRecord`] per attempt of a call, including the terminal one.
///
/// The sink is an observability boundary: it cannot influence the retry decision, and the
/// engine does not serialize calls to it, so a sink shared across concurrent calls must
/// tolerate concurrent invocation (hence `Send + Sync`). Implementations must not panic.
///
/// Any `Fn(&AttemptRecord) + Send + Sync` closure is a sink:
///
/// ```
/// use redial::{AttemptRecord, EventSink};
///
/// let sink = |record: &AttemptRecord| {
///     println!("attempt {} {}", record.index(), record.outcome());
/// };
/// # fn takes_sink(_sink: impl EventSink) {}
/// # takes_sink(sink);
/// ```
pub trait EventSink: Send + Sync {
    /// Called once per attempt record.
    fn on_attempt(&self, record: &AttemptRecord);
}

impl<F> EventSink for F
where
    F: Fn(&AttemptRecord) + Send + Sync,
{
    fn on_attempt(&self, record: &AttemptRecord) {
        self(record);
    }
}
