// Copyright (c) Microsoft Corporation.

use std::time::Duration;

use mishap::{FailureKind, KindSet};

use crate::Jitter;

/// Default maximum number of attempts: 3 (the initial try plus 2 retries).
///
/// Three attempts clear the vast majority of genuinely transient conditions without
/// keeping callers waiting through long failure sequences.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for backoff calculations: 100 milliseconds.
///
/// Short enough that a single blip barely adds latency, long enough that a struggling
/// service is not hammered immediately.
pub(crate) const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default cap on any single backoff delay: 20 seconds.
pub(crate) const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(20);

/// Default backoff multiplier: delays double between attempts.
pub(crate) const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Full jitter by default to desynchronize clients and reduce contention.
///
/// Randomizing retry delays mitigates correlated bursts when many callers fail at once.
/// See [Exponential Backoff and Jitter](https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter) for details.
pub(crate) const DEFAULT_JITTER: Jitter = Jitter::Full;

/// Default bound on the total duration of a call: unbounded.
///
/// Zero means the retry loop is limited by attempts only.
pub(crate) const DEFAULT_MAX_ELAPSED: Duration = Duration::ZERO;

/// Kinds retried by default: transient conditions and throttling.
///
/// Everything else — missing resources, invalid input, authorization failures, conflicts,
/// and the unrecognized — stops the call immediately unless a policy opts in explicitly.
pub(crate) const DEFAULT_RETRYABLE_KINDS: KindSet = KindSet::empty()
    .with(FailureKind::Transient)
    .with(FailureKind::Throttling);
