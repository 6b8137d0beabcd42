// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Debug;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use mishap::{Classifier, Failure, FailureKind};
use pulse::{Clock, FutureExt};

use crate::backoff::DelaySchedule;
use crate::budget::RetryBudget;
use crate::error::CallError;
use crate::events::{AttemptOutcome, AttemptRecord, EventSink};
use crate::policy::RetryPolicy;
use crate::rnd::Rnd;

const DEFAULT_ENGINE_NAME: &str = "default";

/// Executes remote operations under a retry policy.
///
/// `Redial` orchestrates one logical call: invoke the operation, classify its failure,
/// consult the budget and backoff schedule, sleep or stop, and repeat until the call
/// succeeds, the budget is spent, or the failure is not worth retrying. One record per
/// attempt is handed to the configured [`EventSink`].
///
/// An engine is configured once and then shared: [`execute`][Self::execute] takes `&self`,
/// and concurrent calls are fully independent — each gets its own budget and backoff
/// state.
///
/// The operation is a plain `FnMut` closure returning a future, invoked once per attempt.
/// The engine never inspects the operation and assumes at-least-once semantics; operations
/// with side effects are the caller's responsibility to make idempotent.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use pulse::Clock;
/// use redial::{Failure, Redial, RetryPolicy};
///
/// # async fn example(clock: &Clock) -> Result<(), redial::CallError> {
/// let policy = RetryPolicy::builder()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(50))
///     .build()
///     .expect("valid policy");
///
/// let engine = Redial::new(clock).policy(policy).name("catalog_lookup");
///
/// let value = engine
///     .execute(|| async { Ok::<_, Failure>("response".to_string()) })
///     .await?;
///
/// assert_eq!(value, "response");
/// # Ok(())
/// # }
/// ```
///
/// # Cancellation
///
/// [`execute_until`][Self::execute_until] accepts any `Future<Output = ()>` as a
/// cancellation signal. The backoff sleep is the cancellation point: a signal that fires
/// during the sleep resolves the call to [`CallError::Cancelled`] without invoking the
/// operation again. An attempt already in flight is not interrupted.
pub struct Redial {
    clock: Clock,
    policy: RetryPolicy,
    classifier: Classifier,
    sink: Option<Arc<dyn EventSink>>,
    rnd: Rnd,
    name: Cow<'static, str>,
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
}

impl Redial {
    /// Creates an engine with the default policy and classifier.
    ///
    /// The clock drives backoff sleeps and elapsed-time tracking; pass a controlled clock
    /// in tests to make retry timing instantaneous and deterministic.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            policy: RetryPolicy::default(),
            classifier: Classifier::new(),
            sink: None,
            rnd: Rnd::default(),
            name: Cow::Borrowed(DEFAULT_ENGINE_NAME),
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
        }
    }

    /// Sets the retry policy.
    ///
    /// **Default**: [`RetryPolicy::default`].
    #[must_use]
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the failure classifier.
    ///
    /// **Default**: [`Classifier::new`], the built-in code table.
    #[must_use]
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the sink that receives one [`AttemptRecord`] per attempt.
    ///
    /// **Default**: no sink.
    #[must_use]
    pub fn event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets the engine name used in telemetry. Prefer `snake_case`.
    ///
    /// **Default**: `"default"`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables structured logging of attempt transitions via `tracing`.
    ///
    /// **Default**: disabled.
    #[cfg(any(feature = "logs", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
    #[must_use]
    pub fn use_logs(mut self) -> Self {
        self.logs_enabled = true;
        self
    }

    /// Executes an operation until it succeeds, the budget is spent, or its failure is
    /// classified as non-retryable.
    ///
    /// This is the no-cancellation convenience over
    /// [`execute_until`][Self::execute_until].
    ///
    /// # Errors
    ///
    /// Returns [`CallError::NotRetryable`] or [`CallError::Exhausted`]; see
    /// [`execute_until`][Self::execute_until].
    pub async fn execute<T, Op, Fut>(&self, operation: Op) -> Result<T, CallError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.execute_until(operation, std::future::pending()).await
    }

    /// Executes an operation, resolving to [`CallError::Cancelled`] if `cancel` completes
    /// during a backoff sleep.
    ///
    /// A deadline is expressed by passing `clock.delay(remaining)` as the signal.
    ///
    /// # Errors
    ///
    /// - [`CallError::NotRetryable`] when an attempt fails with a kind outside the
    ///   policy's retryable set. This is authoritative: the call stops even with budget
    ///   remaining.
    /// - [`CallError::Exhausted`] when an attempt fails retryably but the budget allows no
    ///   further attempt.
    /// - [`CallError::Cancelled`] when the cancellation signal fires during a backoff
    ///   sleep. The operation is not invoked again.
    pub async fn execute_until<T, Op, Fut, C>(&self, mut operation: Op, cancel: C) -> Result<T, CallError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        C: Future<Output = ()>,
    {
        let mut cancel = pin!(cancel);
        let mut budget = RetryBudget::new(&self.policy, self.clock.stopwatch());
        let mut schedule = DelaySchedule::new(&self.policy, self.rnd.clone());

        loop {
            let attempt = budget.attempts_used().saturating_add(1);
            let result = operation().await;
            budget.record_attempt();

            let failure = match result {
                Ok(value) => {
                    self.emit(attempt, None, None, AttemptOutcome::Succeeded);
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let kind = self.classifier.classify(&failure);

            if !self.policy.retryable_kinds().contains(kind) {
                self.emit(attempt, Some(kind), None, AttemptOutcome::Rejected);
                return Err(CallError::NotRetryable {
                    failure,
                    kind,
                    attempts: attempt,
                    elapsed: budget.elapsed(),
                });
            }

            if !budget.can_retry() {
                self.emit(attempt, Some(kind), None, AttemptOutcome::Exhausted);
                return Err(CallError::Exhausted {
                    failure,
                    kind,
                    attempts: attempt,
                    elapsed: budget.elapsed(),
                });
            }

            let delay = schedule.next_delay(attempt, failure.get_retry_after());
            self.emit(attempt, Some(kind), Some(delay), AttemptOutcome::Retried);

            // The backoff sleep is the only cancellation point: the caller's signal
            // winning the race resolves the call without invoking the operation again.
            if cancel.as_mut().timeout(delay, &self.clock).await.is_ok() {
                self.emit(attempt, Some(kind), None, AttemptOutcome::Cancelled);
                return Err(CallError::Cancelled {
                    attempts: attempt,
                    elapsed: budget.elapsed(),
                });
            }
        }
    }

    fn emit(&self, index: u32, kind: Option<FailureKind>, delay: Option<Duration>, outcome: AttemptOutcome) {
        let record = AttemptRecord::new(index, kind, delay, self.clock.system_time(), outcome);

        self.log(&record);

        if let Some(sink) = &self.sink {
            sink.on_attempt(&record);
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn log(&self, record: &AttemptRecord) {
        if !self.logs_enabled {
            return;
        }

        tracing::event!(
            name: "redial.attempt",
            tracing::Level::WARN,
            engine.name = %self.name,
            attempt.index = record.index(),
            attempt.outcome = %record.outcome(),
            failure.kind = ?record.kind(),
            retry.delay = record.delay().unwrap_or(Duration::ZERO).as_secs_f32(),
        );
    }

    #[cfg(not(any(feature = "logs", test)))]
    #[expect(clippy::unused_self, reason = "mirrors the logging variant's signature")]
    fn log(&self, _record: &AttemptRecord) {}
}

impl Debug for Redial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redial")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
