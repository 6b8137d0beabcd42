// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is a test module")]

//! Integration tests for the retry engine using only the public API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pulse::{Clock, ClockControl};
use redial::{
    AttemptOutcome, AttemptRecord, CallError, Classifier, EventSink, Failure, FailureKind, Jitter, KindSet, Redial,
    RetryPolicy,
};

fn auto_clock() -> Clock {
    ClockControl::new().auto_advance_timers(true).to_clock()
}

fn recording_sink() -> (Arc<Mutex<Vec<AttemptRecord>>>, impl EventSink + 'static) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink_records = Arc::clone(&records);
    let sink = move |record: &AttemptRecord| sink_records.lock().unwrap().push(record.clone());
    (records, sink)
}

fn outcomes(records: &Mutex<Vec<AttemptRecord>>) -> Vec<AttemptOutcome> {
    records.lock().unwrap().iter().map(AttemptRecord::outcome).collect()
}

#[tokio::test]
async fn success_on_first_try_makes_one_attempt() {
    let (records, sink) = recording_sink();
    let engine = Redial::new(&auto_clock()).event_sink(sink);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = engine
        .execute(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Failure>(42) }
        })
        .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes(&records), vec![AttemptOutcome::Succeeded]);
}

#[tokio::test]
async fn transient_failure_then_success() {
    let (records, sink) = recording_sink();
    let engine = Redial::new(&auto_clock()).event_sink(sink);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = engine
        .execute(move || {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(Failure::msg("hiccup").code("InternalError"))
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcomes(&records), vec![AttemptOutcome::Retried, AttemptOutcome::Succeeded]);
}

#[tokio::test]
async fn throttling_exhausts_budget() {
    let clock = auto_clock();
    let policy = RetryPolicy::builder().max_attempts(3).jitter(Jitter::None).build().unwrap();
    let engine = Redial::new(&clock).policy(policy);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let error = engine
        .execute(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Failure::msg("rate exceeded").code("ThrottlingException")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let CallError::Exhausted { kind, attempts, elapsed, .. } = error else {
        panic!("expected Exhausted, got {error:?}");
    };
    assert_eq!(kind, FailureKind::Throttling);
    assert_eq!(attempts, 3);
    // Two backoff sleeps of 100ms and 200ms passed on the controlled clock.
    assert_eq!(elapsed, Duration::from_millis(300));
}

#[tokio::test]
async fn invalid_input_fails_fast_despite_budget() {
    let policy = RetryPolicy::builder().max_attempts(10).build().unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let error = engine
        .execute(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Failure::msg("missing field").code("ValidationException")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        error,
        CallError::NotRetryable {
            kind: FailureKind::InvalidInput,
            attempts: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn empty_retryable_kinds_never_retries() {
    let policy = RetryPolicy::builder()
        .max_attempts(10)
        .retryable_kinds(KindSet::empty())
        .build()
        .unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let error = engine
        .execute(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Failure::msg("hiccup").code("InternalError")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(error, CallError::NotRetryable { attempts: 1, .. }));
}

#[tokio::test]
async fn unknown_code_is_fatal_and_not_retried() {
    let engine = Redial::new(&auto_clock());

    let error = engine
        .execute(|| async { Err::<(), _>(Failure::msg("novel").code("NeverSeenBefore")) })
        .await
        .unwrap_err();

    assert_eq!(error.kind(), Some(FailureKind::Fatal));
    assert_eq!(error.attempts(), 1);
}

#[tokio::test]
async fn custom_classifier_extends_the_table() {
    let classifier = Classifier::new().map_code("ReplicaLagging", FailureKind::Transient);
    let engine = Redial::new(&auto_clock()).classifier(classifier);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = engine
        .execute(move || {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(Failure::msg("replica catching up").code("ReplicaLagging"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delays_follow_exponential_backoff() {
    let (records, sink) = recording_sink();
    let policy = RetryPolicy::builder().max_attempts(4).jitter(Jitter::None).build().unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy).event_sink(sink);

    let _error = engine
        .execute(|| async { Err::<(), _>(Failure::msg("hiccup").code("InternalError")) })
        .await
        .unwrap_err();

    let delays: Vec<_> = records.lock().unwrap().iter().map(AttemptRecord::delay).collect();
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(100)),
            Some(Duration::from_millis(200)),
            Some(Duration::from_millis(400)),
            None,
        ]
    );
}

#[tokio::test]
async fn retry_after_hint_takes_precedence() {
    let (records, sink) = recording_sink();
    let engine = Redial::new(&auto_clock()).event_sink(sink);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = engine
        .execute(move || {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(Failure::msg("slow down")
                        .code("ThrottlingException")
                        .retry_after(Duration::from_secs(5)))
                } else {
                    Ok(())
                }
            }
        })
        .await;

    assert!(result.is_ok());
    // The server's hint is used verbatim, bypassing jitter.
    assert_eq!(records.lock().unwrap()[0].delay(), Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn oversized_hint_falls_back_to_computed_backoff() {
    let (records, sink) = recording_sink();
    let policy = RetryPolicy::builder()
        .max_delay(Duration::from_secs(1))
        .jitter(Jitter::None)
        .build()
        .unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy).event_sink(sink);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = engine
        .execute(move || {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(Failure::msg("slow down")
                        .code("ThrottlingException")
                        .retry_after(Duration::from_secs(600)))
                } else {
                    Ok(())
                }
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(records.lock().unwrap()[0].delay(), Some(Duration::from_millis(100)));
}

#[tokio::test]
async fn already_fired_cancellation_stops_during_first_backoff() {
    let (records, sink) = recording_sink();
    let engine = Redial::new(&auto_clock()).event_sink(sink);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let error = engine
        .execute_until(
            move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Failure::msg("hiccup").code("InternalError")) }
            },
            std::future::ready(()),
        )
        .await
        .unwrap_err();

    // The operation is never invoked again after cancellation.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(error.is_cancelled());
    assert_eq!(error.attempts(), 1);
    assert_eq!(
        outcomes(&records),
        vec![AttemptOutcome::Retried, AttemptOutcome::Cancelled]
    );
}

#[tokio::test]
async fn deadline_cancels_backoff_sleep() {
    let clock = auto_clock();
    let policy = RetryPolicy::builder()
        .base_delay(Duration::from_millis(200))
        .jitter(Jitter::None)
        .build()
        .unwrap();
    let engine = Redial::new(&clock).policy(policy);

    // A deadline is just a delay on the same clock passed as the cancellation signal.
    let error = engine
        .execute_until(
            || async { Err::<(), _>(Failure::msg("hiccup").code("InternalError")) },
            clock.delay(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(error.is_cancelled());
    assert_eq!(error.attempts(), 1);
    assert_eq!(error.elapsed(), Duration::from_millis(50));
}

#[tokio::test]
async fn max_elapsed_bounds_the_loop() {
    let policy = RetryPolicy::builder()
        .max_attempts(100)
        .max_elapsed(Duration::from_millis(2500))
        .base_delay(Duration::from_secs(1))
        .jitter(Jitter::None)
        .build()
        .unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let error = engine
        .execute(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Failure::msg("hiccup").code("InternalError")) }
        })
        .await
        .unwrap_err();

    // Sleeps of 1s and 2s put the third failure past the 2.5s bound.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(error, CallError::Exhausted { attempts: 3, .. }));
    assert_eq!(error.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let engine = Redial::new(&auto_clock());

    let calls = Arc::new(AtomicU32::new(0));
    let first_calls = Arc::clone(&calls);
    let second_calls = Arc::clone(&calls);

    let first = engine.execute(move || {
        let call = first_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call == 0 {
                Err(Failure::msg("hiccup").code("InternalError"))
            } else {
                Ok("first")
            }
        }
    });

    let second = engine.execute(move || {
        second_calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, Failure>("second") }
    });

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), "first");
    assert_eq!(second.unwrap(), "second");
}

#[tokio::test]
async fn terminal_failure_preserves_cause() {
    let engine = Redial::new(&auto_clock());

    let error = engine
        .execute(|| async {
            let cause = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no credentials");
            Err::<(), _>(Failure::new(cause).code("AccessDeniedException"))
        })
        .await
        .unwrap_err();

    let failure = error.failure().expect("failure must be attached");
    assert!(failure.get_cause().downcast_ref::<std::io::Error>().is_some());
    assert_eq!(error.kind(), Some(FailureKind::PermissionDenied));
}

#[tokio::test]
async fn records_carry_indexes_and_terminal_flags() {
    let (records, sink) = recording_sink();
    let policy = RetryPolicy::builder().max_attempts(2).jitter(Jitter::None).build().unwrap();
    let engine = Redial::new(&auto_clock()).policy(policy).event_sink(sink);

    let _error = engine
        .execute(|| async { Err::<(), _>(Failure::msg("rate exceeded").code("ThrottlingException")) })
        .await
        .unwrap_err();

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].index(), 1);
    assert_eq!(records[0].kind(), Some(FailureKind::Throttling));
    assert!(!records[0].is_terminal());

    assert_eq!(records[1].index(), 2);
    assert_eq!(records[1].outcome(), AttemptOutcome::Exhausted);
    assert!(records[1].is_terminal());
}
