// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Failure values and classification for resilience patterns.
//!
//! # Why
//!
//! Remote services fail in ways that call for very different reactions: a throttled request
//! should be retried after backing off, a validation error should be surfaced immediately,
//! and an unrecognized error should never be retried blindly. This crate provides a single
//! failure value and a closed taxonomy of failure kinds so that resilience middleware can
//! make that decision consistently, regardless of which service produced the error.
//!
//! # Core Types
//!
//! - [`Failure`]: an opaque underlying cause plus the service-provided metadata that matters
//!   for recovery decisions (an error code and an optional retry-after hint).
//! - [`FailureKind`]: the closed classification a failure resolves to.
//! - [`KindSet`]: a compact set of kinds, used to express which kinds are retryable.
//! - [`Classifier`]: maps failures to kinds through an extensible code table, defaulting to
//!   [`FailureKind::Fatal`] for anything it does not recognize.
//!
//! # Examples
//!
//! ```
//! use mishap::{Classifier, Failure, FailureKind};
//!
//! let classifier = Classifier::new();
//!
//! let throttled = Failure::msg("rate exceeded").code("ThrottlingException");
//! assert_eq!(classifier.classify(&throttled), FailureKind::Throttling);
//!
//! // Unknown codes are never retried blindly.
//! let unknown = Failure::msg("what is this").code("SomethingNovel");
//! assert_eq!(classifier.classify(&unknown), FailureKind::Fatal);
//! ```
//!
//! Callers extend the table when a service uses codes the built-in table does not know:
//!
//! ```
//! use mishap::{Classifier, Failure, FailureKind};
//!
//! let classifier = Classifier::new().map_code("ReplicaLagging", FailureKind::Transient);
//!
//! let lagging = Failure::msg("replica not caught up").code("ReplicaLagging");
//! assert_eq!(classifier.classify(&lagging), FailureKind::Transient);
//! ```

mod classifier;
mod failure;
mod kind;

pub use classifier::Classifier;
pub use failure::Failure;
pub use kind::{FailureKind, KindSet};
