// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

// Naming Convention for Get/Set:
//
// Setters use plain names (e.g. `code()`) and getters use the `get_` prefix
// (e.g. `get_code()`). Setters dominate at construction sites, so they get the short names;
// the `get_` prefix keeps the corresponding getters unambiguous.

/// A failed remote operation.
///
/// A `Failure` carries the opaque underlying cause together with the service-provided
/// metadata that matters for recovery decisions: an optional error code and an optional
/// retry-after hint. It is created by the operation that failed and consumed once by a
/// [`Classifier`][crate::Classifier].
///
/// The underlying cause is never masked: `Failure` implements [`std::error::Error`] and
/// exposes the cause through [`source`][Error::source] for diagnostics.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use mishap::Failure;
///
/// let failure = Failure::msg("too many requests")
///     .code("ThrottlingException")
///     .retry_after(Duration::from_secs(2));
///
/// assert_eq!(failure.get_code(), Some("ThrottlingException"));
/// assert_eq!(failure.get_retry_after(), Some(Duration::from_secs(2)));
/// ```
#[derive(Debug)]
pub struct Failure {
    cause: Box<dyn Error + Send + Sync>,
    code: Option<Cow<'static, str>>,
    retry_after: Option<Duration>,
}

impl Failure {
    /// Creates a failure from an underlying cause.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// use mishap::Failure;
    ///
    /// let cause = io::Error::new(io::ErrorKind::TimedOut, "connect timed out");
    /// let failure = Failure::new(cause);
    ///
    /// assert_eq!(failure.get_code(), None);
    /// ```
    #[must_use]
    pub fn new(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            cause: cause.into(),
            code: None,
            retry_after: None,
        }
    }

    /// Creates a failure from a plain message.
    ///
    /// This is a convenience for services and tests that only have a textual description
    /// of what went wrong.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Attaches the service-provided error code.
    ///
    /// The code is the primary input to classification; see
    /// [`Classifier::classify`][crate::Classifier::classify].
    #[must_use]
    pub fn code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        // See file-level "Naming Convention" comment for why this uses a plain name.
        self.code = Some(code.into());
        self
    }

    /// Attaches a retry-after hint suggested by the remote service.
    ///
    /// Resilience middleware gives such hints precedence over computed backoff when they
    /// are within its configured bounds.
    #[must_use]
    pub fn retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Returns the service-provided error code, if any.
    #[must_use]
    pub fn get_code(&self) -> Option<&str> {
        // See file-level "Naming Convention" comment for why this uses the `get_` prefix.
        self.code.as_deref()
    }

    /// Returns the retry-after hint, if any.
    #[must_use]
    pub fn get_retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Returns the underlying cause.
    #[must_use]
    pub fn get_cause(&self) -> &(dyn Error + 'static) {
        self.cause.as_ref()
    }

    /// Consumes the failure and returns the underlying cause.
    #[must_use]
    pub fn into_cause(self) -> Box<dyn Error + Send + Sync> {
        self.cause
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.cause),
            None => Display::fmt(&self.cause, f),
        }
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Cause used by [`Failure::msg`].
#[derive(Debug)]
struct MessageError(String);

impl Display for MessageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for MessageError {}
