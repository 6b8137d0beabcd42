// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error;
use std::io;

use crate::{Failure, FailureKind};

/// Built-in code table covering the representative remote-service error codes.
///
/// The table is intentionally not exhaustive: services keep inventing codes, and callers
/// extend the classifier for the ones they care about via [`Classifier::map_code`].
const BUILTIN: &[(&str, FailureKind)] = &[
    // Request-rate limiting, provisioned-throughput and quota exhaustion.
    ("Throttling", FailureKind::Throttling),
    ("ThrottlingException", FailureKind::Throttling),
    ("ThrottledException", FailureKind::Throttling),
    ("RequestThrottled", FailureKind::Throttling),
    ("RequestThrottledException", FailureKind::Throttling),
    ("TooManyRequestsException", FailureKind::Throttling),
    ("ProvisionedThroughputExceededException", FailureKind::Throttling),
    ("RequestLimitExceeded", FailureKind::Throttling),
    ("ServiceQuotaExceededException", FailureKind::Throttling),
    ("LimitExceededException", FailureKind::Throttling),
    ("SlowDown", FailureKind::Throttling),
    // Transient server-side conditions.
    ("InternalError", FailureKind::Transient),
    ("InternalFailure", FailureKind::Transient),
    ("InternalServiceError", FailureKind::Transient),
    ("ServiceUnavailable", FailureKind::Transient),
    ("ServiceUnavailableException", FailureKind::Transient),
    ("RequestTimeout", FailureKind::Transient),
    ("RequestTimeoutException", FailureKind::Transient),
    // Eventual consistency: a freshly created resource not yet visible to every endpoint.
    ("InvalidInstanceID.NotFound", FailureKind::Transient),
    ("InvalidSubnetID.NotFound", FailureKind::Transient),
    // The target object does not exist.
    ("ResourceNotFound", FailureKind::NotFound),
    ("ResourceNotFoundException", FailureKind::NotFound),
    ("NoSuchEntity", FailureKind::NotFound),
    ("NoSuchKey", FailureKind::NotFound),
    ("NoSuchBucket", FailureKind::NotFound),
    ("NotFoundException", FailureKind::NotFound),
    // Conflicting concurrent state changes.
    ("ConflictException", FailureKind::ResourceConflict),
    ("ResourceConflictException", FailureKind::ResourceConflict),
    ("ResourceAlreadyExistsException", FailureKind::ResourceConflict),
    ("EntityAlreadyExistsException", FailureKind::ResourceConflict),
    ("ResourceInUseException", FailureKind::ResourceConflict),
    ("ConcurrentModificationException", FailureKind::ResourceConflict),
    ("OperationAbortedException", FailureKind::ResourceConflict),
    // Malformed or invalid requests.
    ("ValidationException", FailureKind::InvalidInput),
    ("ValidationError", FailureKind::InvalidInput),
    ("InvalidParameterException", FailureKind::InvalidInput),
    ("InvalidParameterValue", FailureKind::InvalidInput),
    ("InvalidParameterCombination", FailureKind::InvalidInput),
    ("MissingParameterException", FailureKind::InvalidInput),
    ("MalformedPolicyDocumentException", FailureKind::InvalidInput),
    ("InvalidRequestException", FailureKind::InvalidInput),
    // Authorization failures.
    ("AccessDenied", FailureKind::PermissionDenied),
    ("AccessDeniedException", FailureKind::PermissionDenied),
    ("UnauthorizedOperation", FailureKind::PermissionDenied),
    ("NotAuthorizedException", FailureKind::PermissionDenied),
    ("MissingAuthenticationToken", FailureKind::PermissionDenied),
    ("UnrecognizedClientException", FailureKind::PermissionDenied),
    ("InvalidClientTokenId", FailureKind::PermissionDenied),
    ("ExpiredTokenException", FailureKind::PermissionDenied),
];

/// Maps failures to [`FailureKind`] values.
///
/// Classification is a pure function of the failure's error code and cause type, resolved
/// in this order:
///
/// 1. The error code, looked up in the classifier's table (exact match).
/// 2. The cause type: I/O errors whose kind indicates a transient network condition
///    classify as [`FailureKind::Transient`].
/// 3. [`FailureKind::Fatal`] — the unknown is never silently retried.
///
/// [`Classifier::new`] starts from the built-in table of representative remote-service
/// codes; [`Classifier::empty`] starts from nothing. Either way, entries can be added or
/// overridden with [`map_code`][Classifier::map_code].
///
/// # Examples
///
/// ```
/// use mishap::{Classifier, Failure, FailureKind};
///
/// let classifier = Classifier::new();
///
/// let failure = Failure::msg("no such table").code("ResourceNotFoundException");
/// assert_eq!(classifier.classify(&failure), FailureKind::NotFound);
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    table: HashMap<Cow<'static, str>, FailureKind>,
}

impl Classifier {
    /// Creates a classifier with the built-in code table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: BUILTIN.iter().map(|(code, kind)| (Cow::Borrowed(*code), *kind)).collect(),
        }
    }

    /// Creates a classifier with an empty code table.
    ///
    /// Useful when a caller wants full control over every mapping; without additions,
    /// every coded failure resolves through cause inspection or to
    /// [`FailureKind::Fatal`].
    #[must_use]
    pub fn empty() -> Self {
        Self { table: HashMap::new() }
    }

    /// Adds or overrides a code mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use mishap::{Classifier, Failure, FailureKind};
    ///
    /// // This service's conflicts are worth retrying.
    /// let classifier = Classifier::new().map_code("ConflictException", FailureKind::Transient);
    ///
    /// let failure = Failure::msg("busy").code("ConflictException");
    /// assert_eq!(classifier.classify(&failure), FailureKind::Transient);
    /// ```
    #[must_use]
    pub fn map_code(mut self, code: impl Into<Cow<'static, str>>, kind: FailureKind) -> Self {
        drop(self.table.insert(code.into(), kind));
        self
    }

    /// Classifies a failure.
    ///
    /// This is a total function: it returns a kind for every input and never panics.
    #[must_use]
    pub fn classify(&self, failure: &Failure) -> FailureKind {
        if let Some(code) = failure.get_code() {
            if let Some(kind) = self.table.get(code) {
                return *kind;
            }
        }

        classify_cause(failure.get_cause())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Falls back to inspecting the cause type when the code is absent or unrecognized.
fn classify_cause(cause: &(dyn Error + 'static)) -> FailureKind {
    if let Some(io_error) = cause.downcast_ref::<io::Error>() {
        if is_transient_io(io_error.kind()) {
            return FailureKind::Transient;
        }
    }

    FailureKind::Fatal
}

fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted
    )
}
