// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{Display, Formatter};

/// The classification of a [`Failure`][crate::Failure].
///
/// Exactly one kind applies to any failure. The enumeration is closed: resilience logic can
/// match on it exhaustively, and anything a [`Classifier`][crate::Classifier] cannot
/// recognize resolves to [`FailureKind::Fatal`] so that unknown conditions are never
/// silently retried.
///
/// # Examples
///
/// ```
/// use mishap::FailureKind;
///
/// assert_eq!(FailureKind::Throttling.to_string(), "throttling");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FailureKind {
    /// A temporary server-side or network condition that is expected to clear on its own,
    /// such as an internal service error or a resource that has not finished propagating.
    Transient,

    /// The service rejected the request to shed load: request-rate limiting, provisioned
    /// throughput exhaustion, or a service quota being hit.
    Throttling,

    /// A conflicting concurrent state change, such as a resource that already exists or is
    /// currently being modified or deleted.
    ResourceConflict,

    /// The target object does not exist.
    NotFound,

    /// The request itself is malformed: validation failures, missing required fields, or
    /// otherwise invalid parameters. Retrying the same request cannot succeed.
    InvalidInput,

    /// The caller is not authorized to perform the operation.
    PermissionDenied,

    /// An unrecognized or unrecoverable condition. This is the classification of last
    /// resort; the unknown is never retried.
    Fatal,
}

impl FailureKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Transient,
        Self::Throttling,
        Self::ResourceConflict,
        Self::NotFound,
        Self::InvalidInput,
        Self::PermissionDenied,
        Self::Fatal,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::Transient => 1 << 0,
            Self::Throttling => 1 << 1,
            Self::ResourceConflict => 1 << 2,
            Self::NotFound => 1 << 3,
            Self::InvalidInput => 1 << 4,
            Self::PermissionDenied => 1 << 5,
            Self::Fatal => 1 << 6,
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Throttling => write!(f, "throttling"),
            Self::ResourceConflict => write!(f, "resource-conflict"),
            Self::NotFound => write!(f, "not-found"),
            Self::InvalidInput => write!(f, "invalid-input"),
            Self::PermissionDenied => write!(f, "permission-denied"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// A set of [`FailureKind`] values.
///
/// The set is a plain bitmask, so it is `Copy` and usable in constants. Its most common use
/// is expressing which kinds a retry policy treats as retryable.
///
/// # Examples
///
/// ```
/// use mishap::{FailureKind, KindSet};
///
/// const RETRYABLE: KindSet = KindSet::empty()
///     .with(FailureKind::Transient)
///     .with(FailureKind::Throttling);
///
/// assert!(RETRYABLE.contains(FailureKind::Throttling));
/// assert!(!RETRYABLE.contains(FailureKind::NotFound));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u8);

impl KindSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a set containing every kind.
    #[must_use]
    pub const fn all() -> Self {
        let mut set = Self::empty();
        let mut i = 0;
        while i < FailureKind::ALL.len() {
            set = set.with(FailureKind::ALL[i]);
            i += 1;
        }
        set
    }

    /// Returns this set with `kind` added.
    #[must_use]
    pub const fn with(self, kind: FailureKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Returns this set with `kind` removed.
    #[must_use]
    pub const fn without(self, kind: FailureKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    /// Returns whether `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: FailureKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of kinds in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Adds `kind` to the set.
    pub fn insert(&mut self, kind: FailureKind) {
        *self = self.with(kind);
    }

    /// Removes `kind` from the set.
    pub fn remove(&mut self, kind: FailureKind) {
        *self = self.without(kind);
    }

    /// Iterates over the kinds in the set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = FailureKind> {
        FailureKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl std::fmt::Debug for KindSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<FailureKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = FailureKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for KindSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for KindSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kinds = Vec::<FailureKind>::deserialize(deserializer)?;
        Ok(kinds.into_iter().collect())
    }
}
