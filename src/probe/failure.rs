//! Failure taxonomy for probes.

use crate::driver::DriverError;
use std::fmt;
use thiserror::Error;

/// Why a sample could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// The resource could not be reached or refused authentication.
    #[error("resource unreachable: {0}")]
    Connectivity(String),

    /// A handle that used to work now points at a closed link.
    #[error("connection is closed: {0}")]
    StaleHandle(String),

    /// The resource is reachable but the operation itself failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Anything else.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Discriminant of [`ProbeFailure`], without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`ProbeFailure::Connectivity`].
    Connectivity,
    /// See [`ProbeFailure::StaleHandle`].
    StaleHandle,
    /// See [`ProbeFailure::Query`].
    Query,
    /// See [`ProbeFailure::Unexpected`].
    Unexpected,
}

impl ProbeFailure {
    /// The failure's kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeFailure::Connectivity(_) => FailureKind::Connectivity,
            ProbeFailure::StaleHandle(_) => FailureKind::StaleHandle,
            ProbeFailure::Query(_) => FailureKind::Query,
            ProbeFailure::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    /// Whether the connection handle must be discarded after this failure.
    pub fn invalidates_handle(&self) -> bool {
        self.kind().invalidates_handle()
    }

    /// Maps an error raised while opening a link.
    ///
    /// Whatever the driver reports, a link that never opened is a
    /// connectivity failure.
    pub fn from_connect(error: DriverError) -> Self {
        match error {
            DriverError::Connect(message) => ProbeFailure::Connectivity(message),
            other => ProbeFailure::Connectivity(other.to_string()),
        }
    }
}

impl FailureKind {
    /// Whether the connection handle must be discarded after this kind of failure.
    pub fn invalidates_handle(self) -> bool {
        match self {
            FailureKind::Connectivity => true,
            FailureKind::StaleHandle => true,
            FailureKind::Query => false,
            FailureKind::Unexpected => true,
        }
    }

    /// Short name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Connectivity => "connectivity",
            FailureKind::StaleHandle => "stale_handle",
            FailureKind::Query => "query",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DriverError> for ProbeFailure {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::Connect(message) => ProbeFailure::Connectivity(message),
            DriverError::Closed(message) => ProbeFailure::StaleHandle(message),
            DriverError::Query(message) => ProbeFailure::Query(message),
        }
    }
}
