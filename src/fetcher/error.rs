//! Error types for [`crate::SvidFetcher`].

use std::error::Error;

use thiserror::Error;

use crate::workload_api::error::WorkloadApiError;

/// Errors returned by [`crate::SvidFetcher::fetch`].
///
/// Each variant is one failure kind; use [`SvidFetchError::kind`] to branch on the kind
/// without matching on the carried causes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SvidFetchError {
    /// The endpoint address is malformed or no transport can be built for it.
    #[error("invalid Workload API endpoint address '{address}': {source}")]
    InvalidEndpoint {
        /// The address that was rejected.
        address: String,
        /// The underlying parse or transport error.
        #[source]
        source: WorkloadApiError,
    },

    /// The Workload API could not be reached, refused the request, or returned an unusable
    /// X.509 context.
    #[error("failed to fetch X.509 context from the Workload API: {source}")]
    ContextFetchFailed {
        /// The underlying Workload API error.
        #[source]
        source: WorkloadApiError,
    },

    /// The default X.509-SVID carries no certificate.
    #[error("X.509-SVID certificate chain is empty")]
    EmptyCertificateChain,

    /// Any other failure.
    #[error("unexpected failure fetching X.509-SVID: {source}")]
    UnexpectedFailure {
        /// The underlying cause.
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },
}

/// The kind of a [`SvidFetchError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SvidFetchErrorKind {
    /// See [`SvidFetchError::InvalidEndpoint`].
    InvalidEndpoint,
    /// See [`SvidFetchError::ContextFetchFailed`].
    ContextFetchFailed,
    /// See [`SvidFetchError::EmptyCertificateChain`].
    EmptyCertificateChain,
    /// See [`SvidFetchError::UnexpectedFailure`].
    UnexpectedFailure,
}

impl SvidFetchError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> SvidFetchErrorKind {
        match self {
            Self::InvalidEndpoint { .. } => SvidFetchErrorKind::InvalidEndpoint,
            Self::ContextFetchFailed { .. } => SvidFetchErrorKind::ContextFetchFailed,
            Self::EmptyCertificateChain => SvidFetchErrorKind::EmptyCertificateChain,
            Self::UnexpectedFailure { .. } => SvidFetchErrorKind::UnexpectedFailure,
        }
    }

    pub(super) fn unexpected(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::UnexpectedFailure {
            source: source.into(),
        }
    }
}
