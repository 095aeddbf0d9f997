//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::model::{CandidateId, ProfileError, SessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question generation, scoring and summary backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OracleError {
    #[error("remote oracle is not configured")]
    Disabled,
    #[error("oracle request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("oracle returned an empty response")]
    EmptyResponse,
    #[error("oracle returned a malformed response: {0}")]
    Malformed(String),
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `InterviewLoopService`.
///
/// `ScoringFailed` and `SummaryFailed` leave the session retryable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("question generation failed: {0}")]
    QuestionsFailed(#[source] OracleError),
    #[error("scoring failed for question {index}: {source}")]
    ScoringFailed {
        index: usize,
        #[source]
        source: OracleError,
    },
    #[error("summary failed: {0}")]
    SummaryFailed(#[source] OracleError),
    #[error("no saved session for candidate {0}")]
    NoSavedSession(CandidateId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl InterviewError {
    /// True when re-invoking the same step may succeed without new input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ScoringFailed { .. } | Self::SummaryFailed(_))
    }
}

/// Errors emitted by `IntakeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("resume text is empty")]
    EmptyResume,
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {raw:?}")]
    InvalidValue { key: &'static str, raw: String },
}

/// Errors emitted by a `SessionHandle`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DriverError {
    #[error("session driver has stopped")]
    Closed,
    #[error(transparent)]
    Interview(#[from] InterviewError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
