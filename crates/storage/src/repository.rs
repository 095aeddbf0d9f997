use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::model::{Candidate, CandidateId, FinalAssessment, SessionSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Final outcome stored against a candidate once their session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub final_score: u8,
    pub summary: String,
    pub completed_at: DateTime<Utc>,
}

/// A candidate together with their recorded result, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub candidate: Candidate,
    pub result: Option<CandidateResult>,
}

/// Repository contract for in-progress session state.
///
/// At most one snapshot exists per candidate; saving replaces it.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist or replace the snapshot for its candidate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be serialized or stored.
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Load the snapshot for a candidate, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or deserialization failures.
    async fn load_snapshot(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the snapshot for a candidate. Missing snapshots are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_snapshot(&self, candidate_id: CandidateId) -> Result<(), StorageError>;

    /// Active or paused sessions, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or deserialization failures.
    async fn list_unfinished(&self) -> Result<Vec<SessionSnapshot>, StorageError>;
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Persist or update a candidate profile. An existing result is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the candidate cannot be stored.
    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), StorageError>;

    /// Fetch a candidate and their result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StorageError>;

    /// Attach the final assessment to an existing candidate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the candidate does not exist.
    async fn record_result(
        &self,
        id: CandidateId,
        assessment: &FinalAssessment,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<CandidateId, SessionSnapshot>>>,
    candidates: Arc<Mutex<HashMap<CandidateId, CandidateRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let mut guard = self.snapshots.lock().map_err(poisoned)?;
        guard.insert(snapshot.candidate_id(), snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self.snapshots.lock().map_err(poisoned)?;
        Ok(guard.get(&candidate_id).cloned())
    }

    async fn delete_snapshot(&self, candidate_id: CandidateId) -> Result<(), StorageError> {
        let mut guard = self.snapshots.lock().map_err(poisoned)?;
        guard.remove(&candidate_id);
        Ok(())
    }

    async fn list_unfinished(&self) -> Result<Vec<SessionSnapshot>, StorageError> {
        let guard = self.snapshots.lock().map_err(poisoned)?;
        let mut out: Vec<_> = guard
            .values()
            .filter(|s| s.phase.is_unfinished())
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

#[async_trait]
impl CandidateRepository for InMemoryRepository {
    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), StorageError> {
        let mut guard = self.candidates.lock().map_err(poisoned)?;
        guard
            .entry(candidate.id())
            .and_modify(|record| record.candidate = candidate.clone())
            .or_insert_with(|| CandidateRecord {
                candidate: candidate.clone(),
                result: None,
            });
        Ok(())
    }

    async fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StorageError> {
        let guard = self.candidates.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn record_result(
        &self,
        id: CandidateId,
        assessment: &FinalAssessment,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.candidates.lock().map_err(poisoned)?;
        let record = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        record.result = Some(CandidateResult {
            final_score: assessment.final_score(),
            summary: assessment.summary().to_owned(),
            completed_at,
        });
        Ok(())
    }
}

/// Aggregates session and candidate repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub candidates: Arc<dyn CandidateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let candidates: Arc<dyn CandidateRepository> = Arc::new(repo);
        Self {
            sessions,
            candidates,
        }
    }
}
