use std::sync::Arc;

use interview_core::model::{Candidate, CandidateDraft, CandidateId, ParsedResume, ProfileUpdate};
use interview_core::resume;
use storage::repository::CandidateRepository;
use tracing::info;

use crate::Clock;
use crate::error::IntakeError;

/// Outcome of registering an uploaded resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Every contact field was found; the candidate is stored and can start a session.
    Ready(Candidate),
    /// Some fields are missing; collect them and call `complete_profile`.
    NeedsProfile(CandidateDraft),
}

/// Turns resume uploads into stored candidates, gating on a complete profile.
#[derive(Clone)]
pub struct IntakeService {
    clock: Clock,
    candidates: Arc<dyn CandidateRepository>,
}

impl IntakeService {
    #[must_use]
    pub fn new(clock: Clock, candidates: Arc<dyn CandidateRepository>) -> Self {
        Self { clock, candidates }
    }

    /// Extract contact details from plain resume text.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::EmptyResume` for blank text.
    pub fn parse(&self, text: &str, file_name: Option<&str>) -> Result<ParsedResume, IntakeError> {
        if text.trim().is_empty() {
            return Err(IntakeError::EmptyResume);
        }
        Ok(resume::parse_resume(text, file_name))
    }

    /// Register a parsed resume, storing the candidate when the profile is complete.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Profile` if extracted values fail validation and
    /// `IntakeError::Storage` if the candidate cannot be stored.
    pub async fn register(&self, parsed: ParsedResume) -> Result<Registration, IntakeError> {
        let draft = CandidateDraft::from_resume(parsed);
        if !draft.is_complete() {
            info!(missing = ?draft.missing_fields(), "resume needs manual profile completion");
            return Ok(Registration::NeedsProfile(draft));
        }
        let candidate = self.store(draft).await?;
        Ok(Registration::Ready(candidate))
    }

    /// Fill missing fields from manual entry and store the candidate.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Profile` while fields are still missing or invalid.
    pub async fn complete_profile(
        &self,
        draft: CandidateDraft,
        update: ProfileUpdate,
    ) -> Result<Candidate, IntakeError> {
        self.store(draft.apply(update)).await
    }

    async fn store(&self, draft: CandidateDraft) -> Result<Candidate, IntakeError> {
        let candidate = draft.finalize(CandidateId::generate(), self.clock.now())?;
        self.candidates.upsert_candidate(&candidate).await?;
        info!(candidate = %candidate.id(), "candidate registered");
        Ok(candidate)
    }
}
