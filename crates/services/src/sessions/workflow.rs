use std::num::NonZeroU32;
use std::sync::Arc;

use interview_core::model::{
    Answer, Candidate, CandidateId, FinalAssessment, SessionError, SessionSnapshot,
};
use interview_core::reconciler::DEFAULT_PERSIST_EVERY;
use interview_core::resume::{DEFAULT_RESUME_MAX_CHARS, truncate_resume_text};
use interview_core::{
    Activation, Advance, CommitOutcome, SessionMachine, TickOutcome, TimeReconciler,
};
use storage::repository::{CandidateRepository, SessionRepository};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::InterviewError;
use crate::oracle::InterviewOracle;

/// Result of a submit, expiry or retried scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStep {
    /// The question was already claimed or answered; nothing changed.
    Ignored { index: usize },
    /// The answer was recorded and the next question's countdown is running.
    Advanced {
        answer: Answer,
        next_index: usize,
        activation: Activation,
    },
    /// The last answer was recorded and the session is complete.
    Completed {
        answer: Answer,
        assessment: FinalAssessment,
    },
}

/// Orchestrates a session against the oracle and storage.
///
/// Every transition that matters across a reload is written through to the
/// session repository before the call returns.
#[derive(Clone)]
pub struct InterviewLoopService {
    clock: Clock,
    oracle: Arc<dyn InterviewOracle>,
    sessions: Arc<dyn SessionRepository>,
    candidates: Arc<dyn CandidateRepository>,
    persist_every: NonZeroU32,
    resume_max_chars: usize,
}

impl InterviewLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        oracle: Arc<dyn InterviewOracle>,
        sessions: Arc<dyn SessionRepository>,
        candidates: Arc<dyn CandidateRepository>,
    ) -> Self {
        Self {
            clock,
            oracle,
            sessions,
            candidates,
            persist_every: DEFAULT_PERSIST_EVERY,
            resume_max_chars: DEFAULT_RESUME_MAX_CHARS,
        }
    }

    #[must_use]
    pub fn with_persist_every(mut self, persist_every: NonZeroU32) -> Self {
        self.persist_every = persist_every;
        self
    }

    #[must_use]
    pub fn with_resume_max_chars(mut self, resume_max_chars: usize) -> Self {
        self.resume_max_chars = resume_max_chars;
        self
    }

    fn reconciler(&self) -> TimeReconciler {
        TimeReconciler::new(self.persist_every)
    }

    //
    // ─── LIFECYCLE ────────────────────────────────────────────────────────────
    //

    /// Generate questions for the candidate and start the first countdown.
    ///
    /// Any saved session for the same candidate is replaced.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::QuestionsFailed` if generation fails, or a
    /// storage error if the candidate or snapshot cannot be saved.
    pub async fn begin(&self, candidate: Candidate) -> Result<SessionMachine, InterviewError> {
        self.candidates.upsert_candidate(&candidate).await?;

        let resume = truncate_resume_text(candidate.resume_text(), self.resume_max_chars);
        let questions = self
            .oracle
            .generate_questions(resume)
            .await
            .map_err(InterviewError::QuestionsFailed)?;

        let candidate_id = candidate.id();
        let total = questions.len();
        let mut machine = SessionMachine::new(candidate).with_reconciler(self.reconciler());
        machine.start(questions, self.clock.now())?;
        self.persist(&machine).await?;

        info!(candidate = %candidate_id, total, "interview started");
        Ok(machine)
    }

    /// Rebuild a saved session, seeding the countdown from the persisted time.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::NoSavedSession` if nothing is stored and
    /// `InterviewError::Session` if the snapshot is inconsistent.
    pub async fn restore(
        &self,
        candidate_id: CandidateId,
    ) -> Result<SessionMachine, InterviewError> {
        let snapshot = self
            .sessions
            .load_snapshot(candidate_id)
            .await?
            .ok_or(InterviewError::NoSavedSession(candidate_id))?;
        let machine = SessionMachine::restore(snapshot, self.reconciler())?;
        info!(
            candidate = %candidate_id,
            phase = %machine.phase(),
            remaining = machine.time_remaining(),
            "interview restored"
        );
        Ok(machine)
    }

    /// Sessions that can be continued, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` if the repository fails.
    pub async fn list_unfinished(&self) -> Result<Vec<SessionSnapshot>, InterviewError> {
        Ok(self.sessions.list_unfinished().await?)
    }

    /// Discard the session and its saved snapshot. The machine starts over in `NotStarted`.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` if the snapshot cannot be removed.
    pub async fn end(&self, machine: &mut SessionMachine) -> Result<(), InterviewError> {
        let discarded = machine.end();
        self.sessions.delete_snapshot(discarded.candidate_id()).await?;
        info!(
            candidate = %discarded.candidate_id(),
            answered = discarded.answers().len(),
            "interview ended"
        );
        Ok(())
    }

    //
    // ─── TIMER ────────────────────────────────────────────────────────────────
    //

    /// `Active → Paused`, saving the frozen time remaining.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Session` for an invalid phase or a storage error
    /// if the snapshot cannot be saved.
    pub async fn pause(&self, machine: &mut SessionMachine) -> Result<u32, InterviewError> {
        let remaining = machine.pause()?;
        self.persist(machine).await?;
        info!(candidate = %machine.session().candidate_id(), remaining, "interview paused");
        Ok(remaining)
    }

    /// Page-hide / shutdown: pause and save if active. Returns once the save completed.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` if the snapshot cannot be saved.
    pub async fn page_hidden(
        &self,
        machine: &mut SessionMachine,
    ) -> Result<Option<u32>, InterviewError> {
        let Some(remaining) = machine.page_hidden() else {
            return Ok(None);
        };
        self.persist(machine).await?;
        info!(
            candidate = %machine.session().candidate_id(),
            remaining,
            "interview paused on page hide"
        );
        Ok(Some(remaining))
    }

    /// `Paused → Active`, continuing from the persisted time.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Session` for an invalid phase or a storage error.
    pub async fn resume(
        &self,
        machine: &mut SessionMachine,
    ) -> Result<Option<Activation>, InterviewError> {
        let activation = machine.resume()?;
        self.persist(machine).await?;
        info!(
            candidate = %machine.session().candidate_id(),
            remaining = machine.time_remaining(),
            "interview resumed"
        );
        Ok(activation)
    }

    /// Account for one elapsed second.
    ///
    /// Periodic write-through and expiry claims are saved here; a failed save is
    /// logged and retried by the next forced write.
    pub async fn tick(&self, machine: &mut SessionMachine) -> TickOutcome {
        let outcome = machine.tick();
        let should_save = match &outcome {
            TickOutcome::Counting { persist, .. } => *persist,
            TickOutcome::Expired(_) => true,
            TickOutcome::Idle => false,
        };
        if should_save {
            if let Err(err) = self.persist(machine).await {
                warn!(
                    candidate = %machine.session().candidate_id(),
                    error = %err,
                    "failed to write through time remaining"
                );
            }
        }
        outcome
    }

    //
    // ─── ANSWERS ──────────────────────────────────────────────────────────────
    //

    /// Manual submission for question `index`.
    ///
    /// Returns `AnswerStep::Ignored` when the session has already moved past
    /// `index`. Blank text is not rejected here.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::ScoringFailed` (retry with `retry_pending`),
    /// `InterviewError::SummaryFailed` (retry with `finish`), or session and
    /// storage errors.
    pub async fn submit(
        &self,
        machine: &mut SessionMachine,
        index: usize,
        answer_text: impl Into<String>,
        time_spent_secs: u32,
    ) -> Result<AnswerStep, InterviewError> {
        match machine.submit(index, answer_text, time_spent_secs)? {
            CommitOutcome::Ignored { index } => Ok(AnswerStep::Ignored { index }),
            CommitOutcome::Claimed(pending) => {
                debug!(index = pending.index, "answer claimed");
                self.persist(machine).await?;
                self.retry_pending(machine).await
            }
        }
    }

    /// Score the claimed answer and advance, without a new submission.
    ///
    /// Used after a countdown expiry and after a failed scoring call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoPendingAnswer` when nothing is claimed, and the
    /// same retryable errors as `submit`.
    pub async fn retry_pending(
        &self,
        machine: &mut SessionMachine,
    ) -> Result<AnswerStep, InterviewError> {
        let pending = machine
            .pending()
            .cloned()
            .ok_or(SessionError::NoPendingAnswer)?;
        let question = machine
            .current_question()
            .cloned()
            .ok_or(SessionError::IndexOutOfRange {
                index: pending.index,
                len: machine.session().sequence_len(),
            })?;

        let score = match self
            .oracle
            .score_answer(&question, &pending.answer_text, pending.time_spent_secs)
            .await
        {
            Ok(score) => score,
            Err(source) => {
                warn!(
                    candidate = %machine.session().candidate_id(),
                    index = pending.index,
                    error = %source,
                    "scoring failed; answer kept pending"
                );
                return Err(InterviewError::ScoringFailed {
                    index: pending.index,
                    source,
                });
            }
        };

        let advance = machine.record_scored(pending.index, score)?;
        self.persist(machine).await?;
        let Some(answer) = machine.session().answers().last().cloned() else {
            return Err(SessionError::NoPendingAnswer.into());
        };
        info!(
            candidate = %machine.session().candidate_id(),
            index = pending.index,
            score = answer.score(),
            source = ?answer.source(),
            "answer recorded"
        );

        match advance {
            Advance::NextQuestion { index, activation } => Ok(AnswerStep::Advanced {
                answer,
                next_index: index,
                activation,
            }),
            Advance::AwaitingSummary => {
                let assessment = self.finish(machine).await?;
                Ok(AnswerStep::Completed { answer, assessment })
            }
        }
    }

    /// Request the final assessment and complete the session.
    ///
    /// Calling again after success re-saves the stored result without another
    /// oracle call.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::SummaryFailed` if the oracle fails (the session
    /// stays `Active` with every answer recorded), `SessionError::SummaryNotReady`
    /// before the last answer, or a storage error.
    pub async fn finish(
        &self,
        machine: &mut SessionMachine,
    ) -> Result<FinalAssessment, InterviewError> {
        if machine.session().final_assessment().is_none() {
            if !machine.is_awaiting_summary() {
                return Err(SessionError::SummaryNotReady {
                    expected: machine.session().sequence_len(),
                    recorded: machine.session().answers().len(),
                }
                .into());
            }
            let assessment = match self.oracle.summarize(machine.session().answers()).await {
                Ok(assessment) => assessment,
                Err(source) => {
                    warn!(
                        candidate = %machine.session().candidate_id(),
                        error = %source,
                        "summary failed; session left awaiting summary"
                    );
                    return Err(InterviewError::SummaryFailed(source));
                }
            };
            machine.complete(assessment, self.clock.now())?;
        }

        let session = machine.session();
        let (Some(assessment), Some(completed_at)) =
            (session.final_assessment().cloned(), session.completed_at())
        else {
            return Err(SessionError::SummaryNotReady {
                expected: session.sequence_len(),
                recorded: session.answers().len(),
            }
            .into());
        };
        self.candidates
            .record_result(session.candidate_id(), &assessment, completed_at)
            .await?;
        self.persist(machine).await?;

        info!(
            candidate = %machine.session().candidate_id(),
            final_score = assessment.final_score(),
            "interview completed"
        );
        Ok(assessment)
    }

    //
    // ─── PERSISTENCE ──────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn snapshot(&self, machine: &SessionMachine) -> SessionSnapshot {
        machine.snapshot(self.clock.now())
    }

    /// Write the machine's current state to the session repository.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::Storage` if the save fails.
    pub async fn persist(&self, machine: &SessionMachine) -> Result<(), InterviewError> {
        let snapshot = self.snapshot(machine);
        self.sessions.save_snapshot(&snapshot).await?;
        debug!(
            candidate = %snapshot.candidate_id(),
            phase = %snapshot.phase,
            remaining = snapshot.persisted_time_remaining,
            "session saved"
        );
        Ok(())
    }
}
