use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::answer::{Answer, FinalAssessment, PendingAnswer};
use crate::model::candidate::Candidate;
use crate::model::ids::{CandidateId, QuestionId};
use crate::model::question::{Question, QuestionSequence};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("operation `{operation}` is not allowed while {phase}")]
    InvalidPhase { operation: &'static str, phase: Phase },

    #[error("no pending answer to record")]
    NoPendingAnswer,

    #[error("pending answer is for question {pending}, not {requested}")]
    StaleCommit { pending: usize, requested: usize },

    #[error("question index {index} out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("summary requested before all {expected} answers were recorded ({recorded})")]
    SummaryNotReady { expected: usize, recorded: usize },

    #[error("duplicate answer for question {0}")]
    DuplicateAnswer(QuestionId),

    #[error("invalid persisted session state: {0}")]
    InvalidPersistedState(String),
}

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Active,
    Paused,
    Completed,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::NotStarted => "not_started",
            Phase::Active => "active",
            Phase::Paused => "paused",
            Phase::Completed => "completed",
        }
    }

    /// True for the phases a reload should offer to continue.
    #[must_use]
    pub fn is_unfinished(self) -> bool {
        matches!(self, Phase::Active | Phase::Paused)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Phase::NotStarted),
            "active" => Ok(Phase::Active),
            "paused" => Ok(Phase::Paused),
            "completed" => Ok(Phase::Completed),
            other => Err(SessionError::InvalidPersistedState(format!(
                "unknown phase: {other}"
            ))),
        }
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One applicant's interview attempt. Mutated only through `SessionMachine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) candidate: Candidate,
    pub(crate) phase: Phase,
    pub(crate) current_question_index: usize,
    pub(crate) questions: Option<QuestionSequence>,
    pub(crate) answers: Vec<Answer>,
    pub(crate) persisted_time_remaining: u32,
    pub(crate) total_time_spent: u32,
    pub(crate) pending: Option<PendingAnswer>,
    pub(crate) final_assessment: Option<FinalAssessment>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            phase: Phase::NotStarted,
            current_question_index: 0,
            questions: None,
            answers: Vec::new(),
            persisted_time_remaining: 0,
            total_time_spent: 0,
            pending: None,
            final_assessment: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    #[must_use]
    pub fn candidate_id(&self) -> CandidateId {
        self.candidate.id()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn questions(&self) -> Option<&QuestionSequence> {
        self.questions.as_ref()
    }

    /// Number of questions in the assigned sequence (0 before start).
    #[must_use]
    pub fn sequence_len(&self) -> usize {
        self.questions.as_ref().map_or(0, QuestionSequence::len)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions
            .as_ref()
            .and_then(|q| q.get(self.current_question_index))
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn persisted_time_remaining(&self) -> u32 {
        self.persisted_time_remaining
    }

    #[must_use]
    pub fn total_time_spent(&self) -> u32 {
        self.total_time_spent
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingAnswer> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn final_assessment(&self) -> Option<&FinalAssessment> {
        self.final_assessment.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Every answer is recorded but the final summary has not been applied yet.
    ///
    /// The session is still `Active` (or `Paused`) in this state; finishing is retryable.
    #[must_use]
    pub fn is_awaiting_summary(&self) -> bool {
        self.phase.is_unfinished()
            && self.sequence_len() > 0
            && self.answers.len() == self.sequence_len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed
    }

    #[must_use]
    pub fn to_snapshot(&self, updated_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            candidate: self.candidate.clone(),
            phase: self.phase,
            current_question_index: self.current_question_index,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            persisted_time_remaining: self.persisted_time_remaining,
            total_time_spent: self.total_time_spent,
            pending: self.pending.clone(),
            final_assessment: self.final_assessment.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            updated_at,
        }
    }

    /// Rebuild a session from a snapshot, checking every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPersistedState` when the snapshot could not
    /// have been produced by a valid sequence of transitions.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, SessionError> {
        fn invalid<T>(msg: String) -> Result<T, SessionError> {
            Err(SessionError::InvalidPersistedState(msg))
        }

        let len = snapshot.questions.as_ref().map_or(0, QuestionSequence::len);

        match (snapshot.phase, snapshot.questions.is_some()) {
            (Phase::NotStarted, true) => {
                return invalid("not started but questions assigned".into());
            }
            (Phase::NotStarted, false) => {}
            (_, false) => return invalid(format!("{} without questions", snapshot.phase)),
            (_, true) => {}
        }
        if snapshot.current_question_index > len {
            return invalid(format!(
                "index {} exceeds {len} questions",
                snapshot.current_question_index
            ));
        }
        if snapshot.answers.len() != snapshot.current_question_index {
            return invalid(format!(
                "{} answers recorded at index {}",
                snapshot.answers.len(),
                snapshot.current_question_index
            ));
        }
        let mut spent: u32 = 0;
        if let Some(questions) = snapshot.questions.as_ref() {
            for (answer, question) in snapshot.answers.iter().zip(questions.iter()) {
                if answer.question_id() != question.id() {
                    return invalid(format!(
                        "answer for {} recorded against {}",
                        answer.question_id(),
                        question.id()
                    ));
                }
                if answer.time_limit_secs() != question.time_limit_secs()
                    || answer.difficulty() != question.difficulty()
                {
                    return invalid(format!(
                        "answer for {} does not match its question",
                        question.id()
                    ));
                }
                if answer.time_spent_secs() > answer.time_limit_secs() {
                    return invalid(format!(
                        "answer for {} spent {}s of a {}s limit",
                        question.id(),
                        answer.time_spent_secs(),
                        answer.time_limit_secs()
                    ));
                }
                let Some(total) = spent.checked_add(answer.time_spent_secs()) else {
                    return invalid("answer time overflows the session total".into());
                };
                spent = total;
            }
        }
        if spent != snapshot.total_time_spent {
            return invalid(format!(
                "total time {} does not match answers ({spent})",
                snapshot.total_time_spent
            ));
        }
        let completed = snapshot.phase == Phase::Completed;
        if completed != snapshot.final_assessment.is_some() {
            return invalid("final assessment does not match phase".into());
        }
        if completed && snapshot.answers.len() != len {
            return invalid("completed with unanswered questions".into());
        }

        // Time left can never exceed the question being answered; with no
        // current question nothing is being counted.
        let current_limit = snapshot
            .questions
            .as_ref()
            .and_then(|q| q.get(snapshot.current_question_index))
            .map_or(0, Question::time_limit_secs);
        if snapshot.persisted_time_remaining > current_limit {
            return invalid(format!(
                "{}s remaining exceeds the {current_limit}s limit",
                snapshot.persisted_time_remaining
            ));
        }
        if let Some(pending) = snapshot.pending.as_ref() {
            let expected = snapshot
                .questions
                .as_ref()
                .and_then(|q| q.get(snapshot.current_question_index))
                .map(Question::id);
            if pending.index != snapshot.current_question_index
                || expected != Some(&pending.question_id)
            {
                return invalid("pending answer does not target the current question".into());
            }
            if pending.time_spent_secs > current_limit {
                return invalid("pending answer exceeds its time limit".into());
            }
        }

        Ok(Self {
            candidate: snapshot.candidate,
            phase: snapshot.phase,
            current_question_index: snapshot.current_question_index,
            questions: snapshot.questions,
            answers: snapshot.answers,
            persisted_time_remaining: snapshot.persisted_time_remaining,
            total_time_spent: snapshot.total_time_spent,
            pending: snapshot.pending,
            final_assessment: snapshot.final_assessment,
            started_at: snapshot.started_at,
            completed_at: snapshot.completed_at,
        })
    }
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Durable shape of a session, keyed by candidate identity.
///
/// This mirrors `Session` field for field so storage adapters can serialize it
/// without reaching into the domain type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub candidate: Candidate,
    pub phase: Phase,
    pub current_question_index: usize,
    pub questions: Option<QuestionSequence>,
    pub answers: Vec<Answer>,
    pub persisted_time_remaining: u32,
    pub total_time_spent: u32,
    #[serde(default)]
    pub pending: Option<PendingAnswer>,
    pub final_assessment: Option<FinalAssessment>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn candidate_id(&self) -> CandidateId {
        self.candidate.id()
    }
}

//
// ─── PROGRESS ─────────────────────────────────────────────────────────────────
//

/// Read-only view of where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: Phase,
    pub total: usize,
    pub answered: usize,
    pub remaining_questions: usize,
    pub current_index: usize,
    pub time_remaining: u32,
}
