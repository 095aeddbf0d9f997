use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{Difficulty, Question};

/// Answer text recorded when a question times out with nothing typed.
pub const NO_ANSWER_PROVIDED: &str = "no answer provided";

/// Upper bound of a per-answer score.
pub const MAX_ANSWER_SCORE: u8 = 10;

/// Upper bound of the final percentage.
pub const MAX_FINAL_SCORE: u8 = 100;

/// How an answer came to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    /// Explicit submission by the applicant.
    Manual,
    /// Auto-submit on countdown expiry.
    Timeout,
}

//
// ─── SCORES ───────────────────────────────────────────────────────────────────
//

/// Score and feedback for one answer, on a 0–10 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerScore {
    score: u8,
    feedback: String,
}

impl AnswerScore {
    /// Scores above `MAX_ANSWER_SCORE` are clamped.
    #[must_use]
    pub fn new(score: u8, feedback: impl Into<String>) -> Self {
        Self {
            score: score.min(MAX_ANSWER_SCORE),
            feedback: feedback.into(),
        }
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// Final percentage and narrative for a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAssessment {
    final_score: u8,
    summary: String,
}

impl FinalAssessment {
    /// Scores above `MAX_FINAL_SCORE` are clamped.
    #[must_use]
    pub fn new(final_score: u8, summary: impl Into<String>) -> Self {
        Self {
            final_score: final_score.min(MAX_FINAL_SCORE),
            summary: summary.into(),
        }
    }

    #[must_use]
    pub fn final_score(&self) -> u8 {
        self.final_score
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }
}

//
// ─── PENDING ANSWER ───────────────────────────────────────────────────────────
//

/// A committed-but-unscored answer.
///
/// Holding one for the current index is what makes a second submit or timeout
/// for the same question a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAnswer {
    pub index: usize,
    pub question_id: QuestionId,
    pub answer_text: String,
    pub time_spent_secs: u32,
    pub source: AnswerSource,
}

//
// ─── ANSWER ───────────────────────────────────────────────────────────────────
//

/// Append-only record of one answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    question_id: QuestionId,
    question_text: String,
    answer_text: String,
    difficulty: Difficulty,
    time_limit_secs: u32,
    time_spent_secs: u32,
    score: u8,
    feedback: String,
    source: AnswerSource,
}

impl Answer {
    pub(crate) fn from_pending(
        question: &Question,
        pending: PendingAnswer,
        score: AnswerScore,
    ) -> Self {
        Self {
            question_id: pending.question_id,
            question_text: question.text().to_string(),
            answer_text: pending.answer_text,
            difficulty: question.difficulty(),
            time_limit_secs: question.time_limit_secs(),
            time_spent_secs: pending.time_spent_secs,
            score: score.score,
            feedback: score.feedback,
            source: pending.source,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    #[must_use]
    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    #[must_use]
    pub fn source(&self) -> AnswerSource {
        self.source
    }
}
