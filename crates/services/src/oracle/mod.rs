//! Question generation, per-answer scoring and final summary backends.

use async_trait::async_trait;

use interview_core::model::{Answer, AnswerScore, FinalAssessment, Question, QuestionSequence};

use crate::error::OracleError;

mod heuristic;
mod remote;

pub use heuristic::HeuristicOracle;
pub use remote::RemoteOracle;

/// External contract the interview loop calls into.
///
/// Every call is fallible; the loop leaves the session retryable on error.
#[async_trait]
pub trait InterviewOracle: Send + Sync {
    /// Produce the exact question sequence for a session.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the backend fails or answers with an unusable sequence.
    async fn generate_questions(&self, resume_text: &str) -> Result<QuestionSequence, OracleError>;

    /// Score one answer on a 0–10 scale.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the backend fails.
    async fn score_answer(
        &self,
        question: &Question,
        answer_text: &str,
        time_spent_secs: u32,
    ) -> Result<AnswerScore, OracleError>;

    /// Aggregate the full ordered answer list into a 0–100 result.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the backend fails.
    async fn summarize(&self, answers: &[Answer]) -> Result<FinalAssessment, OracleError>;
}
