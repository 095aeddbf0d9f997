mod answer;
mod candidate;
mod ids;
mod question;
mod session;

pub use answer::{
    Answer, AnswerScore, AnswerSource, FinalAssessment, MAX_ANSWER_SCORE, MAX_FINAL_SCORE,
    NO_ANSWER_PROVIDED, PendingAnswer,
};
pub use candidate::{
    Candidate, CandidateDraft, ParsedResume, ProfileError, ProfileField, ProfileUpdate,
};
pub use ids::{CandidateId, ParseIdError, QuestionId};
pub use question::{Difficulty, Question, QuestionError, QuestionSequence};
pub use session::{Phase, Session, SessionError, SessionProgress, SessionSnapshot};
