use async_trait::async_trait;
use rand::rng;
use rand::seq::SliceRandom;

use interview_core::model::{
    Answer, AnswerScore, Difficulty, FinalAssessment, Question, QuestionId, QuestionSequence,
};
use interview_core::scoring;

use super::InterviewOracle;
use crate::error::OracleError;

const PER_DIFFICULTY: usize = 2;

const BANK: &[(Difficulty, &str)] = &[
    (
        Difficulty::Easy,
        "What is the difference between stack and heap allocation?",
    ),
    (
        Difficulty::Easy,
        "What does a package manifest such as Cargo.toml or package.json describe?",
    ),
    (
        Difficulty::Easy,
        "What is the difference between a process and a thread?",
    ),
    (
        Difficulty::Medium,
        "Explain how you would design a REST API for paginated search results.",
    ),
    (
        Difficulty::Medium,
        "What is middleware in a web framework and how would you write a custom one?",
    ),
    (
        Difficulty::Medium,
        "Explain the difference between SQL and NoSQL databases with examples.",
    ),
    (
        Difficulty::Hard,
        "Design a service that handles a high volume of concurrent requests. What would you scale first?",
    ),
    (
        Difficulty::Hard,
        "Implement a debounce function and explain when you would use it.",
    ),
    (
        Difficulty::Hard,
        "How would you find and fix a memory leak in a long-running server process?",
    ),
];

/// Local, deterministic oracle backed by a built-in question bank and
/// the length/speed scoring policy.
#[derive(Clone, Debug, Default)]
pub struct HeuristicOracle {
    shuffle: bool,
}

impl HeuristicOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick questions at random within each difficulty instead of bank order.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    fn pick(&self, difficulty: Difficulty) -> Vec<&'static str> {
        let mut texts: Vec<&'static str> = BANK
            .iter()
            .filter(|(d, _)| *d == difficulty)
            .map(|(_, text)| *text)
            .collect();
        if self.shuffle {
            texts.shuffle(&mut rng());
        }
        texts.truncate(PER_DIFFICULTY);
        texts
    }
}

#[async_trait]
impl InterviewOracle for HeuristicOracle {
    async fn generate_questions(
        &self,
        _resume_text: &str,
    ) -> Result<QuestionSequence, OracleError> {
        let mut questions = Vec::with_capacity(Difficulty::ALL.len() * PER_DIFFICULTY);
        for difficulty in Difficulty::ALL {
            for text in self.pick(difficulty) {
                let id = QuestionId::new(format!("question-{}", questions.len() + 1));
                let limit = difficulty.default_time_limit_secs();
                let question = Question::new(id, text, difficulty, limit)
                    .map_err(|e| OracleError::Malformed(e.to_string()))?;
                questions.push(question);
            }
        }
        QuestionSequence::new(questions).map_err(|e| OracleError::Malformed(e.to_string()))
    }

    async fn score_answer(
        &self,
        question: &Question,
        answer_text: &str,
        time_spent_secs: u32,
    ) -> Result<AnswerScore, OracleError> {
        Ok(scoring::score_answer(question, answer_text, time_spent_secs))
    }

    async fn summarize(&self, answers: &[Answer]) -> Result<FinalAssessment, OracleError> {
        Ok(scoring::summarize(answers))
    }
}
