use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question sequence is empty")]
    EmptySequence,

    #[error("duplicate question id: {id}")]
    DuplicateId { id: QuestionId },

    #[error("question {id} has empty text")]
    EmptyText { id: QuestionId },

    #[error("question {id} has a zero time limit")]
    ZeroTimeLimit { id: QuestionId },

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Standard answer time for a question of this difficulty.
    #[must_use]
    pub fn default_time_limit_secs(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 60,
            Difficulty::Hard => 120,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuestionError::UnknownDifficulty(s.to_string())),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single timed interview question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    difficulty: Difficulty,
    time_limit_secs: u32,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` for blank text and
    /// `QuestionError::ZeroTimeLimit` when the limit is zero.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        difficulty: Difficulty,
        time_limit_secs: u32,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText { id });
        }
        if time_limit_secs == 0 {
            return Err(QuestionError::ZeroTimeLimit { id });
        }
        Ok(Self {
            id,
            text,
            difficulty,
            time_limit_secs,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }
}

//
// ─── QUESTION SEQUENCE ────────────────────────────────────────────────────────
//

/// Ordered, non-empty list of questions with unique ids.
///
/// The canonical interview uses six questions (two per difficulty), but nothing
/// here depends on that count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuestionSequence(Vec<Question>);

impl QuestionSequence {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySequence` when no questions are given and
    /// `QuestionError::DuplicateId` when two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySequence);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuestionError::DuplicateId {
                    id: question.id().clone(),
                });
            }
        }
        Ok(Self(questions))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Question] {
        &self.0
    }

    #[must_use]
    pub fn count_of(&self, difficulty: Difficulty) -> usize {
        self.0
            .iter()
            .filter(|q| q.difficulty() == difficulty)
            .count()
    }
}

impl TryFrom<Vec<Question>> for QuestionSequence {
    type Error = QuestionError;

    fn try_from(value: Vec<Question>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionSequence> for Vec<Question> {
    fn from(value: QuestionSequence) -> Self {
        value.0
    }
}
