//! Local scoring policy: 0–10 per answer, 0–100 final percentage.
//!
//! Per answer, the trimmed length picks a band and answering in under half
//! the time limit earns one bonus point.

use std::fmt;

use crate::model::{Answer, AnswerScore, Difficulty, FinalAssessment, MAX_ANSWER_SCORE, Question};

const STRENGTH_THRESHOLD: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceBand {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Self::Excellent
        } else if percentage >= 60.0 {
            Self::Good
        } else if percentage >= 40.0 {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => "Strong candidate for the role",
            Self::Good => "Promising candidate with some areas to develop",
            Self::Average | Self::NeedsImprovement => {
                "Consider additional training or a junior role"
            }
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::NeedsImprovement => "Needs Improvement",
        })
    }
}

/// Score one answer by length band plus a speed bonus.
#[must_use]
pub fn score_answer(question: &Question, answer_text: &str, time_spent_secs: u32) -> AnswerScore {
    let length = answer_text.trim().chars().count();
    let (base, feedback) = match length {
        0..10 => (2, "Answer is too brief. Consider providing more detail."),
        10..50 => (5, "Good attempt, but could be more comprehensive."),
        50..150 => (7, "Well-structured answer with good details."),
        _ => (9, "Excellent comprehensive answer!"),
    };

    let limit = question.time_limit_secs();
    let efficiency = f64::from(time_spent_secs.min(limit)) / f64::from(limit);
    let bonus = u8::from(efficiency < 0.5);

    AnswerScore::new((base + bonus).min(MAX_ANSWER_SCORE), feedback)
}

/// Aggregate scored answers into a percentage and narrative.
#[must_use]
pub fn summarize(answers: &[Answer]) -> FinalAssessment {
    let Some(mean) = mean_score(answers.iter()) else {
        return FinalAssessment::new(0, "No answers were recorded.");
    };
    let percentage = mean / f64::from(MAX_ANSWER_SCORE) * 100.0;
    let band = PerformanceBand::from_percentage(percentage);

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    for difficulty in Difficulty::ALL {
        let Some(avg) = mean_score(answers.iter().filter(|a| a.difficulty() == difficulty)) else {
            continue;
        };
        let (strong, weak, advice) = topic_lines(difficulty);
        if avg >= STRENGTH_THRESHOLD {
            strengths.push(strong);
        } else {
            strengths.push(weak);
            improvements.push(advice);
        }
    }

    let mut summary = format!("Overall Performance: {band} ({percentage:.1}%)\n\nStrengths:\n");
    for line in &strengths {
        summary.push_str("• ");
        summary.push_str(line);
        summary.push('\n');
    }
    if !improvements.is_empty() {
        summary.push_str("\nAreas for Improvement:\n");
        for line in &improvements {
            summary.push_str("• ");
            summary.push_str(line);
            summary.push('\n');
        }
    }
    summary.push_str("\nRecommendation: ");
    summary.push_str(band.recommendation());

    FinalAssessment::new(round_percentage(percentage), summary)
}

fn mean_score<'a>(answers: impl Iterator<Item = &'a Answer>) -> Option<f64> {
    let (sum, count) = answers.fold((0_u32, 0_u32), |(sum, count), a| {
        (sum + u32::from(a.score()), count + 1)
    });
    (count > 0).then(|| f64::from(sum) / f64::from(count))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_percentage(percentage: f64) -> u8 {
    percentage.round().clamp(0.0, 100.0) as u8
}

fn topic_lines(difficulty: Difficulty) -> (&'static str, &'static str, &'static str) {
    match difficulty {
        Difficulty::Easy => (
            "Strong foundation in basic concepts",
            "Basic concepts need reinforcement",
            "Review fundamental concepts",
        ),
        Difficulty::Medium => (
            "Good understanding of intermediate topics",
            "Intermediate concepts require more practice",
            "Practice more with frameworks and backend concepts",
        ),
        Difficulty::Hard => (
            "Excellent grasp of advanced concepts",
            "Advanced topics need more study",
            "Study advanced architecture and optimization techniques",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerSource, PendingAnswer, QuestionId};

    fn question(difficulty: Difficulty, limit: u32) -> Question {
        Question::new(QuestionId::new("q"), "question", difficulty, limit).unwrap()
    }

    fn answer(id: &str, difficulty: Difficulty, score: u8) -> Answer {
        let question = Question::new(QuestionId::new(id), "question", difficulty, 60).unwrap();
        let pending = PendingAnswer {
            index: 0,
            question_id: QuestionId::new(id),
            answer_text: "text".into(),
            time_spent_secs: 30,
            source: AnswerSource::Manual,
        };
        Answer::from_pending(&question, pending, AnswerScore::new(score, "f"))
    }

    #[test]
    fn length_bands_and_speed_bonus() {
        let q = question(Difficulty::Easy, 20);
        assert_eq!(score_answer(&q, "short", 20).score(), 2);
        assert_eq!(score_answer(&q, "short", 5).score(), 3);
        assert_eq!(score_answer(&q, &"x".repeat(30), 20).score(), 5);
        assert_eq!(score_answer(&q, &"x".repeat(100), 20).score(), 7);
        assert_eq!(score_answer(&q, &"x".repeat(200), 1).score(), 10);
    }

    #[test]
    fn sentinel_answer_is_scored_like_any_text() {
        let q = question(Difficulty::Hard, 120);
        let score = score_answer(&q, crate::model::NO_ANSWER_PROVIDED, 120);
        assert_eq!(score.score(), 5);
    }

    #[test]
    fn summary_percentage_and_band() {
        let answers = vec![
            answer("q1", Difficulty::Easy, 8),
            answer("q2", Difficulty::Easy, 8),
            answer("q3", Difficulty::Medium, 6),
            answer("q4", Difficulty::Medium, 6),
            answer("q5", Difficulty::Hard, 4),
            answer("q6", Difficulty::Hard, 4),
        ];
        let result = summarize(&answers);
        assert_eq!(result.final_score(), 60);
        assert!(result.summary().starts_with("Overall Performance: Good (60.0%)"));
        assert!(result.summary().contains("Strong foundation in basic concepts"));
        assert!(result.summary().contains("Advanced topics need more study"));
    }

    #[test]
    fn summary_handles_missing_difficulties_and_empty_input() {
        let result = summarize(&[answer("q1", Difficulty::Hard, 10)]);
        assert_eq!(result.final_score(), 100);
        assert!(!result.summary().contains("basic concepts"));

        assert_eq!(summarize(&[]).final_score(), 0);
    }
}
