use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use interview_core::model::{
    Answer, AnswerScore, Difficulty, FinalAssessment, MAX_ANSWER_SCORE, MAX_FINAL_SCORE, Question,
    QuestionId, QuestionSequence,
};

use super::InterviewOracle;
use crate::config::{DEFAULT_AI_TIMEOUT, OracleConfig};
use crate::error::OracleError;

const SYSTEM_PROMPT: &str = "You are a technical interviewer for a full-stack engineering role. \
Reply with a single JSON object and nothing else.";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Oracle backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct RemoteOracle {
    client: Client,
    config: Option<OracleConfig>,
}

impl RemoteOracle {
    /// Every request is bounded by `config.timeout`, so a hung endpoint surfaces
    /// as a retryable `OracleError::Http` instead of stalling the session.
    #[must_use]
    pub fn new(config: Option<OracleConfig>) -> Self {
        let timeout = config.as_ref().map_or(DEFAULT_AI_TIMEOUT, |c| c.timeout);
        Self {
            client: http_client(timeout),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, prompt: String) -> Result<String, OracleError> {
        let config = self.config.as_ref().ok_or(OracleError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OracleError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }

    async fn complete_json<T: DeserializeOwned>(&self, prompt: String) -> Result<T, OracleError> {
        let content = self.complete(prompt).await?;
        debug!(bytes = content.len(), "oracle response received");
        parse_json_object(&content)
    }
}

#[async_trait]
impl InterviewOracle for RemoteOracle {
    async fn generate_questions(&self, resume_text: &str) -> Result<QuestionSequence, OracleError> {
        let prompt = format!(
            "Write six interview questions tailored to the resume below: two easy, two medium \
             and two hard, in that order. Answer as \
             {{\"questions\":[{{\"text\":string,\"difficulty\":\"Easy\"|\"Medium\"|\"Hard\"}}]}}.\n\n\
             Resume:\n{resume_text}"
        );
        let body: QuestionsBody = self.complete_json(prompt).await?;
        questions_from_body(body)
    }

    async fn score_answer(
        &self,
        question: &Question,
        answer_text: &str,
        time_spent_secs: u32,
    ) -> Result<AnswerScore, OracleError> {
        let prompt = format!(
            "Question ({difficulty}, {limit}s limit): {text}\n\
             Answer (took {time_spent_secs}s): {answer_text}\n\n\
             Score the answer from 0 to 10 and give one or two sentences of feedback. \
             Answer as {{\"score\":number,\"feedback\":string}}.",
            difficulty = question.difficulty(),
            limit = question.time_limit_secs(),
            text = question.text(),
        );
        let body: ScoreBody = self.complete_json(prompt).await?;
        Ok(AnswerScore::new(
            clamp_score(body.score, MAX_ANSWER_SCORE),
            body.feedback,
        ))
    }

    async fn summarize(&self, answers: &[Answer]) -> Result<FinalAssessment, OracleError> {
        let mut transcript = String::new();
        for (i, answer) in answers.iter().enumerate() {
            transcript.push_str(&format!(
                "{n}. [{difficulty}] {question}\n   Answer: {text}\n   Score: {score}/10, {spent}s of {limit}s\n",
                n = i + 1,
                difficulty = answer.difficulty(),
                question = answer.question_text(),
                text = answer.answer_text(),
                score = answer.score(),
                spent = answer.time_spent_secs(),
                limit = answer.time_limit_secs(),
            ));
        }
        let prompt = format!(
            "Here is a completed interview:\n{transcript}\n\
             Give a final score from 0 to 100 and a short summary listing strengths, areas \
             for improvement and a recommendation. Answer as \
             {{\"final_score\":number,\"summary\":string}}."
        );
        let body: SummaryBody = self.complete_json(prompt).await?;
        Ok(FinalAssessment::new(
            clamp_score(body.final_score, MAX_FINAL_SCORE),
            body.summary,
        ))
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "failed to build oracle HTTP client; using defaults");
            Client::new()
        })
}

//
// ─── RESPONSE PARSING ─────────────────────────────────────────────────────────
//

/// Parse the first JSON object in `content`, tolerating code fences and prose.
fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return Err(OracleError::Malformed("no JSON object in response".into())),
    };
    serde_json::from_str(json).map_err(|e| OracleError::Malformed(e.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_score(raw: f64, max: u8) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, f64::from(max)) as u8
}

fn questions_from_body(body: QuestionsBody) -> Result<QuestionSequence, OracleError> {
    let mut questions = Vec::with_capacity(body.questions.len());
    for (i, item) in body.questions.into_iter().enumerate() {
        let difficulty: Difficulty = item.difficulty.parse().map_err(|_| {
            OracleError::Malformed(format!("unknown difficulty {:?}", item.difficulty))
        })?;
        let limit = difficulty.default_time_limit_secs();
        let id = QuestionId::new(format!("question-{}", i + 1));
        let question = Question::new(id, item.text, difficulty, limit)
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        questions.push(question);
    }
    QuestionSequence::new(questions).map_err(|e| OracleError::Malformed(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct QuestionsBody {
    questions: Vec<QuestionItem>,
}

#[derive(Debug, Deserialize)]
struct QuestionItem {
    text: String,
    difficulty: String,
}

#[derive(Debug, Deserialize)]
struct ScoreBody {
    score: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    final_score: f64,
    summary: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_without_config() {
        let oracle = RemoteOracle::new(None);
        assert!(!oracle.enabled());
        let err = oracle.summarize(&[]).await.unwrap_err();
        assert!(matches!(err, OracleError::Disabled));
    }

    #[tokio::test]
    async fn hung_endpoint_fails_within_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let oracle = RemoteOracle::new(Some(OracleConfig {
            base_url: format!("http://{addr}"),
            api_key: "sk-test".into(),
            model: "test".into(),
            timeout: Duration::from_millis(200),
        }));
        let question = Question::new(QuestionId::new("q1"), "Explain Rc", Difficulty::Easy, 20)
            .unwrap();

        let started = std::time::Instant::now();
        let err = oracle.score_answer(&question, "shared ownership", 5).await.unwrap_err();
        assert!(matches!(err, OracleError::Http(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[test]
    fn parses_fenced_json() {
        let body: ScoreBody =
            parse_json_object("```json\n{\"score\": 7.6, \"feedback\": \"clear\"}\n```").unwrap();
        assert_eq!(clamp_score(body.score, MAX_ANSWER_SCORE), 8);
        assert_eq!(body.feedback, "clear");
    }

    #[test]
    fn rejects_prose_without_object() {
        let err = parse_json_object::<ScoreBody>("I think it was fine").unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn clamps_out_of_range_scores() {
        assert_eq!(clamp_score(42.0, MAX_ANSWER_SCORE), 10);
        assert_eq!(clamp_score(-3.0, MAX_FINAL_SCORE), 0);
        assert_eq!(clamp_score(f64::NAN, MAX_FINAL_SCORE), 0);
        assert_eq!(clamp_score(150.0, MAX_FINAL_SCORE), 100);
    }

    #[test]
    fn builds_sequence_from_questions_body() {
        let body: QuestionsBody = parse_json_object(
            r#"{"questions":[{"text":"Q1","difficulty":"easy"},{"text":"Q2","difficulty":"Hard"}]}"#,
        )
        .unwrap();
        let sequence = questions_from_body(body).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.get(1).map(Question::time_limit_secs), Some(120));
        assert_eq!(sequence.get(1).map(|q| q.id().as_str()), Some("question-2"));
    }

    #[test]
    fn empty_questions_body_is_malformed() {
        let err = questions_from_body(QuestionsBody { questions: vec![] }).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }
}
