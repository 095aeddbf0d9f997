//! One owning task per session.
//!
//! The driver task is the only place a `SessionMachine` is mutated once the
//! session is live. Commands arrive over `mpsc` and are applied one at a time;
//! the one-second ticker is a separate task that only sends tagged tick
//! signals back, and is aborted before any transition that changes what is
//! being counted down.

use std::sync::Arc;
use std::time::Duration;

use interview_core::model::{
    AnswerSource, FinalAssessment, Phase, SessionProgress, SessionSnapshot,
};
use interview_core::{Activation, SessionMachine, TickOutcome};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::workflow::{AnswerStep, InterviewLoopService};
use crate::error::{DriverError, InterviewError};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;
const TICK_CAPACITY: usize = 4;

/// Observable session changes, broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Tick {
        remaining: u32,
    },
    QuestionStarted {
        index: usize,
        time_limit_secs: u32,
    },
    AnswerRecorded {
        index: usize,
        score: u8,
        source: AnswerSource,
    },
    Completed {
        final_score: u8,
    },
    ScoringFailed {
        index: usize,
        message: String,
    },
    SummaryFailed {
        message: String,
    },
    Paused {
        remaining: u32,
    },
    Resumed {
        remaining: u32,
    },
}

type Reply<T> = oneshot::Sender<Result<T, InterviewError>>;

enum Command {
    Draft(String),
    Submit {
        index: usize,
        text: String,
        reply: Reply<AnswerStep>,
    },
    Pause { reply: Reply<u32> },
    Resume { reply: Reply<Option<Activation>> },
    PageHidden { reply: Reply<Option<u32>> },
    RetryPending { reply: Reply<AnswerStep> },
    Finish { reply: Reply<FinalAssessment> },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
    Progress { reply: oneshot::Sender<SessionProgress> },
    End { reply: Reply<()> },
}

/// Spawns session driver tasks.
pub struct SessionDriver;

impl SessionDriver {
    /// Move `machine` into a new driver task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime. When every handle is dropped
    /// the task pauses and saves an active session before exiting.
    #[must_use]
    pub fn spawn(service: Arc<InterviewLoopService>, machine: SessionMachine) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = Actor {
            service,
            machine,
            events: events.clone(),
            tick_tx,
            ticker: None,
            generation: 0,
        };
        tokio::spawn(actor.run(command_rx, tick_rx));

        SessionHandle {
            commands: command_tx,
            events,
        }
    }
}

/// Cloneable handle to a running session driver.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<DriverEvent>,
}

impl SessionHandle {
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    /// Replace the text typed so far; a timeout records it instead of the sentinel.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the driver has stopped.
    pub async fn update_draft(&self, text: impl Into<String>) -> Result<(), DriverError> {
        self.commands
            .send(Command::Draft(text.into()))
            .await
            .map_err(|_| DriverError::Closed)
    }

    /// Submit an answer for question `index`. Time spent is taken from the countdown.
    ///
    /// Resolves to `AnswerStep::Ignored` if the session has already moved past
    /// `index`, for example because the question expired while the text was typed.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Interview` for session, oracle or storage failures.
    pub async fn submit(
        &self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<AnswerStep, DriverError> {
        let text = text.into();
        Ok(self
            .request(|reply| Command::Submit { index, text, reply })
            .await??)
    }

    /// # Errors
    ///
    /// Returns `DriverError::Interview` for an invalid phase or storage failure.
    pub async fn pause(&self) -> Result<u32, DriverError> {
        Ok(self.request(|reply| Command::Pause { reply }).await??)
    }

    /// # Errors
    ///
    /// Returns `DriverError::Interview` for an invalid phase or storage failure.
    pub async fn resume(&self) -> Result<Option<Activation>, DriverError> {
        Ok(self.request(|reply| Command::Resume { reply }).await??)
    }

    /// Pause-and-save if active. Resolves only after the snapshot is stored.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Interview` if the snapshot cannot be saved.
    pub async fn page_hidden(&self) -> Result<Option<u32>, DriverError> {
        Ok(self.request(|reply| Command::PageHidden { reply }).await??)
    }

    /// Re-score a claimed answer after a scoring failure.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Interview` if nothing is pending or scoring fails again.
    pub async fn retry_pending(&self) -> Result<AnswerStep, DriverError> {
        Ok(self.request(|reply| Command::RetryPending { reply }).await??)
    }

    /// Retry the final summary after a summary failure.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Interview` if the session is not ready or the oracle fails.
    pub async fn finish(&self) -> Result<FinalAssessment, DriverError> {
        Ok(self.request(|reply| Command::Finish { reply }).await??)
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the driver has stopped.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, DriverError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the driver has stopped.
    pub async fn progress(&self) -> Result<SessionProgress, DriverError> {
        self.request(|reply| Command::Progress { reply }).await
    }

    /// Discard the session and stop the driver.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Interview` if the snapshot cannot be removed.
    pub async fn end(&self) -> Result<(), DriverError> {
        Ok(self.request(|reply| Command::End { reply }).await??)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| DriverError::Closed)?;
        response.await.map_err(|_| DriverError::Closed)
    }
}

//
// ─── ACTOR ────────────────────────────────────────────────────────────────────
//

/// A tick tagged with the countdown activation and the ticker that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickSignal {
    activation: Activation,
    generation: u64,
}

struct Ticker {
    signal: TickSignal,
    task: JoinHandle<()>,
}

struct Actor {
    service: Arc<InterviewLoopService>,
    machine: SessionMachine,
    events: broadcast::Sender<DriverEvent>,
    tick_tx: mpsc::Sender<TickSignal>,
    ticker: Option<Ticker>,
    generation: u64,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut ticks: mpsc::Receiver<TickSignal>,
    ) {
        let candidate = self.machine.session().candidate_id();
        debug!(%candidate, "session driver started");
        self.sync_ticker();

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::End { reply }) => {
                        self.stop_ticker();
                        let result = self.service.end(&mut self.machine).await;
                        let _ = reply.send(result);
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.stop_ticker();
                        if let Err(err) = self.service.page_hidden(&mut self.machine).await {
                            warn!(%candidate, error = %err, "failed to save session on detach");
                        }
                        break;
                    }
                },
                Some(signal) = ticks.recv() => self.on_tick(signal).await,
            }
            self.sync_ticker();
        }

        self.stop_ticker();
        debug!(%candidate, "session driver stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Draft(text) => self.machine.update_draft(text),
            Command::Submit { index, text, reply } => {
                self.stop_ticker();
                let spent = self.machine.elapsed_on_current();
                let answered = self.answered();
                let result = self
                    .service
                    .submit(&mut self.machine, index, text, spent)
                    .await;
                self.report(answered, &result);
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                self.stop_ticker();
                let result = self.service.pause(&mut self.machine).await;
                if let Ok(remaining) = result {
                    self.emit(DriverEvent::Paused { remaining });
                }
                let _ = reply.send(result);
            }
            Command::PageHidden { reply } => {
                self.stop_ticker();
                let result = self.service.page_hidden(&mut self.machine).await;
                if let Ok(Some(remaining)) = result {
                    self.emit(DriverEvent::Paused { remaining });
                }
                let _ = reply.send(result);
            }
            Command::Resume { reply } => {
                let was_paused = self.machine.phase() == Phase::Paused;
                let result = self.service.resume(&mut self.machine).await;
                if was_paused && result.is_ok() {
                    self.emit(DriverEvent::Resumed {
                        remaining: self.machine.time_remaining(),
                    });
                }
                let _ = reply.send(result);
            }
            Command::RetryPending { reply } => {
                let answered = self.answered();
                let result = self.service.retry_pending(&mut self.machine).await;
                self.report(answered, &result);
                let _ = reply.send(result);
            }
            Command::Finish { reply } => {
                let result = self.service.finish(&mut self.machine).await;
                match &result {
                    Ok(assessment) => self.emit(DriverEvent::Completed {
                        final_score: assessment.final_score(),
                    }),
                    Err(InterviewError::SummaryFailed(source)) => {
                        self.emit(DriverEvent::SummaryFailed {
                            message: source.to_string(),
                        });
                    }
                    Err(_) => {}
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.service.snapshot(&self.machine));
            }
            Command::Progress { reply } => {
                let _ = reply.send(self.machine.progress());
            }
            // Handled by `run` so the loop can exit.
            Command::End { reply } => {
                let _ = reply.send(Ok(()));
            }
        }
    }

    async fn on_tick(&mut self, signal: TickSignal) {
        let current = self.ticker.as_ref().map(|t| t.signal);
        if current != Some(signal) || self.machine.running_activation() != Some(signal.activation)
        {
            debug!(generation = signal.generation, "dropping stale tick");
            return;
        }

        match self.service.tick(&mut self.machine).await {
            TickOutcome::Idle => {}
            TickOutcome::Counting { remaining, .. } => self.emit(DriverEvent::Tick { remaining }),
            TickOutcome::Expired(pending) => {
                self.stop_ticker();
                self.emit(DriverEvent::Tick { remaining: 0 });
                info!(
                    candidate = %self.machine.session().candidate_id(),
                    index = pending.index,
                    "question timed out; auto-submitting"
                );
                let answered = self.answered();
                let result = self.service.retry_pending(&mut self.machine).await;
                self.report(answered, &result);
            }
        }
    }

    fn answered(&self) -> usize {
        self.machine.session().answers().len()
    }

    /// Broadcast what an answer step changed, including partial progress on failure.
    fn report(&self, answered_before: usize, result: &Result<AnswerStep, InterviewError>) {
        if self.answered() > answered_before {
            if let Some(answer) = self.machine.session().answers().last() {
                self.emit(DriverEvent::AnswerRecorded {
                    index: self.answered() - 1,
                    score: answer.score(),
                    source: answer.source(),
                });
            }
        }

        match result {
            Ok(AnswerStep::Ignored { .. }) => {}
            Ok(AnswerStep::Advanced { next_index, .. }) => {
                if let Some(question) = self.machine.current_question() {
                    self.emit(DriverEvent::QuestionStarted {
                        index: *next_index,
                        time_limit_secs: question.time_limit_secs(),
                    });
                }
            }
            Ok(AnswerStep::Completed { assessment, .. }) => self.emit(DriverEvent::Completed {
                final_score: assessment.final_score(),
            }),
            Err(InterviewError::ScoringFailed { index, source }) => {
                self.emit(DriverEvent::ScoringFailed {
                    index: *index,
                    message: source.to_string(),
                });
            }
            Err(InterviewError::SummaryFailed(source)) => self.emit(DriverEvent::SummaryFailed {
                message: source.to_string(),
            }),
            Err(_) => {}
        }
    }

    fn emit(&self, event: DriverEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    //
    // ─── TICKER ───────────────────────────────────────────────────────────────
    //

    /// Make the ticker match the countdown: one ticker per running activation.
    fn sync_ticker(&mut self) {
        let wanted = self.machine.running_activation();
        if self.ticker.as_ref().map(|t| t.signal.activation) == wanted {
            return;
        }
        self.stop_ticker();
        if let Some(activation) = wanted {
            self.generation += 1;
            let signal = TickSignal {
                activation,
                generation: self.generation,
            };
            let task = spawn_ticker(signal, self.tick_tx.clone());
            self.ticker = Some(Ticker { signal, task });
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.task.abort();
        }
    }
}

/// First tick fires one period after start.
fn spawn_ticker(signal: TickSignal, tx: mpsc::Sender<TickSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(signal).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use interview_core::model::{
        Answer, AnswerScore, Candidate, CandidateDraft, CandidateId, Difficulty, NO_ANSWER_PROVIDED,
        ParsedResume, Question, QuestionId, QuestionSequence,
    };
    use interview_core::time::fixed_now;
    use storage::repository::{CandidateRepository, InMemoryRepository, SessionRepository};

    use crate::Clock;
    use crate::error::OracleError;
    use crate::oracle::InterviewOracle;

    struct ScriptedOracle {
        limits: Vec<u32>,
        failing_scores: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(limits: &[u32]) -> Self {
            Self {
                limits: limits.to_vec(),
                failing_scores: AtomicUsize::new(0),
            }
        }

        fn failing_first(self, n: usize) -> Self {
            self.failing_scores.store(n, Ordering::SeqCst);
            self
        }
    }

    #[async_trait]
    impl InterviewOracle for ScriptedOracle {
        async fn generate_questions(&self, _: &str) -> Result<QuestionSequence, OracleError> {
            let questions = self
                .limits
                .iter()
                .enumerate()
                .map(|(i, limit)| {
                    Question::new(
                        QuestionId::new(format!("q{}", i + 1)),
                        format!("Question {}", i + 1),
                        Difficulty::Medium,
                        *limit,
                    )
                    .map_err(|e| OracleError::Malformed(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            QuestionSequence::new(questions).map_err(|e| OracleError::Malformed(e.to_string()))
        }

        async fn score_answer(
            &self,
            _: &Question,
            _: &str,
            _: u32,
        ) -> Result<AnswerScore, OracleError> {
            let left = self.failing_scores.load(Ordering::SeqCst);
            if left > 0 {
                self.failing_scores.store(left - 1, Ordering::SeqCst);
                return Err(OracleError::Unavailable("scoring backend down".into()));
            }
            Ok(AnswerScore::new(6, "fine"))
        }

        async fn summarize(&self, answers: &[Answer]) -> Result<FinalAssessment, OracleError> {
            Ok(FinalAssessment::new(
                u8::try_from(answers.len() * 10).unwrap_or(100),
                "done",
            ))
        }
    }

    fn candidate() -> Candidate {
        CandidateDraft::from_resume(ParsedResume {
            name: Some("Jane Doe".into()),
            email: Some("jane@example.com".into()),
            phone: Some("555-123-4567".into()),
            text: "resume".into(),
        })
        .finalize(CandidateId::generate(), fixed_now())
        .unwrap()
    }

    async fn spawn(
        oracle: ScriptedOracle,
        repo: &InMemoryRepository,
    ) -> (SessionHandle, CandidateId) {
        let service = Arc::new(InterviewLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(oracle),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        ));
        let candidate = candidate();
        let id = candidate.id();
        let machine = service.begin(candidate).await.unwrap();
        (SessionDriver::spawn(service, machine), id)
    }

    async fn wait_for(
        events: &mut broadcast::Receiver<DriverEvent>,
        matches: impl Fn(&DriverEvent) -> bool,
    ) -> DriverEvent {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("driver closed"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn manual_answer_then_timeout_completes_session() {
        let repo = InMemoryRepository::new();
        let (handle, id) = spawn(ScriptedOracle::new(&[20, 60]), &repo).await;
        let mut events = handle.subscribe();

        time::sleep(Duration::from_millis(5_500)).await;
        let step = handle.submit(0, "Ownership moves values").await.unwrap();
        let AnswerStep::Advanced { answer, next_index, .. } = step else {
            panic!("expected to advance, got {step:?}");
        };
        assert_eq!(answer.time_spent_secs(), 5);
        assert_eq!(next_index, 1);
        assert_eq!(handle.progress().await.unwrap().time_remaining, 60);

        wait_for(&mut events, |e| matches!(e, DriverEvent::Completed { .. })).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Completed);
        assert_eq!(snapshot.answers.len(), 2);
        assert_eq!(snapshot.answers[1].answer_text(), NO_ANSWER_PROVIDED);
        assert_eq!(snapshot.answers[1].time_spent_secs(), 60);
        assert_eq!(snapshot.answers[1].source(), AnswerSource::Timeout);
        assert_eq!(snapshot.total_time_spent, 65);

        let record = repo.get_candidate(id).await.unwrap();
        assert_eq!(record.result.map(|r| r.final_score), Some(20));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_conserve_remaining_time() {
        let repo = InMemoryRepository::new();
        let (handle, _) = spawn(ScriptedOracle::new(&[20]), &repo).await;
        let mut events = handle.subscribe();

        time::sleep(Duration::from_millis(8_500)).await;
        assert_eq!(handle.pause().await.unwrap(), 12);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.progress().await.unwrap().time_remaining, 12);

        let resumed_at = Instant::now();
        handle.resume().await.unwrap();
        wait_for(&mut events, |e| {
            matches!(e, DriverEvent::AnswerRecorded {
                source: AnswerSource::Timeout,
                ..
            })
        })
        .await;
        assert_eq!(resumed_at.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn page_hidden_is_acknowledged_after_save() {
        let repo = InMemoryRepository::new();
        let (handle, id) = spawn(ScriptedOracle::new(&[20, 60]), &repo).await;

        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(handle.page_hidden().await.unwrap(), Some(17));
        assert_eq!(handle.page_hidden().await.unwrap(), None);

        let saved = repo.load_snapshot(id).await.unwrap().unwrap();
        assert_eq!(saved.phase, Phase::Paused);
        assert_eq!(saved.persisted_time_remaining, 17);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_handle_pauses_and_saves() {
        let repo = InMemoryRepository::new();
        let (handle, id) = spawn(ScriptedOracle::new(&[20]), &repo).await;

        time::sleep(Duration::from_millis(4_500)).await;
        drop(handle);
        time::sleep(Duration::from_millis(10)).await;

        let saved = repo.load_snapshot(id).await.unwrap().unwrap();
        assert_eq!(saved.phase, Phase::Paused);
        assert_eq!(saved.persisted_time_remaining, 16);
    }

    #[tokio::test(start_paused = true)]
    async fn scoring_failure_is_retried_without_double_append() {
        let repo = InMemoryRepository::new();
        let (handle, _) = spawn(ScriptedOracle::new(&[20, 60]).failing_first(1), &repo).await;
        let mut events = handle.subscribe();

        let err = handle.submit(0, "first answer").await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Interview(InterviewError::ScoringFailed { index: 0, .. })
        ));
        wait_for(&mut events, |e| matches!(e, DriverEvent::ScoringFailed { index: 0, .. })).await;

        // A second submit for the claimed question is ignored.
        let step = handle.submit(0, "second try").await.unwrap();
        assert_eq!(step, AnswerStep::Ignored { index: 0 });

        let step = handle.retry_pending().await.unwrap();
        assert!(matches!(step, AnswerStep::Advanced { next_index: 1, .. }));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.answers.len(), 1);
        assert_eq!(snapshot.answers[0].answer_text(), "first answer");
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_for_expired_question_is_ignored() {
        let repo = InMemoryRepository::new();
        let (handle, _) = spawn(ScriptedOracle::new(&[2, 60]), &repo).await;
        let mut events = handle.subscribe();

        assert_eq!(handle.progress().await.unwrap().current_index, 0);
        wait_for(&mut events, |e| matches!(e, DriverEvent::QuestionStarted { index: 1, .. })).await;

        let step = handle.submit(0, "answer meant for q1").await.unwrap();
        assert_eq!(step, AnswerStep::Ignored { index: 1 });

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.answers.len(), 1);
        assert_eq!(snapshot.answers[0].answer_text(), NO_ANSWER_PROVIDED);
        assert!(snapshot.pending.is_none());

        // The next question keeps counting after the ignored submit.
        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(handle.progress().await.unwrap().time_remaining, 57);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_records_draft_text() {
        let repo = InMemoryRepository::new();
        let (handle, _) = spawn(ScriptedOracle::new(&[3, 60]), &repo).await;
        let mut events = handle.subscribe();

        handle.update_draft("half an answer").await.unwrap();
        wait_for(&mut events, |e| matches!(e, DriverEvent::QuestionStarted { index: 1, .. })).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.answers[0].answer_text(), "half an answer");
        assert_eq!(snapshot.answers[0].time_spent_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn end_discards_snapshot_and_stops_driver() {
        let repo = InMemoryRepository::new();
        let (handle, id) = spawn(ScriptedOracle::new(&[20]), &repo).await;

        handle.end().await.unwrap();
        assert!(repo.load_snapshot(id).await.unwrap().is_none());
        assert!(matches!(handle.pause().await, Err(DriverError::Closed)));
    }
}
