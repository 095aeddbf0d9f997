use chrono::{DateTime, Utc};
use tracing::debug;

use crate::countdown::{Activation, Countdown, Tick};
use crate::model::{
    Answer, AnswerScore, AnswerSource, Candidate, FinalAssessment, NO_ANSWER_PROVIDED,
    PendingAnswer, Phase, Question, QuestionSequence, Session, SessionError, SessionProgress,
    SessionSnapshot,
};
use crate::reconciler::TimeReconciler;

//
// ─── OUTCOMES ─────────────────────────────────────────────────────────────────
//

/// Result of a submit or timeout signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The current question is now claimed; score it and call `record_scored`.
    Claimed(PendingAnswer),
    /// The question was already claimed or answered; nothing changed.
    Ignored { index: usize },
}

/// Result of one elapsed second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown is running.
    Idle,
    /// `persist` is set when the reconciler wrote `remaining` through to the session.
    Counting { remaining: u32, persist: bool },
    /// The countdown expired and the question was auto-submitted.
    Expired(PendingAnswer),
}

/// What happened after a scored answer was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion { index: usize, activation: Activation },
    /// Last answer appended; the session waits for `complete`.
    AwaitingSummary,
}

//
// ─── MACHINE ──────────────────────────────────────────────────────────────────
//

/// Owns a `Session` together with its countdown and applies every transition.
///
/// Answer commits are two-step: `submit`/`timeout`/`tick` claim the current
/// question, then `record_scored` appends the scored `Answer` and advances.
/// A claimed question ignores further commits, which is what makes a submit
/// racing a timeout produce exactly one answer.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    session: Session,
    countdown: Countdown,
    reconciler: TimeReconciler,
    draft: String,
}

impl SessionMachine {
    #[must_use]
    pub fn new(candidate: Candidate) -> Self {
        Self {
            session: Session::new(candidate),
            countdown: Countdown::new(),
            reconciler: TimeReconciler::default(),
            draft: String::new(),
        }
    }

    #[must_use]
    pub fn with_reconciler(mut self, reconciler: TimeReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Rebuild a machine from a persisted snapshot.
    ///
    /// The countdown is seeded from `persisted_time_remaining`. An `Active`
    /// session resumes ticking; a `Paused` one stays frozen until `resume`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPersistedState` for inconsistent snapshots.
    pub fn restore(
        snapshot: SessionSnapshot,
        mut reconciler: TimeReconciler,
    ) -> Result<Self, SessionError> {
        let session = Session::from_snapshot(snapshot)?;
        let mut countdown = Countdown::new();

        if session.phase.is_unfinished()
            && session.pending.is_none()
            && session.current_question().is_some()
        {
            let seed = reconciler.seed(session.persisted_time_remaining);
            if session.phase == Phase::Active {
                countdown.start(seed);
            } else {
                countdown.load_paused(seed);
            }
        }

        Ok(Self {
            session,
            countdown,
            reconciler,
            draft: String::new(),
        })
    }

    //
    // ─── ACCESSORS ────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingAnswer> {
        self.session.pending.as_ref()
    }

    #[must_use]
    pub fn is_awaiting_summary(&self) -> bool {
        self.session.is_awaiting_summary()
    }

    /// Live countdown value (may be ahead of the persisted value between write-throughs).
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Activation of the running countdown, if one is running.
    #[must_use]
    pub fn running_activation(&self) -> Option<Activation> {
        self.countdown
            .is_running()
            .then(|| self.countdown.activation())
    }

    /// Seconds already spent on the current question.
    #[must_use]
    pub fn elapsed_on_current(&self) -> u32 {
        self.current_question().map_or(0, |q| {
            q.time_limit_secs().saturating_sub(self.countdown.remaining())
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.session.sequence_len();
        let answered = self.session.answers.len();
        SessionProgress {
            phase: self.session.phase,
            total,
            answered,
            remaining_questions: total.saturating_sub(answered),
            current_index: self.session.current_question_index,
            time_remaining: self.countdown.remaining(),
        }
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        self.session.to_snapshot(now)
    }

    /// Text typed so far; used as the answer if the question times out.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    //
    // ─── TRANSITIONS ──────────────────────────────────────────────────────────
    //

    /// `NotStarted → Active` with the first question's countdown running.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `NotStarted`.
    pub fn start(
        &mut self,
        questions: QuestionSequence,
        now: DateTime<Utc>,
    ) -> Result<Activation, SessionError> {
        self.require(Phase::NotStarted, "start")?;

        let first_limit = questions
            .get(0)
            .map(Question::time_limit_secs)
            .ok_or(SessionError::IndexOutOfRange { index: 0, len: 0 })?;

        self.session.questions = Some(questions);
        self.session.current_question_index = 0;
        self.session.phase = Phase::Active;
        self.session.started_at = Some(now);
        self.session.persisted_time_remaining = self.reconciler.rebase(first_limit);
        self.draft.clear();

        Ok(self.countdown.start(first_limit))
    }

    /// `Active → Paused`, snapshotting the live countdown. Pausing twice is a no-op.
    ///
    /// Returns the persisted time remaining.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` before start or after completion.
    pub fn pause(&mut self) -> Result<u32, SessionError> {
        match self.session.phase {
            Phase::Paused => Ok(self.session.persisted_time_remaining),
            Phase::Active => {
                let remaining = self.countdown.pause();
                if self.is_counting_question() {
                    self.session.persisted_time_remaining = self.reconciler.force(remaining);
                }
                self.session.phase = Phase::Paused;
                Ok(self.session.persisted_time_remaining)
            }
            phase => Err(SessionError::InvalidPhase {
                operation: "pause",
                phase,
            }),
        }
    }

    /// Page-hide / unload signal: pause-and-snapshot if active, otherwise nothing.
    ///
    /// Returns the persisted value when a pause happened.
    pub fn page_hidden(&mut self) -> Option<u32> {
        if self.session.phase == Phase::Active {
            self.pause().ok()
        } else {
            None
        }
    }

    /// `Paused → Active`, continuing from the persisted value. Resuming an active
    /// session is a no-op.
    ///
    /// Returns the activation of the countdown when one is running again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` before start or after completion.
    pub fn resume(&mut self) -> Result<Option<Activation>, SessionError> {
        match self.session.phase {
            Phase::Active => Ok(self.running_activation()),
            Phase::Paused => {
                self.session.phase = Phase::Active;
                if self.is_counting_question() {
                    let persisted = self.session.persisted_time_remaining;
                    if self.countdown.remaining() != persisted {
                        self.countdown.load_paused(self.reconciler.seed(persisted));
                    }
                    self.countdown.resume();
                }
                Ok(self.running_activation())
            }
            phase => Err(SessionError::InvalidPhase {
                operation: "resume",
                phase,
            }),
        }
    }

    /// Account for one elapsed second. Expiry auto-submits the current question.
    pub fn tick(&mut self) -> TickOutcome {
        if self.session.phase != Phase::Active {
            return TickOutcome::Idle;
        }
        match self.countdown.tick() {
            Tick::Inactive => TickOutcome::Idle,
            Tick::Counting { remaining } => {
                let persist = match self.reconciler.observe_tick(remaining) {
                    Some(value) => {
                        self.session.persisted_time_remaining = value;
                        true
                    }
                    None => false,
                };
                TickOutcome::Counting { remaining, persist }
            }
            Tick::Expired(activation) => {
                if let Some(value) = self.reconciler.observe_tick(0) {
                    self.session.persisted_time_remaining = value;
                }
                match self.timeout(activation) {
                    Ok(CommitOutcome::Claimed(pending)) => TickOutcome::Expired(pending),
                    _ => TickOutcome::Idle,
                }
            }
        }
    }

    /// Manual submission for question `index`, which must be the current one.
    ///
    /// An answer aimed at a question the session has already moved past is
    /// ignored rather than claimed against the next one. `time_spent_secs` is
    /// capped at the question's limit. Blank text is accepted here; rejecting
    /// it is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Active`.
    pub fn submit(
        &mut self,
        index: usize,
        answer_text: impl Into<String>,
        time_spent_secs: u32,
    ) -> Result<CommitOutcome, SessionError> {
        self.require(Phase::Active, "submit")?;
        if index != self.session.current_question_index {
            return Ok(self.ignored("submit for another question"));
        }
        let Some(limit) = self.claimable_limit() else {
            return Ok(self.ignored("submit"));
        };
        Ok(self.claim(
            answer_text.into(),
            time_spent_secs.min(limit),
            AnswerSource::Manual,
        ))
    }

    /// Timeout signal for the countdown activation that expired.
    ///
    /// Always records the full time limit as time spent. Stale activations and
    /// already-claimed questions are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Active`.
    pub fn timeout(&mut self, activation: Activation) -> Result<CommitOutcome, SessionError> {
        self.require(Phase::Active, "timeout")?;
        if activation != self.countdown.activation() {
            return Ok(self.ignored("stale timeout"));
        }
        let Some(limit) = self.claimable_limit() else {
            return Ok(self.ignored("timeout"));
        };
        let text = if self.draft.trim().is_empty() {
            NO_ANSWER_PROVIDED.to_string()
        } else {
            std::mem::take(&mut self.draft)
        };
        Ok(self.claim(text, limit, AnswerSource::Timeout))
    }

    /// Append the scored answer for the claimed question and advance.
    ///
    /// On the last question the session stays `Active` with every answer
    /// recorded until `complete` succeeds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoPendingAnswer` / `StaleCommit` when `index` does
    /// not match the claim, and `DuplicateAnswer` if the question is already answered.
    pub fn record_scored(
        &mut self,
        index: usize,
        score: AnswerScore,
    ) -> Result<Advance, SessionError> {
        let pending_index = self
            .session
            .pending
            .as_ref()
            .map(|p| p.index)
            .ok_or(SessionError::NoPendingAnswer)?;
        if pending_index != index {
            return Err(SessionError::StaleCommit {
                pending: pending_index,
                requested: index,
            });
        }

        let len = self.session.sequence_len();
        let question = self
            .session
            .questions
            .as_ref()
            .and_then(|q| q.get(index))
            .cloned()
            .ok_or(SessionError::IndexOutOfRange { index, len })?;
        if self
            .session
            .answers
            .iter()
            .any(|a| a.question_id() == question.id())
        {
            return Err(SessionError::DuplicateAnswer(question.id().clone()));
        }

        let Some(pending) = self.session.pending.take() else {
            return Err(SessionError::NoPendingAnswer);
        };
        let answer = Answer::from_pending(&question, pending, score);
        self.session.total_time_spent = self
            .session
            .total_time_spent
            .saturating_add(answer.time_spent_secs());
        self.session.answers.push(answer);
        self.session.current_question_index = index + 1;
        self.draft.clear();

        match self.session.current_question().map(Question::time_limit_secs) {
            Some(limit) => {
                self.session.persisted_time_remaining = self.reconciler.rebase(limit);
                let activation = if self.session.phase == Phase::Active {
                    self.countdown.start(limit)
                } else {
                    self.countdown.load_paused(limit)
                };
                Ok(Advance::NextQuestion {
                    index: index + 1,
                    activation,
                })
            }
            None => {
                self.countdown.stop();
                self.session.persisted_time_remaining = self.reconciler.rebase(0);
                Ok(Advance::AwaitingSummary)
            }
        }
    }

    /// Apply the final assessment and move to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SummaryNotReady` until every answer is recorded and
    /// `InvalidPhase` if the session is not unfinished.
    pub fn complete(
        &mut self,
        assessment: FinalAssessment,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if !self.session.phase.is_unfinished() {
            return Err(SessionError::InvalidPhase {
                operation: "complete",
                phase: self.session.phase,
            });
        }
        if !self.session.is_awaiting_summary() {
            return Err(SessionError::SummaryNotReady {
                expected: self.session.sequence_len(),
                recorded: self.session.answers.len(),
            });
        }
        self.countdown.stop();
        self.session.final_assessment = Some(assessment);
        self.session.completed_at = Some(now);
        self.session.persisted_time_remaining = 0;
        self.session.phase = Phase::Completed;
        Ok(())
    }

    /// Discard the session and start over in `NotStarted` for the same applicant.
    ///
    /// Returns the discarded session.
    pub fn end(&mut self) -> Session {
        self.countdown.stop();
        self.draft.clear();
        let fresh = Session::new(self.session.candidate.clone());
        std::mem::replace(&mut self.session, fresh)
    }

    //
    // ─── HELPERS ──────────────────────────────────────────────────────────────
    //

    fn require(&self, phase: Phase, operation: &'static str) -> Result<(), SessionError> {
        if self.session.phase == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                operation,
                phase: self.session.phase,
            })
        }
    }

    /// A question is being counted down: assigned, unanswered, unclaimed.
    fn is_counting_question(&self) -> bool {
        self.session.pending.is_none() && self.session.current_question().is_some()
    }

    fn claimable_limit(&self) -> Option<u32> {
        if self.session.pending.is_some() {
            return None;
        }
        self.session
            .current_question()
            .map(Question::time_limit_secs)
    }

    fn claim(
        &mut self,
        answer_text: String,
        time_spent_secs: u32,
        source: AnswerSource,
    ) -> CommitOutcome {
        let index = self.session.current_question_index;
        let Some(question) = self.session.current_question() else {
            return CommitOutcome::Ignored { index };
        };
        let pending = PendingAnswer {
            index,
            question_id: question.id().clone(),
            answer_text,
            time_spent_secs,
            source,
        };
        let remaining = self.countdown.remaining();
        self.countdown.stop();
        self.session.persisted_time_remaining = self.reconciler.force(remaining);
        self.session.pending = Some(pending.clone());
        self.draft.clear();
        CommitOutcome::Claimed(pending)
    }

    fn ignored(&self, signal: &'static str) -> CommitOutcome {
        let index = self.session.current_question_index;
        debug!(index, signal, "ignoring commit for an already claimed question");
        CommitOutcome::Ignored { index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateDraft, CandidateId, Difficulty, ParsedResume, QuestionId};
    use crate::time::fixed_now;
    use std::num::NonZeroU32;

    fn candidate() -> Candidate {
        CandidateDraft::from_resume(ParsedResume {
            name: Some("Grace Hopper".into()),
            email: Some("grace@example.com".into()),
            phone: Some("+1-555-123-4567".into()),
            text: "COBOL".into(),
        })
        .finalize(CandidateId::generate(), fixed_now())
        .unwrap()
    }

    fn sequence(limits: &[(&str, u32)]) -> QuestionSequence {
        QuestionSequence::new(
            limits
                .iter()
                .map(|(id, limit)| {
                    let id = QuestionId::new(*id);
                    let text = format!("about {}", id.as_str());
                    Question::new(id, text, Difficulty::Easy, *limit).unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    fn six_questions() -> QuestionSequence {
        sequence(&[
            ("q1", 20),
            ("q2", 20),
            ("q3", 60),
            ("q4", 60),
            ("q5", 120),
            ("q6", 120),
        ])
    }

    fn started(questions: QuestionSequence) -> SessionMachine {
        let mut machine = SessionMachine::new(candidate());
        machine.start(questions, fixed_now()).unwrap();
        machine
    }

    fn claimed(outcome: CommitOutcome) -> PendingAnswer {
        match outcome {
            CommitOutcome::Claimed(pending) => pending,
            CommitOutcome::Ignored { index } => panic!("commit for {index} was ignored"),
        }
    }

    fn run_until_expired(machine: &mut SessionMachine, limit: u32) -> (u32, PendingAnswer) {
        for n in 1..=limit {
            if let TickOutcome::Expired(pending) = machine.tick() {
                return (n, pending);
            }
        }
        panic!("countdown did not expire within {limit} ticks");
    }

    #[test]
    fn start_seeds_first_question() {
        let machine = started(six_questions());
        assert_eq!(machine.phase(), Phase::Active);
        assert_eq!(machine.session().current_question_index(), 0);
        assert_eq!(machine.time_remaining(), 20);
        assert_eq!(machine.session().persisted_time_remaining(), 20);
        assert!(machine.running_activation().is_some());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut machine = started(six_questions());
        let err = machine.start(six_questions(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPhase { operation: "start", .. }));
    }

    #[test]
    fn manual_then_timeout_scenario() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 60)]));
        for _ in 0..5 {
            machine.tick();
        }
        let elapsed = machine.elapsed_on_current();
        let pending = claimed(machine.submit(0, "borrowing rules", elapsed).unwrap());
        assert_eq!(pending.time_spent_secs, 5);

        let advance = machine.record_scored(0, AnswerScore::new(5, "ok")).unwrap();
        assert!(matches!(advance, Advance::NextQuestion { index: 1, .. }));
        assert_eq!(machine.session().answers()[0].time_spent_secs(), 5);
        assert_eq!(machine.time_remaining(), 60);
        assert_eq!(machine.session().persisted_time_remaining(), 60);

        let (ticks, pending) = run_until_expired(&mut machine, 200);
        assert_eq!(ticks, 60);
        assert_eq!(pending.answer_text, NO_ANSWER_PROVIDED);
        assert_eq!(pending.time_spent_secs, 60);
        assert_eq!(pending.source, AnswerSource::Timeout);

        let advance = machine.record_scored(1, AnswerScore::new(2, "brief")).unwrap();
        assert_eq!(advance, Advance::AwaitingSummary);
        assert_eq!(machine.phase(), Phase::Active);

        machine
            .complete(FinalAssessment::new(35, "summary"), fixed_now())
            .unwrap();
        assert_eq!(machine.phase(), Phase::Completed);
        assert_eq!(machine.session().total_time_spent(), 65);
    }

    #[test]
    fn timeout_uses_text_typed_so_far() {
        let mut machine = started(sequence(&[("q1", 3)]));
        machine.update_draft("partial thought");
        let (_, pending) = run_until_expired(&mut machine, 10);
        assert_eq!(pending.answer_text, "partial thought");
        assert_eq!(pending.time_spent_secs, 3);
    }

    #[test]
    fn submit_and_timeout_race_commits_once() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 20)]));
        let activation = machine.running_activation().unwrap();

        claimed(machine.submit(0, "answer", 4).unwrap());
        assert_eq!(
            machine.timeout(activation).unwrap(),
            CommitOutcome::Ignored { index: 0 }
        );
        assert_eq!(
            machine.submit(0, "again", 5).unwrap(),
            CommitOutcome::Ignored { index: 0 }
        );

        machine.record_scored(0, AnswerScore::new(5, "ok")).unwrap();
        assert_eq!(machine.session().answers().len(), 1);
        assert!(matches!(
            machine.record_scored(0, AnswerScore::new(5, "ok")),
            Err(SessionError::NoPendingAnswer)
        ));
        assert_eq!(machine.session().answers().len(), 1);
    }

    #[test]
    fn timeout_first_then_submit_is_ignored() {
        let mut machine = started(sequence(&[("q1", 2), ("q2", 20)]));
        run_until_expired(&mut machine, 5);
        assert_eq!(
            machine.submit(0, "late", 1).unwrap(),
            CommitOutcome::Ignored { index: 0 }
        );
    }

    #[test]
    fn submit_for_expired_question_is_not_claimed_against_next() {
        let mut machine = started(sequence(&[("q1", 2), ("q2", 60)]));
        let (_, pending) = run_until_expired(&mut machine, 5);
        machine
            .record_scored(pending.index, AnswerScore::new(0, "none"))
            .unwrap();
        assert_eq!(machine.session().current_question_index(), 1);

        assert_eq!(
            machine.submit(0, "meant for q1", 1).unwrap(),
            CommitOutcome::Ignored { index: 1 }
        );
        assert!(machine.pending().is_none());
        assert_eq!(machine.time_remaining(), 60);
        assert!(machine.running_activation().is_some());
    }

    #[test]
    fn stale_activation_timeout_is_ignored_after_advance() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 20)]));
        let first = machine.running_activation().unwrap();
        claimed(machine.submit(0, "a", 1).unwrap());
        machine.record_scored(0, AnswerScore::new(5, "ok")).unwrap();

        assert_eq!(
            machine.timeout(first).unwrap(),
            CommitOutcome::Ignored { index: 1 }
        );
        assert!(machine.pending().is_none());
    }

    #[test]
    fn index_is_monotonic_and_bounded() {
        let mut machine = started(six_questions());
        for expected in 0..6 {
            assert_eq!(machine.session().current_question_index(), expected);
            let text = format!("answer {expected}");
            let pending = claimed(machine.submit(expected, text, 1).unwrap());
            machine
                .record_scored(pending.index, AnswerScore::new(6, "fine"))
                .unwrap();
            assert_eq!(machine.session().current_question_index(), expected + 1);
            assert_eq!(machine.session().answers().len(), expected + 1);
        }
        assert_eq!(
            machine.submit(6, "extra", 1).unwrap(),
            CommitOutcome::Ignored { index: 6 }
        );
        assert_eq!(machine.session().current_question_index(), 6);
    }

    #[test]
    fn completes_only_after_last_answer() {
        let mut machine = started(six_questions());
        for i in 0..5 {
            claimed(machine.submit(i, "x", 1).unwrap());
            machine.record_scored(i, AnswerScore::new(5, "ok")).unwrap();
            assert!(matches!(
                machine.complete(FinalAssessment::new(50, "early"), fixed_now()),
                Err(SessionError::SummaryNotReady { .. })
            ));
            assert!(machine.session().final_assessment().is_none());
        }
        claimed(machine.submit(5, "x", 1).unwrap());
        machine.record_scored(5, AnswerScore::new(5, "ok")).unwrap();
        assert!(machine.is_awaiting_summary());
        assert!(machine.session().final_assessment().is_none());

        machine
            .complete(FinalAssessment::new(50, "done"), fixed_now())
            .unwrap();
        assert!(machine.session().is_complete());
        assert_eq!(machine.session().final_assessment().unwrap().final_score(), 50);
        assert_eq!(machine.session().completed_at(), Some(fixed_now()));
    }

    #[test]
    fn completion_retry_after_failure_keeps_answers() {
        let mut machine = started(sequence(&[("q1", 20)]));
        claimed(machine.submit(0, "x", 1).unwrap());
        machine.record_scored(0, AnswerScore::new(5, "ok")).unwrap();

        // Summary call failed: nothing applied, retry later.
        assert_eq!(machine.phase(), Phase::Active);
        assert_eq!(machine.session().answers().len(), 1);
        assert_eq!(
            machine.submit(1, "retry", 1).unwrap(),
            CommitOutcome::Ignored { index: 1 }
        );

        machine
            .complete(FinalAssessment::new(60, "ok"), fixed_now())
            .unwrap();
        assert!(matches!(
            machine.complete(FinalAssessment::new(60, "ok"), fixed_now()),
            Err(SessionError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn pause_resume_conserves_time() {
        let mut machine = started(sequence(&[("q1", 20)]));
        for _ in 0..8 {
            machine.tick();
        }
        assert_eq!(machine.pause().unwrap(), 12);
        for _ in 0..30 {
            assert_eq!(machine.tick(), TickOutcome::Idle);
        }
        machine.resume().unwrap();
        let (ticks, _) = run_until_expired(&mut machine, 100);
        assert_eq!(ticks, 12);
    }

    #[test]
    fn paused_restore_stays_frozen_until_resume() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 60)]));
        for _ in 0..8 {
            machine.tick();
        }
        machine.pause().unwrap();
        let snapshot = machine.snapshot(fixed_now());
        assert_eq!(snapshot.persisted_time_remaining, 12);

        let mut restored = SessionMachine::restore(snapshot, TimeReconciler::default()).unwrap();
        assert_eq!(restored.phase(), Phase::Paused);
        assert_eq!(restored.time_remaining(), 12);
        assert_eq!(restored.tick(), TickOutcome::Idle);
        assert_eq!(restored.time_remaining(), 12);

        restored.resume().unwrap();
        let (ticks, _) = run_until_expired(&mut restored, 100);
        assert_eq!(ticks, 12);
    }

    #[test]
    fn active_restore_uses_persisted_value_not_full_limit() {
        let reconciler = TimeReconciler::new(NonZeroU32::new(5).unwrap());
        let mut machine = SessionMachine::new(candidate()).with_reconciler(reconciler.clone());
        machine.start(sequence(&[("q1", 20)]), fixed_now()).unwrap();
        for _ in 0..10 {
            machine.tick();
        }
        let snapshot = machine.snapshot(fixed_now());
        assert_eq!(snapshot.persisted_time_remaining, 10);

        let restored = SessionMachine::restore(snapshot, reconciler).unwrap();
        assert_eq!(restored.phase(), Phase::Active);
        assert_eq!(restored.time_remaining(), 10);
        assert!(restored.running_activation().is_some());
    }

    #[test]
    fn periodic_write_through_flags_persist() {
        let reconciler = TimeReconciler::new(NonZeroU32::new(2).unwrap());
        let mut machine = SessionMachine::new(candidate()).with_reconciler(reconciler);
        machine.start(sequence(&[("q1", 20)]), fixed_now()).unwrap();

        assert_eq!(
            machine.tick(),
            TickOutcome::Counting {
                remaining: 19,
                persist: false
            }
        );
        assert_eq!(
            machine.tick(),
            TickOutcome::Counting {
                remaining: 18,
                persist: true
            }
        );
        assert_eq!(machine.session().persisted_time_remaining(), 18);
    }

    #[test]
    fn page_hidden_pauses_only_when_active() {
        let mut machine = started(sequence(&[("q1", 20)]));
        machine.tick();
        assert_eq!(machine.page_hidden(), Some(19));
        assert_eq!(machine.phase(), Phase::Paused);
        assert_eq!(machine.page_hidden(), None);
    }

    #[test]
    fn submit_while_paused_is_rejected() {
        let mut machine = started(sequence(&[("q1", 20)]));
        machine.pause().unwrap();
        assert!(matches!(
            machine.submit(0, "x", 1),
            Err(SessionError::InvalidPhase { operation: "submit", phase: Phase::Paused })
        ));
    }

    #[test]
    fn pending_survives_snapshot_and_blocks_countdown() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 20)]));
        claimed(machine.submit(0, "x", 3).unwrap());
        let snapshot = machine.snapshot(fixed_now());

        let mut restored = SessionMachine::restore(snapshot, TimeReconciler::default()).unwrap();
        assert!(restored.pending().is_some());
        assert_eq!(restored.tick(), TickOutcome::Idle);
        assert_eq!(
            restored.submit(0, "y", 1).unwrap(),
            CommitOutcome::Ignored { index: 0 }
        );
        restored.record_scored(0, AnswerScore::new(4, "ok")).unwrap();
        assert_eq!(restored.time_remaining(), 20);
    }

    #[test]
    fn scoring_while_paused_loads_next_question_frozen() {
        let mut machine = started(sequence(&[("q1", 20), ("q2", 30)]));
        claimed(machine.submit(0, "x", 3).unwrap());
        machine.pause().unwrap();
        machine.record_scored(0, AnswerScore::new(4, "ok")).unwrap();

        assert_eq!(machine.time_remaining(), 30);
        assert_eq!(machine.tick(), TickOutcome::Idle);
        machine.resume().unwrap();
        assert!(matches!(machine.tick(), TickOutcome::Counting { remaining: 29, .. }));
    }

    #[test]
    fn end_discards_session() {
        let mut machine = started(sequence(&[("q1", 20)]));
        machine.tick();
        let discarded = machine.end();
        assert_eq!(discarded.phase(), Phase::Active);
        assert_eq!(machine.phase(), Phase::NotStarted);
        assert_eq!(machine.tick(), TickOutcome::Idle);
        assert!(machine.session().answers().is_empty());
    }
}
