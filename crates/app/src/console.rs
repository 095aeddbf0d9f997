//! Line-oriented terminal front end for one interview.

use std::collections::BTreeSet;
use std::future::Future;
use std::io::Write as _;

use anyhow::{Context, Result};
use interview_core::model::{
    Candidate, CandidateDraft, Phase, ProfileError, ProfileField, ProfileUpdate,
    SessionSnapshot,
};
use interview_core::SessionMachine;
use services::{
    AnswerStep, AppServices, DriverError, DriverEvent, IntakeError, Registration, SessionDriver,
    SessionHandle,
};
use tokio::io::{AsyncBufRead, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;

pub type InputLines = Lines<BufReader<Stdin>>;

const HELP: &str = "Type your answer and press Enter. Commands: \
:pause  :resume  :retry  :quit (save and exit)  :end (discard)";

/// Whether the tick line for `remaining` is worth printing.
fn announce_tick(remaining: u32) -> bool {
    remaining > 0 && (remaining <= 5 || remaining % 15 == 0)
}

fn fields_to_fix(err: &ProfileError) -> Option<BTreeSet<ProfileField>> {
    match err {
        ProfileError::Missing(fields) => Some(fields.clone()),
        ProfileError::InvalidEmail(_) => Some(BTreeSet::from([ProfileField::Email])),
        ProfileError::InvalidPhone(_) => Some(BTreeSet::from([ProfileField::Phone])),
        _ => None,
    }
}

async fn prompt<R>(input: &mut Lines<R>, label: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print!("{label}: ");
        std::io::stdout().flush()?;
        let line = input
            .next_line()
            .await?
            .context("input closed before the profile was complete")?;
        let value = line.trim();
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }
}

enum Exit {
    Completed,
    Detached,
    Discarded,
}

pub struct Console<'a> {
    services: &'a AppServices,
}

impl<'a> Console<'a> {
    pub fn new(services: &'a AppServices) -> Self {
        Self { services }
    }

    /// Parse the resume and collect any contact fields it lacks.
    pub async fn register<R>(
        &self,
        text: &str,
        file_name: Option<&str>,
        input: &mut Lines<R>,
    ) -> Result<Candidate>
    where
        R: AsyncBufRead + Unpin,
    {
        let intake = self.services.intake();
        let parsed = intake.parse(text, file_name)?;

        let (mut draft, mut ask) = match intake.register(parsed.clone()).await {
            Ok(Registration::Ready(candidate)) => return Ok(candidate),
            Ok(Registration::NeedsProfile(draft)) => {
                let missing = draft.missing_fields();
                (draft, missing)
            }
            Err(IntakeError::Profile(err)) => {
                let Some(fields) = fields_to_fix(&err) else {
                    return Err(err.into());
                };
                println!("{err}");
                (CandidateDraft::from_resume(parsed), fields)
            }
            Err(err) => return Err(err.into()),
        };

        println!("Some contact details could not be read from the resume.");
        loop {
            let mut update = ProfileUpdate::default();
            for field in &ask {
                let value = prompt(input, &field.to_string()).await?;
                match field {
                    ProfileField::Name => update.name = Some(value),
                    ProfileField::Email => update.email = Some(value),
                    ProfileField::Phone => update.phone = Some(value),
                }
            }
            draft = draft.apply(update);

            match intake
                .complete_profile(draft.clone(), ProfileUpdate::default())
                .await
            {
                Ok(candidate) => return Ok(candidate),
                Err(IntakeError::Profile(err)) => {
                    println!("{err}");
                    ask = fields_to_fix(&err).ok_or(err)?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Drive a live session until it completes, is discarded, or the user leaves.
    ///
    /// `interrupt` is polled for the whole session; once it resolves the
    /// session is paused, saved and detached.
    pub async fn run_session<R, I>(
        &self,
        machine: SessionMachine,
        input: &mut Lines<R>,
        interrupt: I,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = std::io::Result<()>>,
    {
        let candidate = machine.session().candidate_id();
        let handle = SessionDriver::spawn(self.services.interview_loop(), machine);
        let mut events = handle.subscribe();

        println!("Candidate {candidate}");
        println!("{HELP}");

        if handle.progress().await?.phase == Phase::Paused {
            handle.resume().await?;
        }
        let snapshot = handle.snapshot().await?;
        if snapshot.pending.is_some() || awaiting_summary(&snapshot) {
            self.retry(&handle, &snapshot).await?;
        }
        let mut shown = self.show_question(&handle).await?;
        tokio::pin!(interrupt);

        let exit = loop {
            tokio::select! {
                line = input.next_line() => {
                    let Some(line) = line? else {
                        break Exit::Detached;
                    };
                    match line.trim() {
                        ":pause" => {
                            let remaining = handle.pause().await?;
                            println!("Paused with {remaining}s left. Type :resume to continue.");
                        }
                        ":resume" => {
                            handle.resume().await?;
                        }
                        ":retry" => {
                            let snapshot = handle.snapshot().await?;
                            self.retry(&handle, &snapshot).await?;
                        }
                        ":quit" => break Exit::Detached,
                        ":end" => break Exit::Discarded,
                        "" => println!("An answer cannot be empty."),
                        text => match handle.submit(shown, text).await {
                            Ok(AnswerStep::Completed { .. }) => break Exit::Completed,
                            Ok(AnswerStep::Advanced { next_index, .. }) => shown = next_index,
                            Ok(AnswerStep::Ignored { index }) if index != shown => {
                                println!("That question timed out before your answer arrived.");
                            }
                            Ok(AnswerStep::Ignored { .. }) => {
                                println!("Already answered. Type :retry if scoring failed.");
                            }
                            Err(DriverError::Interview(err)) if err.is_retryable() => {}
                            Err(err) => println!("{err}"),
                        },
                    }
                }
                event = events.recv() => match event {
                    Ok(DriverEvent::Completed { .. }) => break Exit::Completed,
                    Ok(event) => {
                        if let DriverEvent::QuestionStarted { index, .. } = event {
                            shown = index;
                        }
                        self.print_event(&handle, event).await?;
                    }
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break Exit::Detached,
                },
                _ = &mut interrupt => break Exit::Detached,
            }
        };

        match exit {
            Exit::Completed => {
                let snapshot = handle.snapshot().await?;
                self.print_result(&snapshot);
            }
            Exit::Detached => {
                if let Some(remaining) = handle.page_hidden().await? {
                    println!("\nSaved with {remaining}s left on the current question.");
                }
                println!("Continue later with: interview continue --candidate {candidate}");
            }
            Exit::Discarded => {
                handle.end().await?;
                println!("Interview discarded.");
            }
        }
        Ok(())
    }

    async fn retry(&self, handle: &SessionHandle, snapshot: &SessionSnapshot) -> Result<()> {
        let result = if snapshot.pending.is_some() {
            handle.retry_pending().await.map(|_| ())
        } else if awaiting_summary(snapshot) {
            handle.finish().await.map(|_| ())
        } else {
            println!("Nothing to retry.");
            return Ok(());
        };
        match result {
            Ok(()) => Ok(()),
            Err(DriverError::Interview(err)) if err.is_retryable() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Print the current question and return its index.
    async fn show_question(&self, handle: &SessionHandle) -> Result<usize> {
        let snapshot = handle.snapshot().await?;
        let index = snapshot.current_question_index;
        let total = snapshot.questions.as_ref().map_or(0, |q| q.len());
        if let Some(question) = snapshot.questions.as_ref().and_then(|q| q.get(index)) {
            let remaining = handle.progress().await?.time_remaining;
            println!();
            println!(
                "Question {n}/{total} [{difficulty}, {remaining}s left]",
                n = index + 1,
                difficulty = question.difficulty(),
            );
            println!("{}", question.text());
        }
        Ok(index)
    }

    async fn print_event(&self, handle: &SessionHandle, event: DriverEvent) -> Result<()> {
        match event {
            DriverEvent::Tick { remaining } if announce_tick(remaining) => {
                println!("  {remaining}s left");
            }
            DriverEvent::Tick { .. } => {}
            DriverEvent::QuestionStarted { .. } => {
                self.show_question(handle).await?;
            }
            DriverEvent::AnswerRecorded { index, score, source } => {
                println!("Answer {} recorded ({source:?}): {score}/10", index + 1);
            }
            DriverEvent::ScoringFailed { index, message } => {
                println!(
                    "Scoring answer {} failed: {message}. Type :retry to try again.",
                    index + 1
                );
            }
            DriverEvent::SummaryFailed { message } => {
                println!("Final summary failed: {message}. Type :retry to try again.");
            }
            DriverEvent::Paused { .. }
            | DriverEvent::Resumed { .. }
            | DriverEvent::Completed { .. } => {}
        }
        Ok(())
    }

    pub fn print_result(&self, snapshot: &SessionSnapshot) {
        let Some(assessment) = &snapshot.final_assessment else {
            println!("Interview is not complete.");
            return;
        };
        println!();
        println!("Final score: {}/100", assessment.final_score());
        println!("Total time: {}s", snapshot.total_time_spent);
        println!();
        println!("{}", assessment.summary());
    }
}

fn awaiting_summary(snapshot: &SessionSnapshot) -> bool {
    let total = snapshot.questions.as_ref().map_or(0, |q| q.len());
    snapshot.phase.is_unfinished() && total > 0 && snapshot.answers.len() == total
}
