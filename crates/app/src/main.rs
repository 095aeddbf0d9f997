use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use interview_core::model::{CandidateId, Phase};
use services::config::parse_persist_every;
use services::{AppServices, Clock, InterviewConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod console;

use console::{Console, InputLines};

/// Timed technical interviews in the terminal.
#[derive(Parser, Debug)]
#[command(name = "interview", version, about)]
struct Cli {
    /// SQLite database URL or file path [env: INTERVIEW_DB_URL]
    #[arg(long, global = true)]
    db: Option<String>,

    /// Seconds between time-remaining saves while a question is running
    /// [env: INTERVIEW_PERSIST_EVERY_SECS]
    #[arg(long, global = true, value_parser = persist_every_arg)]
    persist_every: Option<NonZeroU32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a plain-text resume and start a new interview
    #[command(alias = "s")]
    Start {
        #[arg(long)]
        resume: PathBuf,
    },
    /// Continue a paused or interrupted interview
    #[command(alias = "c")]
    Continue {
        #[arg(long)]
        candidate: CandidateId,
    },
    /// List interviews that can be continued
    #[command(alias = "l")]
    List,
}

fn persist_every_arg(raw: &str) -> Result<NonZeroU32, String> {
    parse_persist_every(raw).map_err(|e| e.to_string())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its directory so `SQLite` can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<InterviewConfig> {
    let mut config = InterviewConfig::from_env().context("reading INTERVIEW_* settings")?;
    if let Some(db) = &cli.db {
        if db.trim().is_empty() {
            bail!("--db requires a value");
        }
        config = config.with_db_url(db.as_str());
    }
    if let Some(every) = cli.persist_every {
        config = config.with_persist_every(every);
    }
    let db_url = normalize_sqlite_url(&config.db_url);
    Ok(config.with_db_url(db_url))
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(config, Clock::System)
        .await
        .context("opening interview database")?;

    let mut input: InputLines = BufReader::new(tokio::io::stdin()).lines();
    let console = Console::new(&services);

    match cli.command {
        Commands::Start { resume } => {
            let text = tokio::fs::read_to_string(&resume)
                .await
                .with_context(|| format!("reading resume {}", resume.display()))?;
            let file_name = resume.file_name().and_then(|name| name.to_str());
            let candidate = console.register(&text, file_name, &mut input).await?;
            let machine = services.interview_loop().begin(candidate).await?;
            console
                .run_session(machine, &mut input, tokio::signal::ctrl_c())
                .await
        }
        Commands::Continue { candidate } => {
            let machine = services.interview_loop().restore(candidate).await?;
            if machine.phase() == Phase::Completed {
                console.print_result(&machine.snapshot(Clock::System.now()));
                return Ok(());
            }
            console
                .run_session(machine, &mut input, tokio::signal::ctrl_c())
                .await
        }
        Commands::List => {
            let unfinished = services.interview_loop().list_unfinished().await?;
            if unfinished.is_empty() {
                println!("No unfinished interviews.");
            }
            for snapshot in unfinished {
                let total = snapshot.questions.as_ref().map_or(0, |q| q.len());
                println!(
                    "{id}  {name:<24} {phase:<10} {answered}/{total} answered, {remaining}s left  (updated {updated})",
                    id = snapshot.candidate_id(),
                    name = snapshot.candidate.name(),
                    phase = snapshot.phase,
                    answered = snapshot.answers.len(),
                    remaining = snapshot.persisted_time_remaining,
                    updated = snapshot.updated_at.format("%Y-%m-%d %H:%M"),
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
