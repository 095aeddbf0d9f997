use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::config::InterviewConfig;
use crate::error::AppServicesError;
use crate::intake::IntakeService;
use crate::oracle::{HeuristicOracle, InterviewOracle, RemoteOracle};
use crate::sessions::InterviewLoopService;

/// Assembles app-facing services over one storage backend and oracle.
#[derive(Clone)]
pub struct AppServices {
    config: InterviewConfig,
    intake: Arc<IntakeService>,
    interview_loop: Arc<InterviewLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage at `config.db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        config: InterviewConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Ok(Self::from_storage(&storage, config, clock))
    }

    /// Build services over in-memory storage. Nothing survives the process.
    #[must_use]
    pub fn in_memory(config: InterviewConfig, clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), config, clock)
    }

    /// Build services over an existing storage aggregate.
    #[must_use]
    pub fn from_storage(storage: &Storage, config: InterviewConfig, clock: Clock) -> Self {
        let oracle: Arc<dyn InterviewOracle> = match &config.oracle {
            Some(oracle) => {
                info!(base_url = %oracle.base_url, model = %oracle.model, "using remote oracle");
                Arc::new(RemoteOracle::new(Some(oracle.clone())))
            }
            None => {
                info!("no oracle configured; using built-in questions and scoring");
                Arc::new(HeuristicOracle::new().with_shuffle(!clock.is_fixed()))
            }
        };
        Self::with_oracle(storage, config, clock, oracle)
    }

    /// Build services with an explicit oracle.
    #[must_use]
    pub fn with_oracle(
        storage: &Storage,
        config: InterviewConfig,
        clock: Clock,
        oracle: Arc<dyn InterviewOracle>,
    ) -> Self {
        let intake = Arc::new(IntakeService::new(clock, Arc::clone(&storage.candidates)));
        let interview_loop = Arc::new(
            InterviewLoopService::new(
                clock,
                oracle,
                Arc::clone(&storage.sessions),
                Arc::clone(&storage.candidates),
            )
            .with_persist_every(config.persist_every)
            .with_resume_max_chars(config.resume_max_chars),
        );

        Self {
            config,
            intake,
            interview_loop,
        }
    }

    #[must_use]
    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    #[must_use]
    pub fn intake(&self) -> Arc<IntakeService> {
        Arc::clone(&self.intake)
    }

    #[must_use]
    pub fn interview_loop(&self) -> Arc<InterviewLoopService> {
        Arc::clone(&self.interview_loop)
    }
}
