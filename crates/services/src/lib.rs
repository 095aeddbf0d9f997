#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod intake;
pub mod oracle;
pub mod sessions;

pub use interview_core::Clock;

pub use app_services::AppServices;
pub use config::{InterviewConfig, OracleConfig};
pub use error::{
    AppServicesError, ConfigError, DriverError, IntakeError, InterviewError, OracleError,
};
pub use intake::{IntakeService, Registration};
pub use oracle::{HeuristicOracle, InterviewOracle, RemoteOracle};
pub use sessions::{AnswerStep, DriverEvent, InterviewLoopService, SessionDriver, SessionHandle};
