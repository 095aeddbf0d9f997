mod driver;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{DriverError, InterviewError};
pub use driver::{DriverEvent, SessionDriver, SessionHandle};
pub use workflow::{AnswerStep, InterviewLoopService};
