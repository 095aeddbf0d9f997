#![forbid(unsafe_code)]

pub mod countdown;
pub mod machine;
pub mod model;
pub mod reconciler;
pub mod resume;
pub mod scoring;
pub mod time;

pub use countdown::{Activation, Countdown, CountdownState, Tick};
pub use machine::{Advance, CommitOutcome, SessionMachine, TickOutcome};
pub use reconciler::TimeReconciler;
pub use time::Clock;
