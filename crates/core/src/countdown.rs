//! Suspendable per-question countdown.
//!
//! The countdown is driven externally: something calls [`Countdown::tick`] once per
//! elapsed second. Expiry is reported through the returned [`Tick`] rather than a
//! stored callback, so the caller decides what "on expire" means.

use serde::{Deserialize, Serialize};

/// Identifies one activation period of a countdown.
///
/// Every `start`, `reset` and `stop` moves to a new activation; signals tagged
/// with an older one are stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Activation(u64);

impl Activation {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// Never started, or explicitly stopped.
    Idle,
    Running,
    Paused,
    /// Reached zero; inactive until reset or restarted.
    Expired,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing changed.
    Inactive,
    /// Decremented, still above zero.
    Counting { remaining: u32 },
    /// Hit zero on this tick. Reported exactly once per activation.
    Expired(Activation),
}

#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    state: CountdownState,
    activation: Activation,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: CountdownState::Idle,
            activation: Activation(0),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    /// Begin counting down from `initial_secs`.
    pub fn start(&mut self, initial_secs: u32) -> Activation {
        self.remaining = initial_secs;
        self.state = CountdownState::Running;
        self.bump()
    }

    /// Load a value without ticking; `resume` starts the count.
    pub fn load_paused(&mut self, secs: u32) -> Activation {
        self.remaining = secs;
        self.state = CountdownState::Paused;
        self.bump()
    }

    /// Set `remaining` to `secs`.
    ///
    /// A running countdown keeps running from the new value; an expired one is
    /// reactivated. Idle and paused countdowns keep their state.
    pub fn reset(&mut self, secs: u32) -> Activation {
        self.remaining = secs;
        if self.state == CountdownState::Expired {
            self.state = CountdownState::Running;
        }
        self.bump()
    }

    /// Freeze at the current value. Returns the frozen value.
    pub fn pause(&mut self) -> u32 {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Paused;
        }
        self.remaining
    }

    /// Continue from the frozen value. Returns whether the countdown is now running.
    pub fn resume(&mut self) -> bool {
        if self.state == CountdownState::Paused {
            self.state = CountdownState::Running;
        }
        self.is_running()
    }

    /// Deactivate without expiring. Any in-flight expiry becomes stale.
    pub fn stop(&mut self) {
        self.state = CountdownState::Idle;
        self.bump();
    }

    /// Account for one elapsed second.
    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Inactive;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.state = CountdownState::Expired;
            return Tick::Expired(self.activation);
        }
        self.remaining -= 1;
        Tick::Counting {
            remaining: self.remaining,
        }
    }

    fn bump(&mut self) -> Activation {
        self.activation = Activation(self.activation.0.wrapping_add(1));
        self.activation
    }
}
