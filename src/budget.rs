use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Limits on one exploration session.
///
/// The wall-clock budget is the normal way a session ends. `max_ticks` is an
/// additional cap on Running ticks, mostly useful for scripted runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionBudget {
    pub time_budget: Duration,
    pub max_ticks:   Option<usize>,
}

impl SessionBudget {
    pub fn new(time_budget: Duration) -> Self {
        Self { time_budget, max_ticks: None }
    }

    pub fn with_max_ticks(mut self, ticks: usize) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Checks whether the session is over.
    /// Returns true if either limit is reached.
    pub fn is_exhausted(&self, started: Instant, ticks: usize) -> bool {
        if started.elapsed() >= self.time_budget { return true; }
        if let Some(limit) = self.max_ticks {
            if ticks >= limit { return true; }
        }
        false
    }
}
