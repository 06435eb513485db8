use serde::{Deserialize, Serialize};

/// An event emitted by a phase handler to drive transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    // Lifecycle
    Launched,

    // Running outcomes
    Continue,
    Stagnated,
    BudgetExhausted,

    // Recovering outcomes
    Recovered,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Launched        => "Launched",
            Event::Continue        => "Continue",
            Event::Stagnated       => "Stagnated",
            Event::BudgetExhausted => "BudgetExhausted",
            Event::Recovered       => "Recovered",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
