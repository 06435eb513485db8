use serde::{Deserialize, Serialize};

/// A phase of the exploration state machine.
///
/// The explorer starts in `Launching`, spends most of a session alternating
/// between `Running` and `Recovering`, and stops in `Done` once the session
/// budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Launching,
    Running,
    Recovering,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Launching  => "Launching",
            Phase::Running    => "Running",
            Phase::Recovering => "Recovering",
            Phase::Done       => "Done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable handle of a canonical state within one session.
///
/// Handles are assigned on first sight and never reused. Indices 0 and 1 are
/// reserved for the out-of-domain and same-url states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub usize);

impl StateId {
    pub const OUT_OF_DOMAIN: StateId = StateId(0);
    pub const SAME_URL:      StateId = StateId(1);

    pub fn is_reserved(&self) -> bool {
        self.0 < 2
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Stable handle of an action in the session-global action catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub usize);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}
