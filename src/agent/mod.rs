use crate::abstraction::ActionCatalog;
use crate::action::Action;
use crate::config::{AgentKind, ExploreConfig};
use crate::ptg::PageTransitionGraph;
use crate::state::WindowState;
use crate::types::StateId;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod dfs;
mod q_learning;
mod qtable;
mod random;

pub use dfs::DfsAgent;
pub use q_learning::QLearningAgent;
pub use qtable::QTable;
pub use random::RandomAgent;

/// A canonical state together with its session handle.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub state: &'a WindowState,
    pub id:    StateId,
}

impl<'a> Observation<'a> {
    pub fn new(state: &'a WindowState, id: StateId) -> Self {
        Self { state, id }
    }

    pub fn page(&self) -> Option<&'a str> {
        self.state.page()
    }
}

/// Read-only view of the session tables the explorer owns.
#[derive(Debug, Clone, Copy)]
pub struct ExploreView<'a> {
    pub ptg:     &'a PageTransitionGraph,
    pub actions: &'a ActionCatalog,
}

/// The contract every decision policy must fulfill.
///
/// # Contract
///
/// 1. `select_action()` picks one of the observed state's actions. It returns
///    `None` only when the state has no actions at all.
/// 2. `update()` is called once per executed action with the resulting state.
///    The agent remembers the state it acted from; the first update after
///    `reset_episode()` teaches nothing.
/// 3. `resync()` moves the agent's notion of "where I am" without learning,
///    e.g. after a recovery replay step.
/// 4. Agents never mutate the graph or the catalogs; they own only their
///    private learning tables.
pub trait Agent: Send {
    fn name(&self) -> &'static str;

    fn select_action(&mut self, obs: Observation<'_>, view: &ExploreView<'_>) -> Option<Action>;

    fn update(&mut self, action: &Action, obs: Observation<'_>, view: &ExploreView<'_>);

    /// Forgets the previous state, so the next update is not learned from.
    fn reset_episode(&mut self) {}

    fn resync(&mut self, _action: Option<&Action>, _obs: Observation<'_>, _view: &ExploreView<'_>) {}

    fn q_table(&self) -> Option<&QTable> {
        None
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    }
}

/// Builds the agent `config.agent` names.
pub fn build_agent(config: &ExploreConfig) -> Box<dyn Agent> {
    match config.agent {
        AgentKind::Random    => Box::new(RandomAgent::new(config.seed)),
        AgentKind::QLearning => Box::new(QLearningAgent::new(config.q_learning, config.use_ptg, config.seed)),
        AgentKind::Dfs       => Box::new(DfsAgent::new(config.dfs, config.q_learning, config.seed)),
    }
}
