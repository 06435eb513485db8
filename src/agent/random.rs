use crate::action::Action;
use crate::agent::{seeded_rng, Agent, ExploreView, Observation};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Uniform choice among the available actions. Learns nothing.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded_rng(seed) }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str { "random" }

    fn select_action(&mut self, obs: Observation<'_>, _view: &ExploreView<'_>) -> Option<Action> {
        obs.state.actions().choose(&mut self.rng).cloned()
    }

    fn update(&mut self, _action: &Action, _obs: Observation<'_>, _view: &ExploreView<'_>) {}
}
