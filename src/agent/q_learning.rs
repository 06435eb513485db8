use crate::action::Action;
use crate::agent::{seeded_rng, Agent, ExploreView, Observation, QTable};
use crate::config::QLearningConfig;
use crate::state::WindowState;
use crate::types::{ActionId, StateId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Tabular Q-learning with a visitation-count curiosity reward.
///
/// Reward for a step is `1 / n` where `n` is how often this exact
/// `(state, action, state)` triple has now been seen.
pub struct QLearningAgent {
    params:      QLearningConfig,
    use_ptg:     bool,
    table:       QTable,
    transitions: HashMap<(StateId, ActionId, StateId), usize>,
    /// The state the next executed action is taken from.
    previous:    Option<StateId>,
    rng:         StdRng,
}

impl QLearningAgent {
    pub fn new(params: QLearningConfig, use_ptg: bool, seed: Option<u64>) -> Self {
        Self {
            params,
            use_ptg,
            table:       QTable::new(params.same_url_value),
            transitions: HashMap::new(),
            previous:    None,
            rng:         seeded_rng(seed),
        }
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn previous_state(&self) -> Option<StateId> {
        self.previous
    }

    /// Seeds the value row of a state seen for the first time.
    pub fn observe(&mut self, obs: Observation<'_>, view: &ExploreView<'_>) {
        if self.table.has_row(obs.id) {
            return;
        }
        let row = match obs.state {
            WindowState::OutOfDomain { restart } => view.actions.index_of(restart)
                .map(|id| HashMap::from([(id, self.params.out_of_domain_value)]))
                .unwrap_or_default(),
            WindowState::SameUrl { .. } => HashMap::new(),
            WindowState::ActionSet(state) => {
                let page = state.page();
                let dead_end = self.use_ptg && view.ptg.in_degree(page) == 0;
                state.actions().iter()
                    .filter_map(|action| {
                        let id = view.actions.index_of(action)?;
                        Some((id, self.seed_value(action, page, dead_end, view)))
                    })
                    .collect()
            }
        };
        tracing::trace!(state = %obs.id, actions = row.len(), "seeded q row");
        self.table.seed_row(obs.id, row);
    }

    fn seed_value(&self, action: &Action, page: &str, dead_end: bool, view: &ExploreView<'_>) -> f64 {
        if !self.use_ptg || !view.ptg.contains_page(page) {
            return self.params.initial_value;
        }
        let on_edge = action.location().map_or(false, |location| {
            view.ptg.edges_from(page).iter()
                .any(|e| e.component == location && !e.target_page.is_empty() && e.target_page != page)
        });
        if on_edge {
            self.params.ptg_edge_value
        } else if dead_end && action.is_back() {
            self.params.dead_end_back_value
        } else {
            self.params.initial_value
        }
    }

    fn value_of(&self, state: StateId, action: &Action, view: &ExploreView<'_>) -> f64 {
        view.actions.index_of(action)
            .and_then(|id| self.table.value(state, id))
            .unwrap_or(self.params.initial_value)
    }

    /// Epsilon-greedy choice among the actions `allowed` keeps.
    ///
    /// If the filter leaves nothing, every action is a candidate again.
    pub fn choose(
        &mut self,
        obs:     Observation<'_>,
        view:    &ExploreView<'_>,
        allowed: impl Fn(&Action) -> bool,
    ) -> Option<Action> {
        self.observe(obs, view);
        let actions = obs.state.actions();
        if let [only @ Action::Restart { .. }] = actions {
            return Some(only.clone());
        }
        let mut candidates: Vec<&Action> = actions.iter().filter(|a| allowed(*a)).collect();
        if candidates.is_empty() {
            candidates = actions.iter().collect();
        }
        if candidates.is_empty() {
            return None;
        }

        let roll: f64 = self.rng.gen();
        if roll >= self.params.epsilon {
            let mut best = f64::NEG_INFINITY;
            let mut maxima: Vec<&Action> = Vec::new();
            for &action in &candidates {
                let value = self.value_of(obs.id, action, view);
                if value > best {
                    best = value;
                    maxima.clear();
                    maxima.push(action);
                } else if value == best {
                    maxima.push(action);
                }
            }
            let chosen = maxima.choose(&mut self.rng).map(|a| (*a).clone());
            tracing::debug!(state = %obs.id, max_q = best, "greedy choice");
            chosen
        } else {
            let trapped = self.use_ptg
                && obs.page().map_or(false, |page| view.ptg.in_degree(page) == 0);
            let pool: Vec<&Action> = if trapped {
                let forward: Vec<&Action> = candidates.iter().copied().filter(|a| !a.is_back()).collect();
                if forward.is_empty() { candidates } else { forward }
            } else {
                candidates
            };
            tracing::debug!(state = %obs.id, "random choice");
            pool.choose(&mut self.rng).map(|a| (*a).clone())
        }
    }

    fn learn(&mut self, prev: StateId, action: ActionId, next: StateId) {
        let seen = self.transitions.entry((prev, action, next)).or_insert(0);
        *seen += 1;
        let reward = 1.0 / *seen as f64;
        let predict = self.table.value(prev, action).unwrap_or(self.params.initial_value);
        let target = reward + self.params.gamma * self.table.max_value(next);
        let updated = predict + self.params.alpha * (target - predict);
        tracing::debug!(
            from = %prev, action = %action, to = %next,
            reward, old = predict, new = updated,
            "q update"
        );
        self.table.set(prev, action, updated);
    }

    /// How often the agent has seen `(prev, action, next)`.
    pub fn transition_count(&self, prev: StateId, action: ActionId, next: StateId) -> usize {
        self.transitions.get(&(prev, action, next)).copied().unwrap_or(0)
    }
}

impl Agent for QLearningAgent {
    fn name(&self) -> &'static str { "q_learning" }

    fn select_action(&mut self, obs: Observation<'_>, view: &ExploreView<'_>) -> Option<Action> {
        self.choose(obs, view, |_| true)
    }

    fn update(&mut self, action: &Action, obs: Observation<'_>, view: &ExploreView<'_>) {
        self.observe(obs, view);
        match (self.previous, view.actions.index_of(action)) {
            (Some(prev), Some(action_id)) => self.learn(prev, action_id, obs.id),
            (Some(_), None) => tracing::warn!(action = %action, "action missing from catalog, not learned"),
            (None, _) => {}
        }
        self.previous = Some(obs.id);
    }

    fn reset_episode(&mut self) {
        self.previous = None;
    }

    fn resync(&mut self, _action: Option<&Action>, obs: Observation<'_>, view: &ExploreView<'_>) {
        self.observe(obs, view);
        self.previous = Some(obs.id);
    }

    fn q_table(&self) -> Option<&QTable> {
        Some(&self.table)
    }
}
