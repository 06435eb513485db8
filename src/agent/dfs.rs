use crate::action::Action;
use crate::agent::{seeded_rng, Agent, ExploreView, Observation, QLearningAgent, QTable};
use crate::config::{DfsConfig, QLearningConfig};
use crate::types::StateId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Graph-guided depth-first exploration.
///
/// Follows page transition graph edges toward pages not yet visited, falls
/// back to a bounded number of in-page Q-learning steps, and backtracks
/// with Back. Once the action ceiling is passed or every router page has
/// been visited, the embedded Q-learning agent takes over for good.
pub struct DfsAgent {
    params:          DfsConfig,
    q:               QLearningAgent,
    total_actions:   usize,
    visited:         BTreeSet<String>,
    /// Pages reachable from the start page; fixed on the first decision.
    router_pages:    Option<BTreeSet<String>>,
    fallback_counts: HashMap<String, usize>,
    tried:           HashMap<StateId, HashSet<Action>>,
    handed_off:      bool,
    rng:             StdRng,
}

impl DfsAgent {
    pub fn new(params: DfsConfig, q_params: QLearningConfig, seed: Option<u64>) -> Self {
        Self {
            params,
            // The embedded learner always consults the graph.
            q:               QLearningAgent::new(q_params, true, seed.map(|s| s.wrapping_add(1))),
            total_actions:   0,
            visited:         BTreeSet::new(),
            router_pages:    None,
            fallback_counts: HashMap::new(),
            tried:           HashMap::new(),
            handed_off:      false,
            rng:             seeded_rng(seed),
        }
    }

    pub fn is_handed_off(&self) -> bool {
        self.handed_off
    }

    pub fn visited_pages(&self) -> &BTreeSet<String> {
        &self.visited
    }

    pub fn router_pages(&self) -> Option<&BTreeSet<String>> {
        self.router_pages.as_ref()
    }

    pub fn fallback_count(&self, page: &str) -> usize {
        self.fallback_counts.get(page).copied().unwrap_or(0)
    }

    pub fn learner(&self) -> &QLearningAgent {
        &self.q
    }

    fn back_for(obs: Observation<'_>, page: &str) -> Action {
        obs.state.actions().iter()
            .find(|a| a.is_back())
            .cloned()
            .unwrap_or_else(|| {
                let ability = obs.state.as_action_set().map(|s| s.ability()).unwrap_or("");
                Action::back(ability, page)
            })
    }

    fn should_hand_off(&self) -> bool {
        let routers = self.router_pages.as_ref().map_or(0, |r| r.len());
        self.total_actions > self.params.action_ceiling || self.visited.len() >= routers
    }
}

impl Agent for DfsAgent {
    fn name(&self) -> &'static str { "dfs" }

    fn select_action(&mut self, obs: Observation<'_>, view: &ExploreView<'_>) -> Option<Action> {
        self.total_actions += 1;
        self.q.observe(obs, view);

        let Some(page) = obs.page() else {
            // Out of domain or same url: only the learner knows what to do.
            return self.q.select_action(obs, view);
        };
        if self.router_pages.is_none() {
            let routers = view.ptg.reachable_from(page);
            tracing::info!(start = page, routers = routers.len(), "router pages computed");
            self.router_pages = Some(routers);
        }
        self.visited.insert(page.to_string());

        let actions = obs.state.actions();
        if let [only] = actions {
            if only.is_back() {
                return Some(only.clone());
            }
        }

        if !self.handed_off && self.should_hand_off() {
            tracing::info!(
                total_actions = self.total_actions,
                visited = self.visited.len(),
                "handing off to q-learning"
            );
            self.handed_off = true;
        }
        if self.handed_off {
            return self.q.select_action(obs, view);
        }

        // Graph-guided jump to a page not visited yet.
        let edges = view.ptg.edges_from(page);
        let unvisited: Vec<&str> = edges.iter()
            .filter(|e| !e.target_page.is_empty() && e.target_page != page && !self.visited.contains(&e.target_page))
            .map(|e| e.component.as_str())
            .collect();
        let tried = self.tried.entry(obs.id).or_default();
        let useful: Vec<&Action> = actions.iter()
            .filter(|a| a.location().map_or(false, |loc| unvisited.contains(&loc)))
            .filter(|a| !tried.contains(*a))
            .collect();
        if let Some(chosen) = useful.choose(&mut self.rng).map(|a| (*a).clone()) {
            tried.insert(chosen.clone());
            tracing::debug!(page, action = %chosen, "graph jump");
            return Some(chosen);
        }

        if unvisited.is_empty() && !edges.is_empty() {
            tracing::debug!(page, "every linked page visited, backtracking");
            return Some(Self::back_for(obs, page));
        }

        let attempts = self.fallback_counts.entry(page.to_string()).or_insert(0);
        if *attempts < self.params.fallback_limit {
            *attempts += 1;
            tracing::debug!(page, attempt = *attempts, "in-page q-learning step");
            return self.q.choose(obs, view, |a| !a.is_back());
        }

        for edge in edges {
            if !edge.target_page.is_empty() && self.visited.insert(edge.target_page.clone()) {
                tracing::debug!(page, target = %edge.target_page, "marking unreached target as attempted");
            }
        }
        tracing::debug!(page, "fallback attempts used up, backtracking");
        Some(Self::back_for(obs, page))
    }

    fn update(&mut self, action: &Action, obs: Observation<'_>, view: &ExploreView<'_>) {
        self.q.update(action, obs, view);
    }

    fn reset_episode(&mut self) {
        self.q.reset_episode();
    }

    fn resync(&mut self, action: Option<&Action>, obs: Observation<'_>, view: &ExploreView<'_>) {
        self.q.resync(action, obs, view);
    }

    fn q_table(&self) -> Option<&QTable> {
        Some(self.q.table())
    }
}
