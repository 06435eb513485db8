//! Similarity-based canonicalization of observed screens.
//!
//! A fresh observation is folded into the *first* known state (in insertion
//! order) that it resembles closely enough, either directly or through one of
//! that state's recorded near-duplicates. First match wins; cluster membership
//! therefore depends on visitation order, and learning tables are indexed
//! against exactly that behaviour.

use crate::state::WindowState;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone)]
pub struct StateRegistry {
    threshold:  f64,
    /// Canonical states in first-seen order.
    known:      Vec<WindowState>,
    visits:     HashMap<WindowState, usize>,
    /// Near-duplicates folded into each canonical representative.
    clusters:   HashMap<WindowState, Vec<WindowState>>,
    /// Every raw observation, before folding.
    all_states: HashSet<WindowState>,
}

/// One canonical state and its tallies, as written to the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state:   WindowState,
    pub visits:  usize,
    pub similar: Vec<WindowState>,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl StateRegistry {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            known:      Vec::new(),
            visits:     HashMap::new(),
            clusters:   HashMap::new(),
            all_states: HashSet::new(),
        }
    }

    /// Returns the canonical representative for `observed`.
    ///
    /// Records the raw observation; if it is folded into an existing state it
    /// joins that state's cluster (once) and the *existing* state is returned.
    /// Non-ActionSet states pass through unchanged.
    pub fn pre_process(&mut self, observed: WindowState) -> WindowState {
        self.all_states.insert(observed.clone());
        if observed.as_action_set().is_none() {
            return observed;
        }
        let threshold = self.threshold;
        let hit = self.known.iter()
            .filter(|s| s.as_action_set().is_some())
            .find(|known| {
                known.similarity(&observed) >= threshold
                    || self.clusters.get(*known)
                        .map(|members| members.iter().any(|m| m.similarity(&observed) >= threshold))
                        .unwrap_or(false)
            })
            .cloned();
        match hit {
            Some(representative) => {
                tracing::debug!(state = %representative, "folded into known state");
                let members = self.clusters.entry(representative.clone()).or_default();
                if observed != representative && !members.contains(&observed) {
                    members.push(observed);
                }
                representative
            }
            None => observed,
        }
    }

    /// Counts a visit. Returns `true` when the state was not known before.
    pub fn visit(&mut self, state: &WindowState) -> bool {
        match self.visits.get_mut(state) {
            Some(count) => {
                *count += 1;
                false
            }
            None => {
                self.visits.insert(state.clone(), 1);
                self.known.push(state.clone());
                true
            }
        }
    }

    pub fn visits(&self, state: &WindowState) -> usize {
        self.visits.get(state).copied().unwrap_or(0)
    }

    pub fn contains(&self, state: &WindowState) -> bool {
        self.visits.contains_key(state)
    }

    /// Number of distinct canonical states.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn all_state_count(&self) -> usize {
        self.all_states.len()
    }

    pub fn known(&self) -> &[WindowState] {
        &self.known
    }

    pub fn cluster(&self, state: &WindowState) -> &[WindowState] {
        self.clusters.get(state).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn summaries(&self) -> Vec<StateSummary> {
        self.known.iter()
            .map(|s| StateSummary {
                state:   s.clone(),
                visits:  self.visits(s),
                similar: self.cluster(s).to_vec(),
            })
            .collect()
    }

    /// Raw observations in a stable order.
    pub fn all_states(&self) -> Vec<WindowState> {
        let mut states: Vec<WindowState> = self.all_states.iter().cloned().collect();
        states.sort();
        states
    }
}
