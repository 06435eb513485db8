//! Counters shared between the exploration loop and the snapshot task.
//!
//! The ledger sits behind one coarse `parking_lot::Mutex`. Callers take the
//! lock for a single read or append and release it before touching the
//! driver or awaiting anything.

use crate::canonical::{StateRegistry, StateSummary};
use crate::state::WindowState;
use crate::types::{ActionId, StateId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub type SharedLedger = Arc<Mutex<SessionLedger>>;

/// One observed `(state, action, state)` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from:   StateId,
    pub action: ActionId,
    pub to:     StateId,
}

/// Periodic tally written by the snapshot task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub session_id:      String,
    pub elapsed_secs:    u64,
    pub timestamp:       DateTime<Utc>,
    pub ability_count:   BTreeMap<String, usize>,
    pub page_count:      BTreeMap<String, usize>,
    pub action_count:    usize,
    pub state_count:     usize,
    pub all_state_count: usize,
}

#[derive(Debug)]
pub struct SessionLedger {
    pub session_id:     String,
    pub registry:       StateRegistry,
    pub ability_count:  BTreeMap<String, usize>,
    pub page_count:     BTreeMap<String, usize>,
    /// Actions executed, recovery replays included.
    pub action_count:   usize,
    transition_log:     Vec<TransitionRecord>,
    transition_counts:  HashMap<TransitionRecord, usize>,
}

impl SessionLedger {
    pub fn new(session_id: impl Into<String>, similarity_threshold: f64) -> Self {
        Self {
            session_id:        session_id.into(),
            registry:          StateRegistry::new(similarity_threshold),
            ability_count:     BTreeMap::new(),
            page_count:        BTreeMap::new(),
            action_count:      0,
            transition_log:    Vec::new(),
            transition_counts: HashMap::new(),
        }
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn count_page(&mut self, ability: &str, page: &str) {
        *self.ability_count.entry(ability.to_string()).or_insert(0) += 1;
        *self.page_count.entry(page.to_string()).or_insert(0) += 1;
    }

    /// Counts a visit of a canonical state; `true` if it is new.
    pub fn visit_state(&mut self, state: &WindowState) -> bool {
        self.registry.visit(state)
    }

    /// Appends a transition and returns how often it has now been seen.
    pub fn log_transition(&mut self, record: TransitionRecord) -> usize {
        self.transition_log.push(record);
        let count = self.transition_counts.entry(record).or_insert(0);
        *count += 1;
        *count
    }

    pub fn transition_count(&self, record: &TransitionRecord) -> usize {
        self.transition_counts.get(record).copied().unwrap_or(0)
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transition_log
    }

    pub fn state_count(&self) -> usize {
        self.registry.len()
    }

    /// Page with the fewest visits; ties go to the lexicographically first.
    pub fn least_visited_page(&self) -> Option<String> {
        self.page_count.iter()
            .min_by_key(|(_, count)| **count)
            .map(|(page, _)| page.clone())
    }

    pub fn state_summaries(&self) -> Vec<StateSummary> {
        self.registry.summaries()
    }

    pub fn snapshot(&self, elapsed_secs: u64) -> StatsSnapshot {
        StatsSnapshot {
            session_id:      self.session_id.clone(),
            elapsed_secs,
            timestamp:       Utc::now(),
            ability_count:   self.ability_count.clone(),
            page_count:      self.page_count.clone(),
            action_count:    self.action_count,
            state_count:     self.registry.len(),
            all_state_count: self.registry.all_state_count(),
        }
    }
}
