use crate::types::{ActionId, StateId};
use std::collections::HashMap;

/// Sparse state -> action -> value table.
///
/// Rows are created on first sight of a state and only ever hold entries for
/// actions observed from that state.
#[derive(Debug, Clone)]
pub struct QTable {
    rows:           HashMap<StateId, HashMap<ActionId, f64>>,
    same_url_value: f64,
}

impl QTable {
    pub fn new(same_url_value: f64) -> Self {
        Self { rows: HashMap::new(), same_url_value }
    }

    pub fn has_row(&self, state: StateId) -> bool {
        self.rows.contains_key(&state)
    }

    /// Inserts `row` for `state` unless a row already exists.
    /// Returns `true` if the row was inserted.
    pub fn seed_row(&mut self, state: StateId, row: HashMap<ActionId, f64>) -> bool {
        if self.rows.contains_key(&state) {
            return false;
        }
        self.rows.insert(state, row);
        true
    }

    pub fn row(&self, state: StateId) -> Option<&HashMap<ActionId, f64>> {
        self.rows.get(&state)
    }

    pub fn value(&self, state: StateId, action: ActionId) -> Option<f64> {
        self.rows.get(&state)?.get(&action).copied()
    }

    pub fn set(&mut self, state: StateId, action: ActionId, value: f64) {
        self.rows.entry(state).or_default().insert(action, value);
    }

    /// Bootstrap value of a state. An empty or missing row (the same-url
    /// state has no actions) is worth `same_url_value`.
    pub fn max_value(&self, state: StateId) -> f64 {
        self.rows.get(&state)
            .and_then(|row| row.values().copied().reduce(f64::max))
            .unwrap_or(self.same_url_value)
    }

    /// Number of rows, one per canonical state seen.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
