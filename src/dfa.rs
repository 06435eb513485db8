//! Learned navigation automaton over canonical states.
//!
//! Only transitions the explorer actually performed are recorded, and only
//! page-changing Clicks between two distinct ActionSet states. Back moves are
//! never recorded. The automaton exists for recovery routing.

use crate::action::Action;
use crate::state::WindowState;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfaEdge {
    pub from:   WindowState,
    pub action: Action,
    pub to:     WindowState,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationAutomaton {
    /// States in first-recorded order.
    order: Vec<WindowState>,
    /// Per-state outgoing `(action, next)` pairs in first-recorded order.
    edges: HashMap<WindowState, Vec<(Action, WindowState)>>,
}

impl NavigationAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, state: &WindowState) {
        if !self.edges.contains_key(state) {
            self.edges.insert(state.clone(), Vec::new());
            self.order.push(state.clone());
        }
    }

    /// Records an observed step. Returns `true` if the automaton changed.
    ///
    /// An action already known from `prev` is redirected to the newer target.
    pub fn record(&mut self, prev: &WindowState, action: &Action, next: &WindowState) -> bool {
        if action.is_back() || !action.is_click() {
            return false;
        }
        if prev.as_action_set().is_none() || next.as_action_set().is_none() {
            return false;
        }
        self.ensure(prev);
        self.ensure(next);
        if prev == next {
            return false;
        }
        let Some(out) = self.edges.get_mut(prev) else {
            return false;
        };
        match out.iter_mut().find(|(a, _)| a == action) {
            Some((_, target)) if target == next => false,
            Some((_, target)) => {
                *target = next.clone();
                true
            }
            None => {
                out.push((action.clone(), next.clone()));
                true
            }
        }
    }

    pub fn contains(&self, state: &WindowState) -> bool {
        self.edges.contains_key(state)
    }

    /// Deterministic transition function.
    pub fn transition(&self, state: &WindowState, action: &Action) -> Option<&WindowState> {
        self.edges.get(state)?
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, next)| next)
    }

    pub fn successors(&self, state: &WindowState) -> &[(Action, WindowState)] {
        self.edges.get(state).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Shortest action path from `from` to the first state whose page is
    /// `target_page`, by breadth-first search over recorded edges.
    ///
    /// Returns `None` when `from` is not in the automaton or no recorded
    /// path reaches the page. An empty path means `from` is already there.
    pub fn shortest_path(&self, from: &WindowState, target_page: &str) -> Option<Vec<Action>> {
        if !self.contains(from) {
            return None;
        }
        let mut visited: HashSet<&WindowState> = HashSet::new();
        let mut parents: HashMap<&WindowState, (&Action, &WindowState)> = HashMap::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        let mut found = None;
        while let Some(state) = queue.pop_front() {
            if state.page() == Some(target_page) {
                found = Some(state);
                break;
            }
            for (action, next) in self.successors(state) {
                if visited.insert(next) {
                    parents.insert(next, (action, state));
                    queue.push_back(next);
                }
            }
        }

        let mut cursor = found?;
        let mut path = Vec::new();
        while let Some((action, parent)) = parents.get(cursor) {
            path.push((*action).clone());
            cursor = *parent;
        }
        path.reverse();
        Some(path)
    }

    pub fn state_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|v| v.len()).sum()
    }

    /// All recorded edges, in first-recorded order.
    pub fn dump(&self) -> Vec<DfaEdge> {
        self.order.iter()
            .flat_map(|from| {
                self.successors(from).iter().map(move |(action, to)| DfaEdge {
                    from:   from.clone(),
                    action: action.clone(),
                    to:     to.clone(),
                })
            })
            .collect()
    }
}
