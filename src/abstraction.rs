//! Stable integer identities for actions and canonical states.
//!
//! Both catalogs are append-only arenas: a handle, once assigned, is never
//! reused or invalidated within a session.

use crate::action::Action;
use crate::state::WindowState;
use crate::types::{ActionId, StateId};
use std::collections::HashMap;

/// Session-global, insertion-ordered action catalog.
#[derive(Debug, Default, Clone)]
pub struct ActionCatalog {
    actions: Vec<Action>,
    index:   HashMap<Action, ActionId>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle of `action`, appending it on first sight.
    pub fn register(&mut self, action: &Action) -> ActionId {
        if let Some(id) = self.index.get(action) {
            return *id;
        }
        let id = ActionId(self.actions.len());
        self.actions.push(action.clone());
        self.index.insert(action.clone(), id);
        id
    }

    pub fn index_of(&self, action: &Action) -> Option<ActionId> {
        self.index.get(action).copied()
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &Action)> {
        self.actions.iter().enumerate().map(|(i, a)| (ActionId(i), a))
    }
}

/// Maps abstraction keys to state handles. Handles 0 and 1 are reserved.
#[derive(Debug, Clone)]
pub struct StateCatalog {
    by_key: HashMap<String, StateId>,
    keys:   Vec<String>,
}

impl Default for StateCatalog {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
            keys:   vec![OUT_OF_DOMAIN_KEY.to_string(), SAME_URL_KEY.to_string()],
        }
    }
}

const OUT_OF_DOMAIN_KEY: &str = "#out-of-domain";
const SAME_URL_KEY:      &str = "#same-url";

impl StateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, key: String) -> (StateId, bool) {
        if let Some(id) = self.by_key.get(&key) {
            return (*id, false);
        }
        let id = StateId(self.keys.len());
        self.keys.push(key.clone());
        self.by_key.insert(key, id);
        (id, true)
    }

    /// Number of handles handed out, reserved ones included.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The pair of catalogs the explorer owns for one session.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub actions: ActionCatalog,
    pub states:  StateCatalog,
}

impl Catalog {
    /// The restart action is registered first so it always holds handle 0.
    pub fn new(restart: &Action) -> Self {
        let mut actions = ActionCatalog::new();
        actions.register(restart);
        Self { actions, states: StateCatalog::new() }
    }

    /// Sorted, deduplicated, comma-joined action handles of an ActionSet state.
    ///
    /// Side effect: any action seen here for the first time is appended to
    /// the action catalog. Reserved variants have fixed keys and register nothing.
    pub fn abstraction_key(&mut self, state: &WindowState) -> String {
        match state {
            WindowState::OutOfDomain { .. } => OUT_OF_DOMAIN_KEY.to_string(),
            WindowState::SameUrl { .. }     => SAME_URL_KEY.to_string(),
            WindowState::ActionSet(s) => {
                let mut ids: Vec<usize> = s.actions().iter()
                    .map(|a| self.actions.register(a).0)
                    .collect();
                ids.sort_unstable();
                ids.dedup();
                ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
            }
        }
    }

    /// Memoized handle of a state's abstraction.
    pub fn index_state(&mut self, state: &WindowState) -> StateId {
        self.index_state_checked(state).0
    }

    /// Like `index_state`, also reporting whether the handle is new.
    pub fn index_state_checked(&mut self, state: &WindowState) -> (StateId, bool) {
        match state {
            WindowState::OutOfDomain { .. } => (StateId::OUT_OF_DOMAIN, false),
            WindowState::SameUrl { .. }     => (StateId::SAME_URL, false),
            WindowState::ActionSet(_) => {
                let key = self.abstraction_key(state);
                self.states.intern(key)
            }
        }
    }

    pub fn action_id(&mut self, action: &Action) -> ActionId {
        self.actions.register(action)
    }
}
