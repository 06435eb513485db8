//! Observed screens.
//!
//! A screen is characterised by the set of actions it exposes. Two
//! `ActionSet` states are equal when ability, page and action *set* match;
//! the order in which the detector produced the actions is irrelevant.

use crate::action::{Action, PageRef};
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSetState {
    actions: Vec<Action>,
    ability: String,
    page:    String,
}

impl ActionSetState {
    /// Builds a state from detector output.
    ///
    /// An empty action list is the typed "no actions" condition; callers
    /// decide how to continue (the explorer substitutes an implicit Back).
    pub fn new(
        actions: Vec<Action>,
        ability: impl Into<String>,
        page:    impl Into<String>,
    ) -> Result<Self, StateError> {
        let ability = ability.into();
        let page = page.into();
        if actions.is_empty() {
            return Err(StateError::NoActions { ability, page });
        }
        Ok(Self { actions, ability, page })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn ability(&self) -> &str {
        &self.ability
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn page_ref(&self) -> PageRef {
        PageRef::new(self.ability.clone(), self.page.clone())
    }

    fn action_set(&self) -> BTreeSet<&Action> {
        self.actions.iter().collect()
    }

    /// Jaccard index of the two action sets, gated by matching ability and page.
    pub fn similarity(&self, other: &ActionSetState) -> f64 {
        if self.ability != other.ability || self.page != other.page {
            return 0.0;
        }
        let s: HashSet<&Action> = self.actions.iter().collect();
        let t: HashSet<&Action> = other.actions.iter().collect();
        let union = s.union(&t).count();
        if union == 0 {
            return 0.0;
        }
        s.intersection(&t).count() as f64 / union as f64
    }

    fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for action in self.action_set() {
            hasher.update(action.digest());
        }
        hasher.update(self.ability.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.page.as_bytes());
        hasher.finalize().into()
    }
}

impl PartialEq for ActionSetState {
    fn eq(&self, other: &Self) -> bool {
        self.ability == other.ability
            && self.page == other.page
            && self.action_set() == other.action_set()
    }
}

impl Eq for ActionSetState {}

impl Hash for ActionSetState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for action in self.action_set() {
            action.hash(state);
        }
        self.ability.hash(state);
        self.page.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowState {
    ActionSet(ActionSetState),
    /// The foreground app is no longer the target; only a restart is possible.
    OutOfDomain { restart: Action },
    /// The last action observably changed nothing.
    SameUrl { app: String, ability: String },
}

impl WindowState {
    pub fn out_of_domain(app: impl Into<String>, ability: impl Into<String>) -> Self {
        WindowState::OutOfDomain { restart: Action::restart(app, ability) }
    }

    pub fn same_url(app: impl Into<String>, ability: impl Into<String>) -> Self {
        WindowState::SameUrl { app: app.into(), ability: ability.into() }
    }

    pub fn action_set(
        actions: Vec<Action>,
        ability: impl Into<String>,
        page:    impl Into<String>,
    ) -> Result<Self, StateError> {
        ActionSetState::new(actions, ability, page).map(WindowState::ActionSet)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WindowState::ActionSet(_)       => "ActionSetState",
            WindowState::OutOfDomain { .. } => "OutOfDomainState",
            WindowState::SameUrl { .. }     => "SameUrlState",
        }
    }

    pub fn actions(&self) -> &[Action] {
        match self {
            WindowState::ActionSet(s)             => s.actions(),
            WindowState::OutOfDomain { restart }  => std::slice::from_ref(restart),
            WindowState::SameUrl { .. }           => &[],
        }
    }

    pub fn as_action_set(&self) -> Option<&ActionSetState> {
        match self {
            WindowState::ActionSet(s) => Some(s),
            _                         => None,
        }
    }

    pub fn page(&self) -> Option<&str> {
        self.as_action_set().map(|s| s.page())
    }

    pub fn similarity(&self, other: &WindowState) -> f64 {
        match (self, other) {
            (WindowState::ActionSet(a), WindowState::ActionSet(b)) => a.similarity(b),
            _ => 0.0,
        }
    }
}

impl Ord for WindowState {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (WindowState::ActionSet(a), WindowState::ActionSet(b)) => a.digest().cmp(&b.digest())
                .then_with(|| a.ability.cmp(&b.ability))
                .then_with(|| a.page.cmp(&b.page))
                .then_with(|| a.action_set().cmp(&b.action_set())),
            (WindowState::OutOfDomain { restart: a }, WindowState::OutOfDomain { restart: b }) => a.cmp(b),
            (WindowState::SameUrl { app: a1, ability: b1 }, WindowState::SameUrl { app: a2, ability: b2 }) => {
                (a1, b1).cmp(&(a2, b2))
            }
            _ => self.kind().cmp(other.kind()),
        }
    }
}

impl PartialOrd for WindowState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for WindowState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            WindowState::ActionSet(s) => write!(
                f, "ActionSetState(action_number={}, abilityName={}, pagePath={})",
                s.actions.len(), s.ability, s.page
            ),
            WindowState::OutOfDomain { restart } => write!(f, "OutOfDomainState(action={})", restart),
            WindowState::SameUrl { app, ability } => write!(f, "SameUrlState(app={}, ability={})", app, ability),
        }
    }
}
