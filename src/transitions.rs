use std::collections::HashMap;
use crate::types::Phase;
use crate::events::Event;

pub type TransitionTable = HashMap<(Phase, Event), Phase>;

/// Builds the exploration transition table.
/// Any (Phase, Event) pair not in this table is illegal and
/// will cause Explorer::step() to return ExploreError::InvalidTransition.
pub fn build_transition_table() -> TransitionTable {
    let mut t = HashMap::new();

    // ── LAUNCHING ────────────────────────────────────────
    t.insert((Phase::Launching,  Event::Launched),        Phase::Running);

    // ── RUNNING ──────────────────────────────────────────
    t.insert((Phase::Running,    Event::Continue),        Phase::Running);
    t.insert((Phase::Running,    Event::Stagnated),       Phase::Recovering);
    t.insert((Phase::Running,    Event::BudgetExhausted), Phase::Done);

    // ── RECOVERING ───────────────────────────────────────
    t.insert((Phase::Recovering, Event::Recovered),       Phase::Running);

    // Note: DONE is terminal, with no outgoing transitions.

    t
}

/// Validates that a given (phase, event) pair is legal.
pub fn is_valid_transition(table: &TransitionTable, phase: Phase, event: Event) -> bool {
    table.contains_key(&(phase, event))
}
