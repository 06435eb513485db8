use crate::abstraction::Catalog;
use crate::action::Action;
use crate::agent::{Agent, ExploreView, Observation};
use crate::budget::SessionBudget;
use crate::config::ExploreConfig;
use crate::detector::ActionDetector;
use crate::dfa::NavigationAutomaton;
use crate::driver::{execute_action, Driver, Execution, KeyCode};
use crate::ledger::{SharedLedger, StatsSnapshot};
use crate::ptg::PageTransitionGraph;
use crate::state::{ActionSetState, WindowState};
use crate::textgen::{TextGenerator, TextRequest};
use crate::trace::{Trace, TraceEntry};
use crate::types::StateId;
use chrono::Utc;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::time::Instant;

/// All mutable session state, threaded through the phase handlers.
pub struct ExploreContext {
    // ── Session ──────────────────────────────────────────
    pub config:             ExploreConfig,
    pub session_id:         String,
    pub budget:             SessionBudget,
    /// Set when the session starts; the budget clock runs from here.
    pub started:            Instant,
    /// Running ticks taken so far.
    pub tick:               usize,

    // ── Collaborators ────────────────────────────────────
    pub driver:             Box<dyn Driver>,
    pub detector:           Box<dyn ActionDetector>,
    pub agent:              Box<dyn Agent>,
    /// Already bounded by a timeout with a random fallback.
    pub text:               Arc<dyn TextGenerator>,

    // ── Models (explorer is the sole mutator) ────────────
    pub catalog:            Catalog,
    pub ptg:                PageTransitionGraph,
    pub dfa:                NavigationAutomaton,
    /// Shared with the snapshot task. Lock per read or append only.
    pub ledger:             SharedLedger,

    // ── Position ─────────────────────────────────────────
    pub current:            WindowState,
    pub current_id:         StateId,

    // ── Stagnation tracking ──────────────────────────────
    pub same_page_ticks:    usize,
    pub no_new_state_ticks: usize,
    pub recoveries:         usize,

    pub rng:                StdRng,

    // ── Observability ────────────────────────────────────
    /// Full event-sourcing log of every phase step
    pub trace:              Trace,
}

impl ExploreContext {
    /// Records an event into the trace log. Called by all phase handlers.
    pub fn log(&mut self, phase: &str, event: &str, data: &str) {
        tracing::debug!(phase, event, data, tick = self.tick, "explore trace");
        self.trace.record(TraceEntry {
            tick:      self.tick,
            phase:     phase.to_string(),
            event:     event.to_string(),
            data:      data.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn restart_action(&self) -> Action {
        Action::restart(self.config.app.clone(), self.config.entry_ability.clone())
    }

    pub fn is_exhausted(&self) -> bool {
        self.budget.is_exhausted(self.started, self.tick)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let elapsed = self.elapsed_secs();
        self.ledger.lock().snapshot(elapsed)
    }

    /// Executes `action` on the device and paces afterwards.
    ///
    /// Driver failures are logged and swallowed; they never stop a session.
    /// Focusing a text field also types into it.
    pub async fn execute(&mut self, action: &Action) -> Option<Execution> {
        let outcome = match execute_action(self.driver.as_mut(), action) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(action = %action, error = %e, "action failed");
                None
            }
        };

        if let Some(Execution::Clicked { element_type }) = &outcome {
            if self.config.text_input.accepts(element_type) {
                self.enter_text(action, element_type).await;
            }
        }

        tokio::time::sleep(self.config.settle_delay()).await;
        if matches!(outcome, Some(Execution::Restarted)) {
            tokio::time::sleep(self.config.restart_delay()).await;
        }
        outcome
    }

    async fn enter_text(&mut self, action: &Action, element_type: &str) {
        let origin = action.origin().cloned().unwrap_or_default();
        let request = TextRequest {
            app:          self.config.app.clone(),
            ability:      origin.ability,
            page:         origin.page,
            element_type: element_type.to_string(),
            location:     action.location().unwrap_or_default().to_string(),
        };
        let text = match self.text.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "no text to enter");
                return;
            }
        };
        tracing::debug!(text = %text, field = %request.location, "entering text");
        if let Err(e) = self.driver.input_text(&text) {
            tracing::warn!(error = %e, "text input failed");
            return;
        }
        if let Err(e) = self.driver.press_key(KeyCode::Enter) {
            tracing::warn!(error = %e, "enter key failed");
        }
    }

    /// Reads the device and builds a raw (not yet canonical) state.
    ///
    /// Anything that is not clearly "the target app, on a named page" is
    /// out of domain. A page with no detectable actions gets an implicit Back.
    pub fn perceive(&mut self) -> WindowState {
        let target = self.config.app.clone();
        let entry = self.config.entry_ability.clone();
        let out_of_domain = || WindowState::out_of_domain(target.clone(), entry.clone());

        match self.driver.current_foreground() {
            Ok((app, ability)) if app == target && !ability.is_empty() => {}
            Ok((app, _)) => {
                tracing::debug!(foreground = %app, "foreground is not the target app");
                return out_of_domain();
            }
            Err(e) => {
                tracing::warn!(error = %e, "foreground query failed");
                return out_of_domain();
            }
        }

        let (ability, page) = match self.driver.current_page() {
            Ok((ability, page)) if !ability.is_empty() && !page.is_empty() => (ability, page),
            Ok(_) => return out_of_domain(),
            Err(e) => {
                tracing::warn!(error = %e, "page query failed");
                return out_of_domain();
            }
        };

        let tree = match self.driver.dump_ui_tree() {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(error = %e, "ui dump failed");
                return out_of_domain();
            }
        };

        let actions = self.detector.detect(&tree, &ability, &page);
        match WindowState::action_set(actions, ability.clone(), page.clone()) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "substituting an implicit back");
                ActionSetState::new(vec![Action::back(ability.clone(), page.clone())], ability, page)
                    .map(WindowState::ActionSet)
                    .unwrap_or_else(|_| out_of_domain())
            }
        }
    }

    /// Folds a raw observation into its canonical representative and indexes it.
    pub fn canonicalize(&mut self, raw: WindowState) -> (WindowState, StateId) {
        let state = self.ledger.lock().registry.pre_process(raw);
        let id = self.catalog.index_state(&state);
        (state, id)
    }

    /// Counts the ability and page of a canonical state.
    pub fn count_page(&self, state: &WindowState) {
        if let Some(s) = state.as_action_set() {
            self.ledger.lock().count_page(s.ability(), s.page());
        }
    }

    /// Moves the agent's position to the current state without learning.
    pub fn resync_agent(&mut self, action: Option<&Action>) {
        let view = ExploreView { ptg: &self.ptg, actions: &self.catalog.actions };
        let obs = Observation::new(&self.current, self.current_id);
        self.agent.resync(action, obs, &view);
    }
}
