use std::collections::HashMap;
use std::sync::Arc;
use crate::abstraction::Catalog;
use crate::agent::{build_agent, seeded_rng, Agent};
use crate::budget::SessionBudget;
use crate::config::ExploreConfig;
use crate::context::ExploreContext;
use crate::detector::{ActionDetector, ClickActionDetector};
use crate::dfa::NavigationAutomaton;
use crate::driver::Driver;
use crate::engine::Explorer;
use crate::error::ExploreError;
use crate::ledger::SessionLedger;
use crate::phases::{DonePhase, LaunchingPhase, PhaseHandler, RecoveringPhase, RunningPhase};
use crate::ptg::PageTransitionGraph;
use crate::snapshot::{MemorySnapshotStore, SnapshotStore};
use crate::state::WindowState;
use crate::textgen::{FallbackTextGenerator, RandomTextGenerator, TextGenerator};
use crate::trace::Trace;
use crate::transitions::build_transition_table;
use crate::types::{Phase, StateId};
use tokio::time::Instant;

pub struct ExplorerBuilder {
    config:     ExploreConfig,
    driver:     Option<Box<dyn Driver>>,
    detector:   Option<Box<dyn ActionDetector>>,
    agent:      Option<Box<dyn Agent>>,
    text:       Option<Arc<dyn TextGenerator>>,
    ptg:        Option<PageTransitionGraph>,
    store:      Option<Arc<dyn SnapshotStore>>,
    session_id: Option<String>,
    handlers:   HashMap<Phase, Box<dyn PhaseHandler>>,
}

impl ExplorerBuilder {
    pub fn new(config: ExploreConfig) -> Self {
        Self {
            config,
            driver:     None,
            detector:   None,
            agent:      None,
            text:       None,
            ptg:        None,
            store:      None,
            session_id: None,
            handlers:   HashMap::new(),
        }
    }

    pub fn driver(mut self, driver: Box<dyn Driver>) -> Self {
        self.driver = Some(driver); self
    }

    pub fn detector(mut self, detector: Box<dyn ActionDetector>) -> Self {
        self.detector = Some(detector); self
    }

    /// Overrides the agent `config.agent` would build.
    pub fn agent(mut self, agent: Box<dyn Agent>) -> Self {
        self.agent = Some(agent); self
    }

    /// Source of text for input fields.
    ///
    /// The generator is wrapped with `text_input.timeout_ms` and a random
    /// fallback, so a slow or failing generator never stalls a session.
    pub fn text_generator(mut self, text: Arc<dyn TextGenerator>) -> Self {
        self.text = Some(text); self
    }

    /// Seeds the page transition graph, usually from a static extraction.
    /// Takes precedence over `config.ptg_seed`.
    pub fn ptg(mut self, ptg: PageTransitionGraph) -> Self {
        self.ptg = Some(ptg); self
    }

    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store); self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into()); self
    }

    pub fn max_ticks(mut self, n: usize) -> Self {
        self.config.max_ticks = Some(n); self
    }

    /// Replaces the default handler for `phase`, for advanced users extending the library.
    pub fn handler(mut self, phase: Phase, handler: Box<dyn PhaseHandler>) -> Self {
        self.handlers.insert(phase, handler); self
    }

    /// Builds the Explorer with all default phase handlers.
    pub fn build(self) -> Result<Explorer, ExploreError> {
        let config = self.config;
        if config.app.is_empty() {
            return Err(ExploreError::BuildError("target app is required".to_string()));
        }
        if !(0.0..=1.0).contains(&config.similarity_threshold) {
            return Err(ExploreError::BuildError(format!(
                "similarity threshold {} is outside [0, 1]", config.similarity_threshold
            )));
        }
        let driver = self.driver
            .ok_or_else(|| ExploreError::BuildError("device driver is required".to_string()))?;

        let detector = self.detector.unwrap_or_else(|| Box::new(ClickActionDetector));
        let agent = self.agent.unwrap_or_else(|| build_agent(&config));

        let max_len = config.text_input.fallback_max_len;
        let text: Arc<dyn TextGenerator> = match self.text {
            Some(inner) => Arc::new(FallbackTextGenerator::new(
                inner,
                config.text_input.timeout(),
                RandomTextGenerator::new(max_len, config.seed),
            )),
            None => Arc::new(FallbackTextGenerator::random_only(max_len, config.seed)),
        };

        let ptg = match (self.ptg, config.ptg_seed.as_deref()) {
            (Some(ptg), _) => ptg,
            (None, Some(path)) => PageTransitionGraph::load(path)
                .map_err(|e| ExploreError::BuildError(format!("static graph seed {}: {}", path, e)))?,
            (None, None) => PageTransitionGraph::new(),
        };

        let session_id = self.session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let store = self.store.unwrap_or_else(|| Arc::new(MemorySnapshotStore::new()));

        let mut budget = SessionBudget::new(config.time_budget());
        if let Some(n) = config.max_ticks {
            budget = budget.with_max_ticks(n);
        }

        let restart = crate::action::Action::restart(config.app.clone(), config.entry_ability.clone());
        let ledger = SessionLedger::new(session_id.clone(), config.similarity_threshold).shared();
        let current = WindowState::out_of_domain(config.app.clone(), config.entry_ability.clone());

        tracing::debug!(
            session   = %session_id,
            agent     = agent.name(),
            ptg_pages = ptg.page_count(),
            "explorer built"
        );

        let ctx = ExploreContext {
            session_id,
            budget,
            started:            Instant::now(),
            tick:               0,
            driver,
            detector,
            agent,
            text,
            catalog:            Catalog::new(&restart),
            ptg,
            dfa:                NavigationAutomaton::new(),
            ledger,
            current,
            current_id:         StateId::OUT_OF_DOMAIN,
            same_page_ticks:    0,
            no_new_state_ticks: 0,
            recoveries:         0,
            rng:                seeded_rng(config.seed.map(|s| s.wrapping_add(1))),
            trace:              Trace::new(),
            config,
        };

        // Start with the default set of phase handlers.
        let mut handlers: HashMap<Phase, Box<dyn PhaseHandler>> = HashMap::new();
        handlers.insert(Phase::Launching,  Box::new(LaunchingPhase));
        handlers.insert(Phase::Running,    Box::new(RunningPhase));
        handlers.insert(Phase::Recovering, Box::new(RecoveringPhase));
        handlers.insert(Phase::Done,       Box::new(DonePhase));

        // Merge in any custom overrides, replacing defaults for the same phase.
        for (phase, handler) in self.handlers {
            handlers.insert(phase, handler);
        }

        Ok(Explorer::new(ctx, build_transition_table(), handlers, store))
    }
}
