use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use async_trait::async_trait;
use uiexplore::config::{AgentKind, ExploreConfig, StagnationConfig};
use uiexplore::driver::{AppModel, SimElement};
use uiexplore::textgen::MockTextGenerator;
use uiexplore::{
    Action, Agent, Event, ExploreContext, ExploreError, ExploreView, ExplorerBuilder,
    ActionId, MemorySnapshotStore, Observation, PageTransitionGraph, Phase, PhaseHandler, PtgEdge,
    SharedDevice, SimulatedDevice, SnapshotStore, StateId, TransitionRecord, WindowState,
};

const APP: &str = "com.example.app";
const ABILITY: &str = "EntryAbility";
const B1: &str = "/Column[1]/Button[1]";

fn config() -> ExploreConfig {
    ExploreConfig {
        app:              APP.to_string(),
        entry_ability:    ABILITY.to_string(),
        settle_delay_ms:  10,
        restart_delay_ms: 10,
        seed:             Some(7),
        ..ExploreConfig::default()
    }
}

fn click(page: &str, loc: &str) -> Action {
    Action::click(loc, ABILITY, page)
}

fn device(model: AppModel) -> SharedDevice {
    SharedDevice::new(SimulatedDevice::new(model))
}

/// Plays a fixed list of actions, then keeps taking the first available one.
struct ScriptedAgent {
    script: VecDeque<Action>,
}

impl ScriptedAgent {
    fn new(script: Vec<Action>) -> Self {
        Self { script: script.into() }
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &'static str { "scripted" }

    fn select_action(&mut self, obs: Observation<'_>, _view: &ExploreView<'_>) -> Option<Action> {
        let actions = obs.state.actions();
        match self.script.pop_front() {
            // Prefer the detected twin, which carries coordinates.
            Some(next) => Some(actions.iter().find(|a| **a == next).cloned().unwrap_or(next)),
            None => actions.first().cloned(),
        }
    }

    fn update(&mut self, _action: &Action, _obs: Observation<'_>, _view: &ExploreView<'_>) {}
}

// ─────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────

#[test]
fn test_build_requires_driver_and_app() {
    let err = ExplorerBuilder::new(config()).build().err().unwrap();
    assert!(matches!(err, ExploreError::BuildError(_)));

    let model = AppModel::new(APP, ABILITY, "pages/A").page("pages/A", vec![]);
    let no_app = ExploreConfig { app: String::new(), ..config() };
    let err = ExplorerBuilder::new(no_app)
        .driver(Box::new(device(model)))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ExploreError::BuildError(_)));
}

#[test]
fn test_static_seed_is_loaded_from_config() {
    let mut seed = tempfile::NamedTempFile::new().unwrap();
    writeln!(seed, r#"{{"pages/A": [{{"component": "/Column[1]/Button[1]", "targetPage": "pages/B"}}]}}"#).unwrap();
    let path = seed.path().to_string_lossy().into_owned();
    let model = || AppModel::new(APP, ABILITY, "pages/A").page("pages/A", vec![]);

    let cfg = ExploreConfig { ptg_seed: Some(path.clone()), ..config() };
    let explorer = ExplorerBuilder::new(cfg.clone())
        .driver(Box::new(device(model())))
        .build()
        .unwrap();
    assert_eq!(explorer.context().ptg.edges_from("pages/A"), &[PtgEdge::click(B1, "pages/B")]);

    // A graph handed to the builder wins over the configured file.
    let explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(device(model())))
        .ptg(PageTransitionGraph::new())
        .build()
        .unwrap();
    assert_eq!(explorer.context().ptg.edge_count(), 0);

    let missing = ExploreConfig { ptg_seed: Some("/nonexistent/ptg.json".to_string()), ..config() };
    let explorer = ExplorerBuilder::new(missing)
        .driver(Box::new(device(model())))
        .build()
        .unwrap();
    assert_eq!(explorer.context().ptg.edge_count(), 0, "no seed file means an empty graph");

    let mut broken = tempfile::NamedTempFile::new().unwrap();
    writeln!(broken, "not json").unwrap();
    let cfg = ExploreConfig { ptg_seed: Some(broken.path().to_string_lossy().into_owned()), ..config() };
    let err = ExplorerBuilder::new(cfg)
        .driver(Box::new(device(model())))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ExploreError::BuildError(_)));
}

#[test]
fn test_transition_table() {
    use uiexplore::transitions::{build_transition_table, is_valid_transition};
    let table = build_transition_table();
    assert!(is_valid_transition(&table, Phase::Running, Event::Stagnated));
    assert!(is_valid_transition(&table, Phase::Recovering, Event::Recovered));
    assert!(!is_valid_transition(&table, Phase::Launching, Event::Recovered));
    assert!(!is_valid_transition(&table, Phase::Done, Event::Continue));
    assert_eq!(table.get(&(Phase::Running, Event::BudgetExhausted)), Some(&Phase::Done));
}

struct WrongEventPhase;

#[async_trait]
impl PhaseHandler for WrongEventPhase {
    fn name(&self) -> &'static str { "Launching" }

    async fn handle(&self, ctx: &mut ExploreContext) -> Event {
        ctx.log("Launching", "SKIPPED", "");
        Event::Recovered
    }
}

#[tokio::test]
async fn test_invalid_transition_is_an_error() {
    let model = AppModel::new(APP, ABILITY, "pages/A").page("pages/A", vec![]);
    let mut explorer = ExplorerBuilder::new(config())
        .driver(Box::new(device(model)))
        .handler(Phase::Launching, Box::new(WrongEventPhase))
        .build()
        .unwrap();

    let err = explorer.run().await.unwrap_err();
    assert!(matches!(
        err,
        ExploreError::InvalidTransition { from: Phase::Launching, event: Event::Recovered }
    ));
}

// ─────────────────────────────────────────────
// Single steps
// ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_launch_then_tick_updates_tables() {
    let model = AppModel::new(APP, ABILITY, "pages/A")
        .page("pages/A", vec![SimElement::button("pages/B")])
        .page("pages/B", vec![SimElement::inert("Text")]);
    let mut explorer = ExplorerBuilder::new(config())
        .driver(Box::new(device(model)))
        .agent(Box::new(ScriptedAgent::new(vec![click("pages/A", B1)])))
        .build()
        .unwrap();

    explorer.step().await.unwrap();
    assert_eq!(explorer.phase(), Phase::Running);
    assert_eq!(explorer.context().current.page(), Some("pages/A"));
    assert_eq!(explorer.context().current_id, StateId(2));

    explorer.step().await.unwrap();
    let ctx = explorer.context();
    assert_eq!(ctx.tick, 1);
    assert_eq!(ctx.current.page(), Some("pages/B"));
    assert_eq!(ctx.ptg.edges_from("pages/A"), &[PtgEdge::click(B1, "pages/B")]);
    assert_eq!(ctx.dfa.edge_count(), 1);

    let ledger = ctx.ledger.lock();
    assert_eq!(ledger.action_count, 1);
    assert_eq!(ledger.transitions().len(), 1);
    assert_eq!(ledger.transitions()[0].from, StateId(2));
    assert_eq!(ledger.transitions()[0].to, StateId(3));
    assert_eq!(ledger.page_count.get("pages/A"), Some(&1));
    assert_eq!(ledger.page_count.get("pages/B"), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn test_leaving_the_app_is_out_of_domain_and_restart_recovers() {
    let model = AppModel::new(APP, ABILITY, "pages/A")
        .page("pages/A", vec![SimElement::external_link()]);
    let shared = device(model);
    let mut explorer = ExplorerBuilder::new(config())
        .driver(Box::new(shared.clone()))
        .agent(Box::new(ScriptedAgent::new(vec![click("pages/A", B1)])))
        .build()
        .unwrap();

    explorer.step().await.unwrap(); // launch
    explorer.step().await.unwrap(); // click the external link
    assert_eq!(explorer.context().current_id, StateId::OUT_OF_DOMAIN);
    assert!(matches!(explorer.context().current, WindowState::OutOfDomain { .. }));

    explorer.step().await.unwrap(); // the only move left is a restart
    assert_eq!(explorer.context().current.page(), Some("pages/A"));
    assert_eq!(shared.with(|d| d.launch_count()), 2);
}

#[tokio::test(start_paused = true)]
async fn test_text_field_receives_generated_text() {
    let model = AppModel::new(APP, ABILITY, "pages/Search")
        .page("pages/Search", vec![SimElement::inert("TextInput")]);
    let shared = device(model);
    let text = Arc::new(MockTextGenerator::new(vec![Ok("running shoes".to_string())]));
    let field = "/Column[1]/TextInput[1]";

    let mut explorer = ExplorerBuilder::new(config())
        .driver(Box::new(shared.clone()))
        .agent(Box::new(ScriptedAgent::new(vec![click("pages/Search", field)])))
        .text_generator(text.clone())
        .build()
        .unwrap();

    explorer.step().await.unwrap();
    explorer.step().await.unwrap();

    assert_eq!(shared.with(|d| d.typed_text().to_vec()), vec!["running shoes".to_string()]);
    assert_eq!(text.call_count(), 1);
    let request = text.request_for_call(0).unwrap();
    assert_eq!(request.page, "pages/Search");
    assert_eq!(request.element_type, "TextInput");
    assert_eq!(request.location, field);
}

#[tokio::test(start_paused = true)]
async fn test_failed_text_generation_types_random_text() {
    let model = AppModel::new(APP, ABILITY, "pages/Search")
        .page("pages/Search", vec![SimElement::inert("Search")]);
    let shared = device(model);
    let text = Arc::new(MockTextGenerator::new(vec![Err("quota exceeded".to_string())]));

    let mut explorer = ExplorerBuilder::new(config())
        .driver(Box::new(shared.clone()))
        .agent(Box::new(ScriptedAgent::new(vec![click("pages/Search", "/Column[1]/Search[1]")])))
        .text_generator(text)
        .build()
        .unwrap();

    explorer.step().await.unwrap();
    explorer.step().await.unwrap();

    let typed = shared.with(|d| d.typed_text().to_vec());
    assert_eq!(typed.len(), 1);
    assert!((1..=10).contains(&typed[0].len()));
    assert!(typed[0].chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_screen_is_same_url() {
    let model = AppModel::new(APP, ABILITY, "pages/A")
        .page("pages/A", vec![SimElement::inert("Text")]);
    let cfg = ExploreConfig { emit_same_url: true, ..config() };
    let mut explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(device(model)))
        .agent(Box::new(ScriptedAgent::new(vec![click("pages/A", "/Column[1]/Text[1]")])))
        .build()
        .unwrap();

    explorer.step().await.unwrap();
    let launched = explorer.context().current_id;
    explorer.step().await.unwrap();

    let ctx = explorer.context();
    assert_eq!(ctx.current_id, launched, "the explorer stays on the previous state");
    assert_eq!(ctx.same_page_ticks, 1);
    assert_eq!(explorer.trace().with_event("SAME_URL").len(), 1);
    assert_eq!(ctx.ledger.lock().transitions()[0].to, StateId::SAME_URL);
}

// ─────────────────────────────────────────────
// Whole sessions
// ─────────────────────────────────────────────

fn chain_app() -> AppModel {
    AppModel::new(APP, ABILITY, "pages/A")
        .page("pages/A", vec![SimElement::button("pages/B"), SimElement::inert("Text")])
        .page("pages/B", vec![SimElement::button("pages/C"), SimElement::inert("Text")])
        .page("pages/C", vec![SimElement::inert("Text")])
}

fn chain_graph() -> PageTransitionGraph {
    let mut ptg = PageTransitionGraph::new();
    ptg.add_edge("pages/A", PtgEdge::click(B1, "pages/B"));
    ptg.add_edge("pages/B", PtgEdge::click(B1, "pages/C"));
    ptg
}

fn dfs_config() -> ExploreConfig {
    ExploreConfig { agent: AgentKind::Dfs, use_ptg: true, ..config() }
}

#[tokio::test(start_paused = true)]
async fn test_dfs_reaches_deepest_page_without_falling_back() {
    let mut explorer = ExplorerBuilder::new(dfs_config())
        .driver(Box::new(device(chain_app())))
        .ptg(chain_graph())
        .max_ticks(2)
        .build()
        .unwrap();

    let report = explorer.run().await.unwrap();

    assert_eq!(report.stats.action_count, 2);
    assert_eq!(report.stats.page_count.get("pages/C"), Some(&1));
    assert_eq!(explorer.phase(), Phase::Done);
}

#[tokio::test(start_paused = true)]
async fn test_dfs_session_records_each_edge_once() {
    let store = Arc::new(MemorySnapshotStore::new());
    let mut explorer = ExplorerBuilder::new(dfs_config())
        .driver(Box::new(device(chain_app())))
        .ptg(chain_graph())
        .store(store.clone())
        .session_id("chain")
        .max_ticks(25)
        .build()
        .unwrap();

    let report = explorer.run().await.unwrap();

    let to_b = report.ptg.edges_from("pages/A").iter().filter(|e| e.target_page == "pages/B").count();
    let to_c = report.ptg.edges_from("pages/B").iter().filter(|e| e.target_page == "pages/C").count();
    assert_eq!((to_b, to_c), (1, 1));
    assert!(report.stats.page_count.contains_key("pages/C"));
    assert_eq!(report.stats.action_count, 25);

    let saved = store.load_final("chain").await.unwrap().unwrap();
    assert_eq!(saved, report);
    assert!(!store.load_stats("chain").await.unwrap().is_empty());
    assert_eq!(store.list_sessions().await.unwrap(), vec!["chain".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_fourteen_ticks_on_one_page_trigger_one_recovery() {
    let model = AppModel::new(APP, ABILITY, "pages/Home")
        .page("pages/Home", vec![
            SimElement::inert("Text"),
            SimElement::inert("Image"),
            SimElement::inert("Text"),
        ]);
    let cfg = ExploreConfig {
        agent:      AgentKind::Random,
        recovery:   true,
        stagnation: StagnationConfig { same_page_ticks: 14, no_new_state_ticks: 1000 },
        ..config()
    };
    let mut explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(device(model)))
        .max_ticks(20)
        .build()
        .unwrap();

    explorer.run().await.unwrap();

    let trace = explorer.trace();
    assert_eq!(trace.count_transitions("Running", "Recovering"), 1);
    assert_eq!(trace.count_transitions("Recovering", "Running"), 1);
    assert_eq!(trace.with_event("STAGNATED")[0].tick, 14);
    // A single-page app offers no page to recover towards.
    assert_eq!(trace.with_event("RECOVERY_ABORTED").len(), 1);
    assert!(trace.with_event("RECOVERED").is_empty());
    assert_eq!(explorer.context().recoveries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_replays_a_learned_route() {
    let model = AppModel::new(APP, ABILITY, "pages/Home")
        .page("pages/Home", vec![SimElement::button("pages/List")])
        .page("pages/List", vec![SimElement::button("pages/Detail"), SimElement::inert("Text")])
        .page("pages/Detail", vec![SimElement::inert("Image")]);

    // Statically known links make List the richest page.
    let mut ptg = PageTransitionGraph::new();
    ptg.add_edge("pages/List", PtgEdge::click("/Tabs[1]", "pages/Orders"));
    ptg.add_edge("pages/List", PtgEdge::click("/Tabs[2]", "pages/Profile"));

    let script = vec![
        click("pages/Home", B1),
        click("pages/List", B1),
        Action::back(ABILITY, "pages/Detail"),
        click("pages/List", "/Column[1]/Text[1]"),
        click("pages/List", "/Column[1]/Text[1]"),
        click("pages/List", "/Column[1]/Text[1]"),
    ];
    let cfg = ExploreConfig {
        recovery:   true,
        stagnation: StagnationConfig { same_page_ticks: 3, no_new_state_ticks: 1000 },
        ..config()
    };
    let shared = device(model);
    let mut explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(shared.clone()))
        .agent(Box::new(ScriptedAgent::new(script)))
        .ptg(ptg)
        .max_ticks(6)
        .build()
        .unwrap();

    explorer.run().await.unwrap();

    let trace = explorer.trace();
    assert_eq!(trace.count_transitions("Running", "Recovering"), 1);
    assert!(trace.with_event("RECOVERY_ABORTED").is_empty());

    // Either heuristic picks a page the route can reach: Detail (least
    // visited) or List (richest).
    let recovered = trace.with_event("RECOVERED");
    assert_eq!(recovered.len(), 1);
    let data = &recovered[0].data;
    let target = data.split_whitespace().find_map(|kv| kv.strip_prefix("target=")).unwrap();
    let reached = data.split_whitespace().find_map(|kv| kv.strip_prefix("reached=")).unwrap();
    assert_eq!(target, reached);
    assert!(target == "pages/Detail" || target == "pages/List");
    assert_eq!(shared.with(|d| d.current_path().map(str::to_string)), Some(target.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_replay_skips_a_vanished_step_and_keeps_going() {
    let link = SimElement {
        element_type: "Text".to_string(),
        target:       Some("pages/Detail".to_string()),
        leaves_app:   false,
    };
    let mut home = vec![SimElement::button("pages/List")];
    home.extend((0..5).map(|_| SimElement::inert("Text")));
    let model = AppModel::new(APP, ABILITY, "pages/Home")
        .page("pages/Home", home)
        .page("pages/List", vec![link])
        .page("pages/Detail", vec![SimElement::inert("Image")]);

    // Detail is both the least visited and the richest page.
    let mut ptg = PageTransitionGraph::new();
    ptg.add_edge("pages/Detail", PtgEdge::click("/Tabs[1]", "pages/Orders"));
    ptg.add_edge("pages/Detail", PtgEdge::click("/Tabs[2]", "pages/Profile"));

    let script = vec![
        click("pages/Home", B1),
        click("pages/List", "/Column[1]/Text[1]"),
        Action::back(ABILITY, "pages/Detail"),
        Action::back(ABILITY, "pages/List"),
    ];
    let cfg = ExploreConfig {
        recovery:   true,
        stagnation: StagnationConfig { same_page_ticks: 1000, no_new_state_ticks: 2 },
        ..config()
    };
    let shared = device(model);
    let mut explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(shared.clone()))
        .agent(Box::new(ScriptedAgent::new(script)))
        .ptg(ptg)
        .build()
        .unwrap();

    // Launch, then Home -> List -> Detail -> List -> Home.
    for _ in 0..5 {
        explorer.step().await.unwrap();
    }
    assert_eq!(explorer.phase(), Phase::Recovering);
    assert_eq!(explorer.context().current.page(), Some("pages/Home"));
    assert_eq!(shared.with(|d| d.click_count()), 2);

    // The first hop of the learned route disappears. Home keeps 6 of its 7
    // actions, so it still folds into the known Home state.
    shared.with(|d| {
        d.model_mut().pages.get_mut("pages/Home").unwrap().elements.remove(0);
    });

    explorer.step().await.unwrap();
    assert_eq!(explorer.phase(), Phase::Running);

    let trace = explorer.trace();
    assert!(trace.with_event("RECOVERY_ABORTED").is_empty());
    let failed = trace.with_event("REPLAY_STEP_FAILED");
    assert_eq!(failed.len(), 1);
    assert!(failed[0].data.starts_with("step 1 "));

    let recovered = trace.with_event("RECOVERED");
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].data, "target=pages/Detail reached=pages/Home steps=2");

    // Step 2 still ran: its locator resolves on Home and gets clicked.
    assert_eq!(shared.with(|d| d.click_count()), 3);
    assert_eq!(trace.count_transitions("Recovering", "Running"), 1);

    let ctx = explorer.context();
    assert_eq!(ctx.current_id, StateId(2));
    let restart = TransitionRecord { from: StateId(2), action: ActionId(0), to: StateId(2) };
    assert_eq!(ctx.ledger.lock().transition_count(&restart), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wall_clock_budget_ends_the_session() {
    let model = AppModel::new(APP, ABILITY, "pages/A")
        .page("pages/A", vec![SimElement::button("pages/B")])
        .page("pages/B", vec![SimElement::inert("Text")]);
    let cfg = ExploreConfig {
        agent:                AgentKind::Random,
        time_budget_secs:     10,
        settle_delay_ms:      1000,
        restart_delay_ms:     0,
        record_interval_secs: 2,
        ..config()
    };
    let store = Arc::new(MemorySnapshotStore::new());
    let mut explorer = ExplorerBuilder::new(cfg)
        .driver(Box::new(device(model)))
        .store(store.clone())
        .session_id("budget")
        .build()
        .unwrap();

    let report = explorer.run().await.unwrap();

    assert_eq!(explorer.context().tick, 10);
    assert_eq!(report.stats.action_count, 10);
    let totals = explorer.trace().event_totals();
    assert_eq!(totals.get("SESSION_COMPLETE"), Some(&1));

    let snapshots = store.load_stats("budget").await.unwrap();
    assert!(snapshots.len() >= 4, "periodic snapshots plus the final one");
    assert!(snapshots.windows(2).all(|w| w[0].elapsed_secs <= w[1].elapsed_secs));
}
