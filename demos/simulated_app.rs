//! # Simulated App Example
//!
//! Explores a small in-process shopping app with the graph-guided agent,
//! seeded with a static page transition graph, and writes the session
//! artifacts under `./output`.
//!
//! # Usage
//! ```bash
//! cargo run --example simulated_app
//! RUST_LOG=uiexplore=debug cargo run --example simulated_app
//! UIEXPLORE__AGENT=q_learning cargo run --example simulated_app
//! ```

use std::sync::Arc;
use uiexplore::driver::{AppModel, SimElement};
use uiexplore::textgen::{AnthropicTextGenerator, OpenAiTextGenerator};
use uiexplore::{
    load_config, AgentKind, ExplorerBuilder, FileSnapshotStore, PageTransitionGraph,
    SharedDevice, SimulatedDevice, TextGenerator,
};

const APP: &str = "com.example.shop";

const SEED_PTG: &str = r#"{
    "pages/Index":   [{"component": "/Column[1]/Button[1]", "targetPage": "pages/Catalog"},
                      {"component": "/Column[1]/Button[2]", "targetPage": "pages/Cart"}],
    "pages/Catalog": [{"component": "/Column[1]/Button[1]", "targetPage": "pages/Detail"}]
}"#;

fn shop() -> AppModel {
    AppModel::new(APP, "EntryAbility", "pages/Index")
        .page("pages/Index", vec![
            SimElement::button("pages/Catalog"),
            SimElement::button("pages/Cart"),
            SimElement::inert("Search"),
        ])
        .page("pages/Catalog", vec![
            SimElement::button("pages/Detail"),
            SimElement::button("pages/Detail"),
            SimElement::inert("Image"),
        ])
        .page("pages/Detail", vec![
            SimElement::button("pages/Cart"),
            SimElement::external_link(),
        ])
        .page("pages/Cart", vec![
            SimElement::button("pages/Checkout"),
            SimElement::inert("TextInput"),
        ])
        .page("pages/Checkout", vec![
            SimElement::inert("TextInput"),
            SimElement::inert("Text"),
        ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== uiexplore-rs Simulated App Example ===\n");

    let mut config = load_config(None)?;
    if config.app.is_empty() {
        config.app = APP.to_string();
    }
    if std::env::var("UIEXPLORE__AGENT").is_err() {
        config.agent = AgentKind::Dfs;
    }
    config.time_budget_secs = 20;
    config.settle_delay_ms = 50;
    config.restart_delay_ms = 100;
    config.record_interval_secs = 5;
    config.recovery = true;
    config.use_ptg = true;
    config.seed = Some(7);

    let device = SharedDevice::new(SimulatedDevice::new(shop()));
    let store = Arc::new(FileSnapshotStore::new(&config.output_dir));
    let ptg = PageTransitionGraph::from_json(SEED_PTG).map_err(anyhow::Error::msg)?;

    let mut builder = ExplorerBuilder::new(config)
        .driver(Box::new(device.clone()))
        .ptg(ptg)
        .store(store)
        .max_ticks(60);

    // Text fields get model-written input when a key is available.
    let text: Option<Arc<dyn TextGenerator>> = if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        AnthropicTextGenerator::from_env("claude-3-5-haiku-latest")
            .ok()
            .map(|g| Arc::new(g) as Arc<dyn TextGenerator>)
    } else if std::env::var("OPENAI_API_KEY").is_ok() {
        Some(Arc::new(OpenAiTextGenerator::new("gpt-4o-mini")))
    } else {
        None
    };
    if let Some(text) = text {
        builder = builder.text_generator(text);
    }

    let mut explorer = builder.build()?;

    let report = explorer.run().await?;

    explorer.trace().print();

    println!("\n── Session {} ──", report.session_id);
    println!("actions:        {}", report.stats.action_count);
    println!("states:         {}", report.stats.state_count);
    println!("raw states:     {}", report.all_states.len());
    println!("ptg edges:      {}", report.ptg.edge_count());
    println!("automaton:      {} edges", report.dfa.len());
    println!("typed:          {:?}", device.with(|d| d.typed_text().to_vec()));
    for (page, visits) in &report.stats.page_count {
        println!("  {:<16} {}", page, visits);
    }

    Ok(())
}
