use crate::error::ExploreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which decision policy drives a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Random,
    #[default]
    QLearning,
    Dfs,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Random    => "random",
            AgentKind::QLearning => "q_learning",
            AgentKind::Dfs       => "dfs",
        }
    }
}

/// Consecutive-tick thresholds that declare exploration stuck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagnationConfig {
    pub same_page_ticks:    usize,
    pub no_new_state_ticks: usize,
}

impl Default for StagnationConfig {
    fn default() -> Self {
        Self { same_page_ticks: 14, no_new_state_ticks: 7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    pub alpha:               f64,
    pub gamma:               f64,
    pub epsilon:             f64,
    /// Optimistic value of every action not covered by a rule below.
    pub initial_value:       f64,
    /// Seed of an action that matches a graph edge leaving the page.
    pub ptg_edge_value:      f64,
    /// Seed of Back on a page nothing links to.
    pub dead_end_back_value: f64,
    pub out_of_domain_value: f64,
    pub same_url_value:      f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha:               0.1,
            gamma:               0.5,
            epsilon:             0.1,
            initial_value:       10.0,
            ptg_edge_value:      10.4,
            dead_end_back_value: -9999.0,
            out_of_domain_value: -9999.0,
            same_url_value:      -99.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfsConfig {
    pub action_ceiling: usize,
    pub fallback_limit: usize,
}

impl Default for DfsConfig {
    fn default() -> Self {
        Self { action_ceiling: 45, fallback_limit: 15 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextInputConfig {
    pub element_types:    Vec<String>,
    pub timeout_ms:       u64,
    pub fallback_max_len: usize,
}

impl Default for TextInputConfig {
    fn default() -> Self {
        Self {
            element_types:    vec!["TextInput".to_string(), "TextArea".to_string(), "Search".to_string()],
            timeout_ms:       5000,
            fallback_max_len: 10,
        }
    }
}

impl TextInputConfig {
    pub fn accepts(&self, element_type: &str) -> bool {
        self.element_types.iter().any(|t| t == element_type)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Session parameters. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    // ── Target ───────────────────────────────────────────
    pub app:                  String,
    pub entry_ability:        String,

    // ── Pacing and budget ────────────────────────────────
    pub time_budget_secs:     u64,
    pub max_ticks:            Option<usize>,
    pub settle_delay_ms:      u64,
    pub restart_delay_ms:     u64,
    pub record_interval_secs: u64,

    // ── Behaviour ────────────────────────────────────────
    pub similarity_threshold: f64,
    pub recovery:             bool,
    pub use_ptg:              bool,
    /// Static page-graph seed, loaded at build time when the file exists.
    pub ptg_seed:             Option<String>,
    pub emit_same_url:        bool,
    pub agent:                AgentKind,
    pub seed:                 Option<u64>,

    // ── Output ───────────────────────────────────────────
    pub output_dir:           String,

    pub stagnation:           StagnationConfig,
    pub q_learning:           QLearningConfig,
    pub dfs:                  DfsConfig,
    pub text_input:           TextInputConfig,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            app:                  String::new(),
            entry_ability:        "EntryAbility".to_string(),
            time_budget_secs:     60,
            max_ticks:            None,
            settle_delay_ms:      1500,
            restart_delay_ms:     3000,
            record_interval_secs: 60,
            similarity_threshold: crate::canonical::DEFAULT_SIMILARITY_THRESHOLD,
            recovery:             false,
            use_ptg:              false,
            ptg_seed:             None,
            emit_same_url:        false,
            agent:                AgentKind::default(),
            seed:                 None,
            output_dir:           "output".to_string(),
            stagnation:           StagnationConfig::default(),
            q_learning:           QLearningConfig::default(),
            dfs:                  DfsConfig::default(),
            text_input:           TextInputConfig::default(),
        }
    }
}

impl ExploreConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn record_interval(&self) -> Duration {
        Duration::from_secs(self.record_interval_secs.max(1))
    }
}

/// Loads a session configuration.
///
/// 1. An optional file (TOML, YAML or JSON, by extension) is the first source.
/// 2. Environment variables `UIEXPLORE__*` override it; a double underscore
///    separates nested keys (`UIEXPLORE__STAGNATION__SAME_PAGE_TICKS=20`).
pub fn load_config(path: Option<&Path>) -> Result<ExploreConfig, ExploreError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ExploreError::Config(format!("config file not found: {}", path.display())));
        }
        builder = builder.add_source(config::File::from(path.to_path_buf()));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("UIEXPLORE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ExploreError::Config(e.to_string()))
}
