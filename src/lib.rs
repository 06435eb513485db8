pub mod types;
pub mod action;
pub mod state;
pub mod ui;
pub mod detector;
pub mod driver;
pub mod abstraction;
pub mod canonical;
pub mod ledger;
pub mod ptg;
pub mod dfa;
pub mod agent;
pub mod events;
pub mod transitions;
pub mod phases;
pub mod context;
pub mod engine;
pub mod builder;
pub mod budget;
pub mod trace;
pub mod snapshot;
pub mod textgen;
pub mod config;
pub mod error;

// Convenience re-exports at crate root
pub use builder::ExplorerBuilder;
pub use engine::Explorer;
pub use context::ExploreContext;
pub use types::{Phase, StateId, ActionId};
pub use action::{Action, ClickAction, Locator, PageRef};
pub use state::{ActionSetState, WindowState};
pub use ui::{Bounds, UiNode};
pub use detector::{ActionDetector, ClickActionDetector};
pub use driver::{execute_action, Driver, Execution, KeyCode, SharedDevice, SimulatedDevice};
pub use abstraction::{ActionCatalog, Catalog, StateCatalog};
pub use canonical::{StateRegistry, StateSummary};
pub use ledger::{SessionLedger, SharedLedger, StatsSnapshot, TransitionRecord};
pub use ptg::{PageTransitionGraph, PtgEdge};
pub use dfa::{DfaEdge, NavigationAutomaton};
pub use agent::{Agent, DfsAgent, ExploreView, Observation, QLearningAgent, QTable, RandomAgent};
pub use events::Event;
pub use phases::PhaseHandler;
pub use budget::SessionBudget;
pub use trace::{Trace, TraceEntry};
pub use snapshot::{FileSnapshotStore, FinalReport, MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
pub use textgen::{TextGenerator, TextRequest};
pub use config::{load_config, AgentKind, ExploreConfig};
pub use error::{DriverError, ExploreError, StateError};
