use thiserror::Error;
use crate::events::Event;
use crate::types::Phase;

#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("Invalid transition: {from} + {event} not in transition table")]
    InvalidTransition { from: Phase, event: Event },

    #[error("No handler registered for phase: {0}")]
    NoHandlerForPhase(Phase),

    #[error("Build error: {0}")]
    BuildError(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Failures reported by a device driver. None of these are fatal to a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("device command failed: {0}")]
    Command(String),

    #[error("no element matches locator '{0}'")]
    ElementNotFound(String),

    #[error("device unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("no actions available on {ability}/{page}")]
    NoActions { ability: String, page: String },
}
