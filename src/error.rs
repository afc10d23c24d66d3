//! Centralized error types for the engine and the simulation.
//!
//! Subsystem bodies return `anyhow::Result<()>`; the scheduler and the event bus turn
//! those failures into [`SystemError`] values at their boundary so a fault never
//! escapes the frame loop.

use std::io;

use strum_macros::{Display, IntoStaticStr};

/// Main error type for the crate.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The lifecycle hook a subsystem was running when it faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Init,
    Update,
    Shutdown,
    EventHandler,
}

/// A registered subsystem (or event handler) faulted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{subsystem}' failed during {phase}: {message}")]
pub struct SystemError {
    pub subsystem: String,
    pub phase: Phase,
    pub message: String,
}

impl SystemError {
    pub fn new(subsystem: impl Into<String>, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            phase,
            message: message.into(),
        }
    }
}

/// A supplied configuration section, or a registration request, is invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("subsystem '{0}' is already registered")]
    DuplicateSubsystem(String),

    #[error("invalid '{section}' section: {reason}")]
    InvalidSection { section: String, reason: String },
}

/// A startup dependency between subsystems could not be satisfied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("'{dependent}' requires '{dependency}', which is not registered")]
    MissingDependency { dependent: String, dependency: String },

    #[error("subsystem '{0}' is not registered")]
    UnknownSubsystem(String),
}

/// Result type for engine operations.
pub type GameResult<T> = Result<T, GameError>;

/// Extracts a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}
