use std::io;

use forest_survival::error::{ConfigurationError, GameError, IntegrationError, Phase, SystemError};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

#[test]
fn test_system_error_display() {
    let error = SystemError::new("collision", Phase::Update, "boom");

    assert_eq!(error.to_string(), "'collision' failed during update: boom");
    assert_eq!(Phase::EventHandler.to_string(), "event_handler");
}

#[test]
fn test_conversions_into_game_error() {
    let system: GameError = SystemError::new("world", Phase::Init, "no scene").into();
    let config: GameError = ConfigurationError::DuplicateSubsystem("world".to_string()).into();
    let integration: GameError = IntegrationError::MissingDependency {
        dependent: "collision".to_string(),
        dependency: "world".to_string(),
    }
    .into();
    let io: GameError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
    let serialization: GameError = serde_json::from_str::<u64>("{").unwrap_err().into();

    assert!(matches!(system, GameError::System(_)));
    assert!(matches!(config, GameError::Configuration(_)));
    assert!(matches!(integration, GameError::Integration(_)));
    assert!(matches!(io, GameError::Io(_)));
    assert!(matches!(serialization, GameError::Serialization(_)));

    assert_that(&config.to_string()).contains("already registered");
    assert_that(&integration.to_string()).contains("'collision' requires 'world'");
}

#[test]
fn test_invalid_section_display() {
    let error = ConfigurationError::InvalidSection {
        section: "engine".to_string(),
        reason: "retry_budget must be at least 1".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "invalid 'engine' section: retry_budget must be at least 1"
    );
}
