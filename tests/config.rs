use std::time::Duration;

use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use forest_survival::config::{Config, EngineConfig, GameplayConfig, PerformanceConfig};
use forest_survival::error::ConfigurationError;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

fn from_toml(toml: &str) -> (Config, Vec<ConfigurationError>) {
    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml));
    Config::from_figment(&figment)
}

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_that(&config.engine.target_tick_rate).is_equal_to(60);
    assert_that(&config.engine.retry_budget).is_equal_to(3);
    assert_that(&config.gameplay.starting_health).is_equal_to(3);
    assert_that(&config.gameplay.seed).is_none();
    assert_that(&config.storage.best_score_path).is_none();

    let thresholds = config.performance.thresholds(config.engine.target_tick_rate);
    assert_that(&thresholds.subsystem).is_equal_to(Duration::from_millis(2));
    assert_that(&thresholds.memory_bytes).is_equal_to(Some(512 * 1024 * 1024));
}

#[test]
fn test_empty_document_gives_defaults() {
    let (config, errors) = from_toml("");

    assert_eq!(config, Config::default());
    assert_that(&errors).is_empty();
}

#[test]
fn test_valid_overrides_are_applied() {
    let (config, errors) = from_toml(
        r#"
        [engine]
        target_tick_rate = 30
        retry_budget = 5

        [gameplay]
        seed = 1234

        [storage]
        best_score_path = "scores/best.json"
        "#,
    );

    assert_that(&errors).is_empty();
    assert_that(&config.engine.target_tick_rate).is_equal_to(30);
    assert_that(&config.engine.policy().retry_budget).is_equal_to(5);
    assert_that(&config.engine.tick_duration()).is_equal_to(Duration::from_secs(1) / 30);
    assert_that(&config.gameplay.seed).is_equal_to(Some(1234));
    assert_that(&config.gameplay.starting_health).is_equal_to(3);
    assert_eq!(
        config.storage.best_score_path.as_deref(),
        Some(std::path::Path::new("scores/best.json"))
    );
}

#[test]
fn test_invalid_section_falls_back_alone() {
    let (config, errors) = from_toml(
        r#"
        [engine]
        target_tick_rate = 0

        [gameplay]
        seed = 99
        "#,
    );

    assert_eq!(config.engine, EngineConfig::default());
    assert_that(&config.gameplay.seed).is_equal_to(Some(99));
    assert_that(&errors).has_length(1);
    match &errors[0] {
        ConfigurationError::InvalidSection { section, reason } => {
            assert_eq!(section, "engine");
            assert_that(reason).contains("target_tick_rate");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_wrong_types_are_reported_per_section() {
    let (config, errors) = from_toml(
        r#"
        [performance]
        subsystem_threshold_ms = "fast"

        [gameplay]
        starting_health = 9
        "#,
    );

    assert_eq!(config.performance, PerformanceConfig::default());
    assert_eq!(config.gameplay, GameplayConfig::default());
    let sections: Vec<_> = errors
        .iter()
        .map(|e| match e {
            ConfigurationError::InvalidSection { section, .. } => section.as_str(),
            _ => "",
        })
        .collect();
    assert_eq!(sections, vec!["performance", "gameplay"]);
}

#[test]
fn test_zero_retry_budget_is_rejected() {
    let (config, errors) = from_toml("[engine]\nretry_budget = 0\n");

    assert_that(&config.engine.retry_budget).is_equal_to(3);
    assert_that(&errors).has_length(1);
}

#[test]
fn test_frame_threshold_override() {
    let (config, errors) = from_toml("[performance]\nframe_threshold_ms = 25.0\nmemory_threshold_mb = 64\n");

    assert_that(&errors).is_empty();
    let thresholds = config.performance.thresholds(60);
    assert_that(&thresholds.frame).is_equal_to(Duration::from_millis(25));
    assert_that(&thresholds.memory_bytes).is_equal_to(Some(64 * 1024 * 1024));
}

#[test]
fn test_missing_file_loads_defaults() {
    let path = std::env::temp_dir().join("forest-survival-no-such-config.toml");
    let (config, errors) = Config::load(Some(path.as_path()));

    assert_that(&errors).is_empty();
    assert_that(&config.engine.target_tick_rate).is_equal_to(60);
}

#[test]
fn test_huge_memory_threshold_saturates() {
    let (config, errors) = from_toml("[performance]\nmemory_threshold_mb = 9223372036854775807\n");

    assert_that(&errors).is_empty();
    let thresholds = config.performance.thresholds(60);
    assert_that(&thresholds.memory_bytes).is_equal_to(Some(u64::MAX));
}

#[test]
fn test_out_of_range_timing_threshold_is_rejected() {
    let (config, errors) = from_toml("[performance]\nframe_threshold_ms = 1e300\n");

    assert_eq!(config.performance, PerformanceConfig::default());
    assert_that(&errors).has_length(1);
    assert_that(&errors[0].to_string()).contains("frame_threshold_ms");
}
