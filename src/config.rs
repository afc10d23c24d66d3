//! Startup configuration.
//!
//! Values are layered with `figment`: built-in defaults, then an optional TOML file, then
//! `FOREST_`-prefixed environment variables (`FOREST_ENGINE__RETRY_BUDGET=5`). Every
//! section is extracted and validated on its own, so one bad section falls back to its
//! defaults without affecting the others.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{player, SUBSYSTEM_THRESHOLD, TARGET_TICK_RATE};
use crate::engine::RecoveryPolicy;
use crate::error::ConfigurationError;
use crate::systems::profiling::Thresholds;

/// File read when no explicit path is given.
pub const CONFIG_FILE: &str = "forest-survival.toml";
pub const ENV_PREFIX: &str = "FOREST_";

/// A validated top-level table.
trait Section: DeserializeOwned + Default {
    const NAME: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub target_tick_rate: u32,
    /// Consecutive failed updates before a subsystem is excluded.
    pub retry_budget: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_tick_rate: TARGET_TICK_RATE,
            retry_budget: RecoveryPolicy::default().retry_budget,
        }
    }
}

impl Section for EngineConfig {
    const NAME: &'static str = "engine";

    fn validate(&self) -> Result<(), String> {
        if !(1..=1000).contains(&self.target_tick_rate) {
            return Err(format!("target_tick_rate must be within 1..=1000, got {}", self.target_tick_rate));
        }
        if self.retry_budget == 0 {
            return Err("retry_budget must be at least 1".to_string());
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            retry_budget: self.retry_budget,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.target_tick_rate.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Overrides the frame-time threshold, which otherwise is one tick.
    pub frame_threshold_ms: Option<f64>,
    pub subsystem_threshold_ms: f64,
    pub memory_threshold_mb: Option<u64>,
    /// Frames between memory samples; zero disables sampling.
    pub memory_sample_interval: u32,
}

/// Timing thresholds above one minute are rejected.
const MAX_THRESHOLD_MS: f64 = 60_000.0;

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            frame_threshold_ms: None,
            subsystem_threshold_ms: SUBSYSTEM_THRESHOLD.as_secs_f64() * 1000.0,
            memory_threshold_mb: Some(512),
            memory_sample_interval: 120,
        }
    }
}

impl Section for PerformanceConfig {
    const NAME: &'static str = "performance";

    fn validate(&self) -> Result<(), String> {
        let in_range = |value: f64| value > 0.0 && value <= MAX_THRESHOLD_MS;
        if let Some(frame) = self.frame_threshold_ms {
            if !in_range(frame) {
                return Err(format!(
                    "frame_threshold_ms must be in (0, {MAX_THRESHOLD_MS}], got {frame}"
                ));
            }
        }
        if !in_range(self.subsystem_threshold_ms) {
            return Err(format!(
                "subsystem_threshold_ms must be in (0, {MAX_THRESHOLD_MS}], got {}",
                self.subsystem_threshold_ms
            ));
        }
        if self.memory_threshold_mb == Some(0) {
            return Err("memory_threshold_mb must be positive".to_string());
        }
        Ok(())
    }
}

impl PerformanceConfig {
    pub fn thresholds(&self, tick_rate: u32) -> Thresholds {
        let defaults = Thresholds::for_tick_rate(tick_rate);
        Thresholds {
            frame: self
                .frame_threshold_ms
                .map(|ms| Duration::from_secs_f64(ms / 1000.0))
                .unwrap_or(defaults.frame),
            subsystem: Duration::from_secs_f64(self.subsystem_threshold_ms / 1000.0),
            memory_bytes: self.memory_threshold_mb.map(|mb| mb.saturating_mul(1024 * 1024)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Fixed seed for reproducible runs; a time-based seed is used when absent.
    pub seed: Option<u64>,
    pub starting_health: u8,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            seed: None,
            starting_health: player::MAX_HEALTH,
        }
    }
}

impl Section for GameplayConfig {
    const NAME: &'static str = "gameplay";

    fn validate(&self) -> Result<(), String> {
        if !(1..=player::MAX_HEALTH).contains(&self.starting_health) {
            return Err(format!(
                "starting_health must be within 1..={}, got {}",
                player::MAX_HEALTH,
                self.starting_health
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the best score is kept. Nothing is persisted when absent.
    pub best_score_path: Option<PathBuf>,
}

impl Section for StorageConfig {
    const NAME: &'static str = "storage";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub performance: PerformanceConfig,
    pub gameplay: GameplayConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// The standard provider stack: defaults, the TOML file, then the environment.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads from the standard stack. Invalid sections are reported and replaced by
    /// their defaults.
    pub fn load(path: Option<&Path>) -> (Self, Vec<ConfigurationError>) {
        Self::from_figment(&Self::figment(path))
    }

    pub fn from_figment(figment: &Figment) -> (Self, Vec<ConfigurationError>) {
        let mut errors = Vec::new();
        let config = Self {
            engine: extract_section(figment, &mut errors),
            performance: extract_section(figment, &mut errors),
            gameplay: extract_section(figment, &mut errors),
            storage: extract_section(figment, &mut errors),
        };
        (config, errors)
    }
}

fn extract_section<T: Section>(figment: &Figment, errors: &mut Vec<ConfigurationError>) -> T {
    let checked = if figment.contains(T::NAME) {
        figment
            .extract_inner::<T>(T::NAME)
            .map_err(|e| e.to_string())
            .and_then(|section| section.validate().map(|_| section))
    } else {
        Ok(T::default())
    };

    checked.unwrap_or_else(|reason| {
        let error = ConfigurationError::InvalidSection {
            section: T::NAME.to_string(),
            reason,
        };
        warn!(%error, "Using defaults for configuration section");
        errors.push(error);
        T::default()
    })
}
