use std::time::Duration;

use strum_macros::{Display, IntoStaticStr};

use crate::error::ConfigurationError;
use crate::game::context::SimContext;

/// A unit of per-frame work owned by the engine.
///
/// Bodies report failure through `anyhow`; the scheduler turns failures (and panics)
/// into health changes on the registry entry instead of letting them escape the frame.
pub trait Subsystem {
    fn init(&mut self, _ctx: &mut SimContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut SimContext, dt: f32) -> anyhow::Result<()>;

    fn shutdown(&mut self, _ctx: &mut SimContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Names of subsystems that must be registered for this one to initialize.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Gameplay subsystems only run while the game is being played.
    /// UI-only subsystems return `false` and keep running in every mode.
    fn gameplay_only(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    /// Faulted recently but still attempted every frame.
    Degraded,
    /// Exhausted its retry budget; skipped until re-registered.
    Failed,
}

/// A registered subsystem and its runtime bookkeeping.
pub struct SubsystemEntry {
    pub(crate) name: String,
    pub(crate) instance: Box<dyn Subsystem>,
    pub(crate) priority: i32,
    pub(crate) status: HealthStatus,
    pub(crate) initialized: bool,
    pub(crate) consecutive_failures: u32,
    pub(crate) total_failures: u64,
    pub(crate) last_error: Option<String>,
    pub(crate) update_count: u64,
    pub(crate) last_update: Duration,
    pub(crate) average_update: Duration,
}

/// Weight of the newest sample in the running update-time average.
const AVERAGE_WEIGHT: f64 = 0.1;

impl SubsystemEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub(crate) fn record_update(&mut self, elapsed: Duration) {
        self.update_count += 1;
        self.last_update = elapsed;
        self.average_update = if self.update_count == 1 {
            elapsed
        } else {
            self.average_update.mul_f64(1.0 - AVERAGE_WEIGHT) + elapsed.mul_f64(AVERAGE_WEIGHT)
        };
    }

    pub(crate) fn info(&self) -> SubsystemInfo {
        SubsystemInfo {
            name: self.name.clone(),
            priority: self.priority,
            status: self.status,
            initialized: self.initialized,
            consecutive_failures: self.consecutive_failures,
            total_failures: self.total_failures,
            last_error: self.last_error.clone(),
            update_count: self.update_count,
            last_update: self.last_update,
            average_update: self.average_update,
        }
    }
}

/// Read-only snapshot of a registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemInfo {
    pub name: String,
    pub priority: i32,
    pub status: HealthStatus,
    pub initialized: bool,
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub last_error: Option<String>,
    pub update_count: u64,
    pub last_update: Duration,
    pub average_update: Duration,
}

/// A registry mutation requested while an update cycle was running.
pub enum RegistryChange {
    Register {
        name: String,
        instance: Box<dyn Subsystem>,
        priority: i32,
    },
    Unregister(String),
}

/// Named slots kept in update order: ascending priority, then registration order.
#[derive(Default)]
pub struct SystemRegistry {
    entries: Vec<SubsystemEntry>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subsystem. Names are unique.
    pub fn register(
        &mut self,
        name: &str,
        instance: Box<dyn Subsystem>,
        priority: i32,
    ) -> Result<(), ConfigurationError> {
        if self.contains(name) {
            return Err(ConfigurationError::DuplicateSubsystem(name.to_string()));
        }

        // Insert after every entry with an equal or lower priority so that ties keep
        // registration order.
        let index = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(
            index,
            SubsystemEntry {
                name: name.to_string(),
                instance,
                priority,
                status: HealthStatus::Ok,
                initialized: false,
                consecutive_failures: 0,
                total_failures: 0,
                last_error: None,
                update_count: 0,
                last_update: Duration::ZERO,
                average_update: Duration::ZERO,
            },
        );
        Ok(())
    }

    /// Removes an entry and hands it back so the caller can run its shutdown hook.
    pub fn unregister(&mut self, name: &str) -> Option<SubsystemEntry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&SubsystemEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut SubsystemEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Registered names in the order they are updated.
    pub fn update_order(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubsystemEntry> {
        self.entries.iter()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [SubsystemEntry] {
        &mut self.entries
    }
}
