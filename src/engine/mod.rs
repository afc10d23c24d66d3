//! The orchestration engine: subsystem registry, update scheduler, event bus and
//! performance monitor, wired around a single simulation context.

use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

pub mod registry;
pub mod scheduler;

pub use registry::{HealthStatus, RegistryChange, Subsystem, SubsystemEntry, SubsystemInfo, SystemRegistry};
pub use scheduler::{CycleReport, RecoveryPolicy, Scheduler};

use crate::error::{ConfigurationError, IntegrationError, Phase, SystemError};
use crate::events::{topics, EventBus, Payload};
use crate::game::context::SimContext;
use crate::systems::profiling::{Metrics, PerformanceMonitor};
use scheduler::guarded;

/// Constructed once at startup and owned by the frame loop.
pub struct Engine {
    registry: SystemRegistry,
    scheduler: Scheduler,
    bus: EventBus,
    monitor: PerformanceMonitor,
    ctx: SimContext,
    initialized: bool,
}

impl Engine {
    /// `ctx` must have been built on `bus`; both are shared with every subsystem.
    pub fn new(bus: EventBus, ctx: SimContext, policy: RecoveryPolicy, monitor: PerformanceMonitor) -> Self {
        Self {
            registry: SystemRegistry::new(),
            scheduler: Scheduler::new(policy),
            bus,
            monitor,
            ctx,
            initialized: false,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.scheduler.policy()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Adds a subsystem under a unique name.
    ///
    /// After [`Engine::initialize`] has run, the new subsystem is initialized right away.
    /// Subsystems that register others mid-cycle go through [`SimContext::defer_register`].
    pub fn register(
        &mut self,
        name: &str,
        instance: impl Subsystem + 'static,
        priority: i32,
    ) -> Result<(), ConfigurationError> {
        self.register_boxed(name, Box::new(instance), priority)
    }

    pub fn register_boxed(
        &mut self,
        name: &str,
        instance: Box<dyn Subsystem>,
        priority: i32,
    ) -> Result<(), ConfigurationError> {
        self.registry.register(name, instance, priority)?;
        debug!(subsystem = name, priority, "Subsystem registered");
        self.bus.publish(
            topics::SUBSYSTEM_REGISTERED,
            Payload::new().with("subsystem", name).with("priority", priority),
        );

        if self.initialized {
            self.init_entry(name);
        }
        Ok(())
    }

    /// Removes a subsystem and runs its shutdown hook.
    pub fn unregister(&mut self, name: &str) -> Result<(), IntegrationError> {
        let mut entry = self
            .registry
            .unregister(name)
            .ok_or_else(|| IntegrationError::UnknownSubsystem(name.to_string()))?;

        if entry.initialized {
            self.shutdown_entry(&mut entry);
        }
        self.monitor.forget(name);
        self.bus.unsubscribe_owner(name);

        debug!(subsystem = name, "Subsystem unregistered");
        self.bus
            .publish(topics::SUBSYSTEM_UNREGISTERED, Payload::new().with("subsystem", name));
        Ok(())
    }

    /// Initializes every registered subsystem in update order.
    ///
    /// A subsystem whose dependencies are missing, or whose init hook fails, is marked
    /// failed; the rest still initialize. The returned errors are informational.
    pub fn initialize(&mut self) -> Vec<SystemError> {
        let _span = info_span!("initialize").entered();
        let mut errors = Vec::new();

        for name in self.registry.update_order() {
            if let Some(error) = self.init_entry(&name) {
                errors.push(error);
            }
        }
        self.initialized = true;

        let total = self.registry.len();
        let healthy = self
            .registry
            .iter()
            .filter(|e| e.status() != HealthStatus::Failed)
            .count();
        info!(total, healthy, "Engine initialized");
        self.bus.publish(
            topics::SYSTEM_INITIALIZED,
            Payload::new().with("total", total as u64).with("initialized", healthy as u64),
        );
        errors
    }

    fn init_entry(&mut self, name: &str) -> Option<SystemError> {
        let missing = {
            let entry = self.registry.get(name)?;
            entry
                .instance
                .dependencies()
                .iter()
                .find(|dependency| !self.registry.contains(dependency))
                .map(|dependency| dependency.to_string())
        };

        let entry = self.registry.get_mut(name)?;
        let outcome = match missing {
            Some(dependency) => {
                let integration = IntegrationError::MissingDependency {
                    dependent: name.to_string(),
                    dependency,
                };
                Err(integration.to_string())
            }
            None => {
                self.ctx.set_source(name);
                let ctx = &mut self.ctx;
                let instance = &mut entry.instance;
                let result = guarded(|| instance.init(ctx));
                self.ctx.set_source(crate::events::ENGINE_SOURCE);
                result
            }
        };

        match outcome {
            Ok(()) => {
                entry.initialized = true;
                entry.status = HealthStatus::Ok;
                None
            }
            Err(message) => {
                entry.initialized = false;
                entry.status = HealthStatus::Failed;
                entry.last_error = Some(message.clone());
                entry.total_failures += 1;

                let error = SystemError::new(name, Phase::Init, message);
                error!(subsystem = name, %error, "Subsystem failed to initialize");
                self.bus.publish(
                    topics::SYSTEM_ERROR,
                    Payload::new()
                        .with("subsystem", name)
                        .with("phase", Phase::Init.to_string())
                        .with("message", error.message.as_str())
                        .with("status", "failed"),
                );
                Some(error)
            }
        }
    }

    fn shutdown_entry(&mut self, entry: &mut SubsystemEntry) {
        self.ctx.set_source(&entry.name);
        let ctx = &mut self.ctx;
        let instance = &mut entry.instance;
        let result = guarded(|| instance.shutdown(ctx));
        self.ctx.set_source(crate::events::ENGINE_SOURCE);
        entry.initialized = false;

        if let Err(message) = result {
            let error = SystemError::new(&entry.name, Phase::Shutdown, message);
            warn!(subsystem = %entry.name, %error, "Subsystem shutdown failed");
            self.bus.publish(
                topics::SYSTEM_ERROR,
                Payload::new()
                    .with("subsystem", entry.name.as_str())
                    .with("phase", Phase::Shutdown.to_string())
                    .with("message", error.message.as_str()),
            );
        }
    }

    /// Runs one update cycle, records the frame time and applies registry changes that
    /// were requested during the cycle.
    pub fn run_frame(&mut self, dt: f32) -> CycleReport {
        let start = Instant::now();

        let report = self
            .scheduler
            .run_cycle(&mut self.registry, &mut self.ctx, &mut self.monitor, dt);

        self.monitor.record_frame(start.elapsed(), &self.bus);
        self.apply_pending();
        report
    }

    fn apply_pending(&mut self) {
        for change in self.ctx.take_pending() {
            let result = match change {
                RegistryChange::Register { name, instance, priority } => self
                    .register_boxed(&name, instance, priority)
                    .map_err(|e| e.to_string()),
                RegistryChange::Unregister(name) => self.unregister(&name).map_err(|e| e.to_string()),
            };
            if let Err(error) = result {
                warn!(%error, "Deferred registry change rejected");
            }
        }
    }

    /// Shuts every subsystem down in reverse update order.
    pub fn shutdown(&mut self) {
        let _span = info_span!("shutdown").entered();
        let mut names = self.registry.update_order();
        names.reverse();
        for name in names {
            if let Err(error) = self.unregister(&name) {
                warn!(%error, "Shutdown skipped a subsystem");
            }
        }
        self.initialized = false;
        info!("Engine shut down");
    }

    pub fn update_order(&self) -> Vec<String> {
        self.registry.update_order()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn get_system_info(&self, name: &str) -> Option<SubsystemInfo> {
        self.registry.get(name).map(SubsystemEntry::info)
    }

    pub fn system_infos(&self) -> Vec<SubsystemInfo> {
        self.registry.iter().map(SubsystemEntry::info).collect()
    }

    pub fn get_metrics(&self) -> Metrics {
        self.monitor.get_metrics()
    }
}
