use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{error, info, warn};

use crate::engine::registry::{HealthStatus, SubsystemEntry, SystemRegistry};
use crate::error::{panic_message, Phase, SystemError};
use crate::events::{topics, Payload, ENGINE_SOURCE};
use crate::game::context::SimContext;
use crate::systems::profiling::PerformanceMonitor;

/// How many consecutive failed updates a subsystem is allowed before it is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub retry_budget: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self { retry_budget: 3 }
    }
}

/// What happened during one update cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub ran: u32,
    pub skipped: u32,
    pub faults: SmallVec<[SystemError; 2]>,
    /// Subsystems that exhausted their retry budget during this cycle.
    pub newly_failed: SmallVec<[String; 2]>,
}

/// Runs a subsystem hook, converting both `Err` and panics into a message.
pub(crate) fn guarded(hook: impl FnOnce() -> anyhow::Result<()>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(format!("{error:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

/// Invokes every registered subsystem once per frame, in registry order.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    policy: RecoveryPolicy,
}

impl Scheduler {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// Runs one update cycle.
    ///
    /// Failed and uninitialized entries are skipped, as are gameplay-only entries while
    /// the game is not being played. A fault never stops the cycle.
    pub fn run_cycle(
        &self,
        registry: &mut SystemRegistry,
        ctx: &mut SimContext,
        monitor: &mut PerformanceMonitor,
        dt: f32,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        let simulating = ctx.mode().is_simulating();

        for entry in registry.entries_mut() {
            if entry.status == HealthStatus::Failed || !entry.initialized {
                report.skipped += 1;
                continue;
            }
            if entry.instance.gameplay_only() && !simulating {
                report.skipped += 1;
                continue;
            }

            ctx.set_source(&entry.name);
            let start = Instant::now();
            let result = guarded(|| entry.instance.update(ctx, dt));
            let elapsed = start.elapsed();
            ctx.set_source(ENGINE_SOURCE);

            entry.record_update(elapsed);
            monitor.record_subsystem(&entry.name, elapsed, ctx.bus());

            match result {
                Ok(()) => {
                    if entry.status == HealthStatus::Degraded {
                        info!(subsystem = %entry.name, "Subsystem recovered");
                    }
                    entry.status = HealthStatus::Ok;
                    entry.consecutive_failures = 0;
                    report.ran += 1;
                }
                Err(message) => self.record_failure(entry, ctx, message, &mut report),
            }
        }

        report
    }

    fn record_failure(&self, entry: &mut SubsystemEntry, ctx: &SimContext, message: String, report: &mut CycleReport) {
        entry.consecutive_failures += 1;
        entry.total_failures += 1;
        entry.last_error = Some(message.clone());

        let exhausted = entry.consecutive_failures >= self.policy.retry_budget;
        entry.status = if exhausted {
            HealthStatus::Failed
        } else {
            HealthStatus::Degraded
        };

        let error = SystemError::new(&entry.name, Phase::Update, message);
        let status: &'static str = entry.status.into();
        ctx.bus().publish(
            topics::SYSTEM_ERROR,
            Payload::new()
                .with("subsystem", entry.name.as_str())
                .with("phase", Phase::Update.to_string())
                .with("message", error.message.as_str())
                .with("consecutive_failures", entry.consecutive_failures)
                .with("status", status),
        );

        if exhausted {
            error!(subsystem = %entry.name, failures = entry.consecutive_failures, %error, "Retry budget exhausted, excluding subsystem");
            ctx.bus().publish(
                topics::SUBSYSTEM_FAILED,
                Payload::new()
                    .with("subsystem", entry.name.as_str())
                    .with("failures", entry.consecutive_failures),
            );
            report.newly_failed.push(entry.name.clone());
        } else {
            warn!(subsystem = %entry.name, failures = entry.consecutive_failures, %error, "Subsystem update failed");
        }

        report.faults.push(error);
    }
}
