//! Keeps the most recent engine health events for the end-of-run report.

use std::sync::Arc;
use std::time::Duration;

use circular_buffer::CircularBuffer;
use parking_lot::Mutex;

use crate::events::{topics, Event, EventBus, SubscriptionId};

/// How many diagnostic records are retained.
pub const DIAGNOSTIC_HISTORY: usize = 64;

/// Topics recorded by [`DiagnosticsLog::attach`].
pub const DIAGNOSTIC_TOPICS: [&str; 4] = [
    topics::SYSTEM_ERROR,
    topics::SUBSYSTEM_FAILED,
    topics::PERFORMANCE_WARNING,
    topics::MEMORY_THRESHOLD_EXCEEDED,
];

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRecord {
    pub topic: String,
    pub source: String,
    pub timestamp: Duration,
    /// `key=value` pairs from the payload, space separated.
    pub detail: String,
}

impl DiagnosticRecord {
    fn from_event(event: &Event) -> Self {
        let detail = event
            .payload
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            topic: event.topic.clone(),
            source: event.source.clone(),
            timestamp: event.timestamp,
            detail,
        }
    }
}

/// A shared, bounded log of health events. Clones refer to the same history.
#[derive(Clone, Default)]
pub struct DiagnosticsLog {
    records: Arc<Mutex<CircularBuffer<DIAGNOSTIC_HISTORY, DiagnosticRecord>>>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every diagnostic topic on `bus`.
    pub fn attach(&self, bus: &EventBus) -> Vec<SubscriptionId> {
        DIAGNOSTIC_TOPICS
            .iter()
            .map(|topic| {
                let log = self.clone();
                bus.subscribe(topic, "diagnostics", move |event| {
                    log.record(event);
                    Ok(())
                })
            })
            .collect()
    }

    pub fn record(&self, event: &Event) {
        self.records.lock().push_back(DiagnosticRecord::from_event(event));
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copies out the retained records, oldest first.
    pub fn snapshot(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn count(&self, topic: &str) -> usize {
        self.records.lock().iter().filter(|r| r.topic == topic).count()
    }
}
