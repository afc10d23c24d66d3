use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use circular_buffer::CircularBuffer;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::constants::{METRIC_WINDOW_SIZE, SUBSYSTEM_THRESHOLD};
use crate::events::{topics, EventBus, Payload};
use crate::systems::formatting::{format_report, fps_label, REPORT_LINES};

/// Metric name used for whole-frame timings.
pub const FRAME_METRIC: &str = "frame";

/// Rolling window of durations for a single metric.
#[derive(Debug, Default)]
pub struct TimingBuffer {
    buffer: CircularBuffer<METRIC_WINDOW_SIZE, Duration>,
}

impl TimingBuffer {
    pub fn add_timing(&mut self, duration: Duration) {
        self.buffer.push_back(duration);
    }

    /// Gets the most recent timing from the buffer.
    pub fn get_most_recent_timing(&self) -> Duration {
        self.buffer.back().copied().unwrap_or(Duration::ZERO)
    }

    pub fn max(&self) -> Duration {
        self.buffer.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Mean and sample standard deviation over the window.
    pub fn get_stats(&self) -> (Duration, Duration) {
        // Calculate statistics using Welford's algorithm
        let mut sample_count = 0u16;
        let mut running_mean = 0.0;
        let mut sum_squared_diff = 0.0;

        for duration in self.buffer.iter() {
            let duration_secs = duration.as_secs_f64();
            sample_count += 1;

            let diff_from_mean = duration_secs - running_mean;
            running_mean += diff_from_mean / sample_count as f64;

            let diff_from_new_mean = duration_secs - running_mean;
            sum_squared_diff += diff_from_mean * diff_from_new_mean;
        }

        if sample_count > 0 {
            let variance = if sample_count > 1 {
                sum_squared_diff / (sample_count - 1) as f64
            } else {
                0.0
            };

            (
                Duration::from_secs_f64(running_mean.max(0.0)),
                Duration::from_secs_f64(variance.max(0.0).sqrt()),
            )
        } else {
            (Duration::ZERO, Duration::ZERO)
        }
    }

    pub fn summary(&self) -> MetricSummary {
        let (average, std_dev) = self.get_stats();
        MetricSummary {
            current: self.get_most_recent_timing(),
            average,
            max: self.max(),
            std_dev,
            samples: self.len(),
        }
    }
}

/// Current, average and maximum of one metric over its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricSummary {
    pub current: Duration,
    pub average: Duration,
    pub max: Duration,
    pub std_dev: Duration,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub frame: MetricSummary,
    /// Per-subsystem summaries, sorted by name.
    pub subsystems: Vec<(String, MetricSummary)>,
    /// Resident memory at the last sample; `None` when unknown.
    pub memory_bytes: Option<u64>,
    pub frames: u64,
}

impl Metrics {
    pub fn subsystem(&self, name: &str) -> Option<&MetricSummary> {
        self.subsystems.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// Source of the process's resident memory. `None` means the value is unavailable.
pub trait MemoryProbe {
    fn resident_bytes(&mut self) -> Option<u64>;
}

/// Probe for platforms where memory usage cannot be read.
#[derive(Debug, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn resident_bytes(&mut self) -> Option<u64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub frame: Duration,
    pub subsystem: Duration,
    pub memory_bytes: Option<u64>,
}

impl Thresholds {
    /// A frame is slow once it takes longer than one tick.
    pub fn for_tick_rate(tick_rate: u32) -> Self {
        Self {
            frame: Duration::from_secs(1) / tick_rate.max(1),
            subsystem: SUBSYSTEM_THRESHOLD,
            memory_bytes: None,
        }
    }
}

/// Samples frame and subsystem timings and raises threshold-crossing events.
///
/// Warnings are edge-triggered: a metric publishes once when it goes over its
/// threshold and again only after it has come back under.
pub struct PerformanceMonitor {
    frame: TimingBuffer,
    subsystems: BTreeMap<String, TimingBuffer>,
    thresholds: Thresholds,
    over: BTreeSet<String>,
    probe: Box<dyn MemoryProbe>,
    memory: Option<u64>,
    memory_over: bool,
    /// Frames between memory samples; zero disables sampling.
    sample_interval: u32,
    frames: u64,
}

impl PerformanceMonitor {
    pub fn new(thresholds: Thresholds, probe: Box<dyn MemoryProbe>, sample_interval: u32) -> Self {
        Self {
            frame: TimingBuffer::default(),
            subsystems: BTreeMap::new(),
            thresholds,
            over: BTreeSet::new(),
            probe,
            memory: None,
            memory_over: false,
            sample_interval,
            frames: 0,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Records a finished frame, sampling memory every `sample_interval` frames.
    pub fn record_frame(&mut self, duration: Duration, bus: &EventBus) {
        self.frames += 1;
        self.frame.add_timing(duration);
        self.check(FRAME_METRIC, duration, self.thresholds.frame, bus);

        if self.sample_interval > 0 && self.frames % u64::from(self.sample_interval) == 0 {
            self.sample_memory(bus);
        }
    }

    pub fn record_subsystem(&mut self, name: &str, duration: Duration, bus: &EventBus) {
        match self.subsystems.get_mut(name) {
            Some(buffer) => buffer.add_timing(duration),
            None => {
                let mut buffer = TimingBuffer::default();
                buffer.add_timing(duration);
                self.subsystems.insert(name.to_string(), buffer);
            }
        }
        self.check(name, duration, self.thresholds.subsystem, bus);
    }

    /// Drops the history of a subsystem that left the registry.
    pub fn forget(&mut self, name: &str) {
        self.subsystems.remove(name);
        self.over.remove(name);
    }

    /// Reads the memory probe. A probe that fails or panics leaves the reading unknown.
    pub fn sample_memory(&mut self, bus: &EventBus) {
        let probe = &mut self.probe;
        self.memory = panic::catch_unwind(AssertUnwindSafe(|| probe.resident_bytes())).unwrap_or(None);

        let (Some(bytes), Some(threshold)) = (self.memory, self.thresholds.memory_bytes) else {
            return;
        };

        if bytes > threshold {
            if !self.memory_over {
                self.memory_over = true;
                warn!(bytes, threshold, "Memory threshold exceeded");
                bus.publish(
                    topics::MEMORY_THRESHOLD_EXCEEDED,
                    Payload::new().with("bytes", bytes).with("threshold", threshold),
                );
            }
        } else {
            self.memory_over = false;
        }
    }

    pub fn memory_bytes(&self) -> Option<u64> {
        self.memory
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_metrics(&self) -> Metrics {
        Metrics {
            frame: self.frame.summary(),
            subsystems: self
                .subsystems
                .iter()
                .map(|(name, buffer)| (name.clone(), buffer.summary()))
                .collect(),
            memory_bytes: self.memory,
            frames: self.frames,
        }
    }

    fn check(&mut self, metric: &str, value: Duration, threshold: Duration, bus: &EventBus) {
        if value > threshold {
            if self.over.insert(metric.to_string()) {
                debug!(metric, ?value, ?threshold, "Performance threshold crossed");
                bus.publish(
                    topics::PERFORMANCE_WARNING,
                    Payload::new()
                        .with("metric", metric)
                        .with("value_ms", value.as_secs_f64() * 1000.0)
                        .with("threshold_ms", threshold.as_secs_f64() * 1000.0),
                );
            }
        } else {
            self.over.remove(metric);
        }
    }

    /// The timing report: the frame row headed by the effective frame rate, then the
    /// subsystems from most to least expensive on average.
    pub fn report(&self) -> SmallVec<[String; REPORT_LINES]> {
        let frame = self.frame.summary();

        let mut subsystems: Vec<_> = self
            .subsystems
            .iter()
            .map(|(name, buffer)| (name.clone(), buffer.summary()))
            .collect();
        subsystems.sort_by(|a, b| b.1.average.cmp(&a.1.average));

        let rows = iter::once((fps_label(frame.average), frame)).chain(subsystems.into_iter().take(REPORT_LINES - 1));
        format_report(rows)
    }

    /// Returns subsystems likely responsible for slow frame timings.
    ///
    /// First, checks if any subsystem took longer than the per-subsystem threshold on the
    /// most recent frame. If none did, accumulates subsystems until the top 30% of total
    /// timing is reached, stopping at 5 subsystems maximum.
    pub fn get_slowest_subsystems(&self) -> SmallVec<[(String, Duration); 5]> {
        let mut timings: Vec<(&str, Duration)> = self
            .subsystems
            .iter()
            .map(|(name, buffer)| (name.as_str(), buffer.get_most_recent_timing()))
            .collect();
        let total_duration: Duration = timings.iter().map(|(_, d)| *d).sum();

        timings.sort_by(|a, b| b.1.cmp(&a.1));

        let over_threshold: SmallVec<[(String, Duration); 5]> = timings
            .iter()
            .filter(|(_, duration)| *duration >= self.thresholds.subsystem)
            .take(5)
            .map(|(name, duration)| (name.to_string(), *duration))
            .collect();

        if !over_threshold.is_empty() {
            return over_threshold;
        }

        let threshold = total_duration.as_nanos() as f64 * 0.3;
        let mut accumulated = 0u128;
        let mut result = SmallVec::new();

        for (name, duration) in timings.iter().take(5) {
            result.push((name.to_string(), *duration));
            accumulated += duration.as_nanos();

            if accumulated as f64 >= threshold {
                break;
            }
        }

        result
    }
}
