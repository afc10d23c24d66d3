//! Desktop platform implementation.

use std::fs;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::systems::profiling::{MemoryProbe, NoMemoryProbe};

/// Page size assumed when converting `/proc/self/statm` pages to bytes.
const PAGE_SIZE: u64 = 4096;

/// Sleeps for `duration`; spins near the deadline while the game has focus.
pub fn sleep(duration: Duration, focused: bool) {
    if focused {
        spin_sleep::sleep(duration);
    } else {
        std::thread::sleep(duration);
    }
}

/// A seed derived from the wall clock, for runs without a configured seed.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

/// The best memory probe available on this platform.
pub fn memory_probe() -> Box<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcMemoryProbe)
    } else {
        Box::new(NoMemoryProbe)
    }
}

/// Reads resident set size from `/proc/self/statm`.
#[derive(Debug, Default)]
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn resident_bytes(&mut self) -> Option<u64> {
        let statm = fs::read_to_string("/proc/self/statm").ok()?;
        let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        trace!(pages, "Sampled resident memory");
        Some(pages * PAGE_SIZE)
    }
}
