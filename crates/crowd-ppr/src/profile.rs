//! Per-phase wall-time accounting.
//!
//! The module owns one profiler and hands a shared handle to every agent
//! it creates; agents record into it only when profiling was requested, so
//! the common path pays a single branch.  Access is strictly sequential
//! (agents run one at a time on the engine thread); the mutex exists to
//! satisfy the shared-handle type, not for contention.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// The profiled phases, locomotion included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseId {
    LongTerm,
    MidTerm,
    ShortTerm,
    Perceptive,
    Predictive,
    Reactive,
    Steering,
}

const PHASE_COUNT: usize = 7;

const PHASE_NAMES: [&str; PHASE_COUNT] = [
    "longplan",
    "midplan",
    "shortplan",
    "perceptive",
    "predictive",
    "reactive",
    "steering",
];

#[derive(Copy, Clone, Default)]
struct PhaseStats {
    calls: u64,
    total: Duration,
}

/// Accumulated per-phase call counts and wall time.
#[derive(Default)]
pub struct PhaseProfiler {
    phases: [PhaseStats; PHASE_COUNT],
}

impl PhaseProfiler {
    fn record(&mut self, phase: PhaseId, elapsed: Duration) {
        let stats = &mut self.phases[phase as usize];
        stats.calls += 1;
        stats.total += elapsed;
    }

    pub fn calls(&self, phase: PhaseId) -> u64 {
        self.phases[phase as usize].calls
    }

    /// One line per phase: name, calls, total µs, mean µs.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (i, name) in PHASE_NAMES.iter().enumerate() {
            let stats = self.phases[i];
            let total_us = stats.total.as_micros();
            let mean_us = if stats.calls > 0 {
                total_us / stats.calls as u128
            } else {
                0
            };
            out.push_str(&format!(
                "{name:>12}: {:>10} calls, {total_us:>10} us total, {mean_us:>6} us/call\n",
                stats.calls
            ));
        }
        out
    }
}

/// Shared handle; `None` inside agents when profiling is off.
pub type ProfilerHandle = Arc<Mutex<PhaseProfiler>>;

/// Time one phase body and record it, when a profiler is attached.
pub fn profiled<T>(
    profiler: &Option<ProfilerHandle>,
    phase: PhaseId,
    body: impl FnOnce() -> T,
) -> T {
    match profiler {
        None => body(),
        Some(handle) => {
            let start = Instant::now();
            let value = body();
            if let Ok(mut p) = handle.lock() {
                p.record(phase, start.elapsed());
            }
            value
        }
    }
}
