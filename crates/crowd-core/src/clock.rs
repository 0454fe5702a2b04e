//! Simulation time model.
//!
//! # Design
//!
//! Simulation time advances in fixed steps: frame `n` corresponds to
//! simulated time `n × dt`.  Keeping the frame counter as the canonical time
//! unit makes phase scheduling exact (no floating-point drift in "run every
//! k frames" arithmetic) and replay deterministic.
//!
//! Real time is measured separately with a monotonic [`Instant`] so that a
//! paused simulation can keep its wall clock running while the simulation
//! clock stands still.

use std::time::Instant;

/// Smoothing factor for the running FPS estimate (exponential moving average).
const FPS_SMOOTHING: f32 = 0.9;

/// The engine's clock: a fixed-timestep simulation clock plus a monotonic
/// real-time measurement.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Seconds of simulated time per frame.
    dt: f32,
    /// Number of simulation frames completed so far.
    frame: u64,
    /// Moment the clock was started (or last reset).
    started: Instant,
    /// Moment of the most recent real-time update.
    last_real_update: Instant,
    /// Real seconds elapsed since start, as of the last update.
    real_elapsed: f32,
    /// Smoothed frames-per-second estimate over real time.
    fps: f32,
}

impl SimClock {
    /// Create a clock with the given fixed simulation timestep.
    pub fn new(dt: f32) -> Self {
        let now = Instant::now();
        Self {
            dt,
            frame: 0,
            started: now,
            last_real_update: now,
            real_elapsed: 0.0,
            fps: 0.0,
        }
    }

    /// Fixed simulation timestep in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Number of completed simulation frames.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current simulated time in seconds (`frame × dt`).
    #[inline]
    pub fn sim_time(&self) -> f32 {
        self.frame as f32 * self.dt
    }

    /// Real seconds elapsed since the clock started, as of the last
    /// [`advance_real_time`](Self::advance_real_time).
    #[inline]
    pub fn real_elapsed(&self) -> f32 {
        self.real_elapsed
    }

    /// Smoothed real-time frame rate.  Zero until at least one simulation
    /// frame has been timed.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Update the real-time measurement.  Called every engine update,
    /// including paused ones.
    pub fn advance_real_time(&mut self) {
        let now = Instant::now();
        self.real_elapsed = now.duration_since(self.started).as_secs_f32();
        self.last_real_update = now;
    }

    /// Advance the simulation clock by one fixed step and fold the real
    /// duration of the previous frame into the FPS estimate.
    pub fn advance_sim_frame(&mut self) {
        let now = Instant::now();
        let real_frame_secs = now.duration_since(self.last_real_update).as_secs_f32();
        if real_frame_secs > 0.0 {
            let instantaneous = 1.0 / real_frame_secs;
            self.fps = if self.fps == 0.0 {
                instantaneous
            } else {
                FPS_SMOOTHING * self.fps + (1.0 - FPS_SMOOTHING) * instantaneous
            };
        }
        self.last_real_update = now;
        self.real_elapsed = now.duration_since(self.started).as_secs_f32();
        self.frame += 1;
    }

    /// Restart both clocks at frame zero.
    pub fn reset(&mut self) {
        *self = SimClock::new(self.dt);
    }
}

impl std::fmt::Display for SimClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame {} (t = {:.2}s, real {:.2}s, {:.1} fps)",
            self.frame,
            self.sim_time(),
            self.real_elapsed,
            self.fps
        )
    }
}
