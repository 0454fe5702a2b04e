//! Deterministic random streams for replayable runs.
//!
//! # Why streams, not one generator
//!
//! The determinism law ("same seed, same options, bitwise-identical
//! per-frame dumps") outlaws any shared generator: one agent drawing a
//! random goal target would shift every later draw in the run, so adding
//! an agent — or an emitter spawning one mid-simulation — would perturb
//! the trajectories of agents that never interacted with it.
//!
//! Instead, every drawing entity owns its own `SmallRng`, seeded from the
//! pair `(run seed, stream index)`.  Agents use their id as the stream
//! index; the engine draws from a reserved tag no agent id can collide
//! with.  A draw is then a pure function of the run seed and of who is
//! drawing, which is exactly what replay needs.
//!
//! # Seed derivation
//!
//! The pair is condensed to a 64-bit seed with a SplitMix64 finalizer
//! (two xor-shift-multiply rounds).  The finalizer avalanches, so the
//! consecutive ids that agents are registered under land on statistically
//! unrelated streams.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// Stream index reserved for the engine-level generator.  Agent ids are
/// `u32`, so no agent stream can reach it.
const ENGINE_STREAM: u64 = 1 << 40;

/// SplitMix64 output finalizer.
fn split_mix_64(mut word: u64) -> u64 {
    word = (word ^ (word >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    word = (word ^ (word >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    word ^ (word >> 31)
}

/// Condense a `(run seed, stream)` pair into one generator seed.
///
/// The stream index goes through the mixer both xor'd and added, so pairs
/// differing in either word (or in both, symmetrically) separate.
fn derive_stream_seed(run_seed: u64, stream: u64) -> u64 {
    split_mix_64(split_mix_64(run_seed ^ stream).wrapping_add(stream))
}

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// The random stream owned by one agent (random goal targets).
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Stream `agent` of the run seeded with `run_seed`.
    pub fn new(run_seed: u64, agent: AgentId) -> Self {
        AgentRng(SmallRng::seed_from_u64(derive_stream_seed(
            run_seed,
            agent.0 as u64,
        )))
    }

    /// Draw uniformly from `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// The engine-level stream, for draws no single agent owns (random
/// collision-free placement when a scenario asks for one).  Lives on the
/// engine thread only.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(run_seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(derive_stream_seed(
            run_seed,
            ENGINE_STREAM,
        )))
    }

    /// Draw uniformly from `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
