//! `crowd-agent` — the agent layer of the `rust_crowd` framework.
//!
//! Agents are polymorphic over the [`SteeringAgent`] trait: the engine holds
//! `Box<dyn SteeringAgent>` and drives every enabled agent once per tick, in
//! registration order, with no parallelism — the sequential schedule is what
//! makes rec-file replay bit-exact.
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`state`]    | `AgentBody` — the state block every agent kind embeds   |
//! | [`traits`]   | `SteeringAgent`, `FrameInfo`, `PhaseOutcome`            |
//! | [`world`]    | `WorldView`, `AgentSummary` — the per-tick read context |
//! | [`planning`] | long-term / mid-term / local-target driver              |
//! | [`simple`]   | `SimpleAgent` — the straight-to-goal baseline           |

pub mod planning;
pub mod simple;
pub mod state;
pub mod traits;
pub mod world;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use simple::SimpleAgent;
pub use state::AgentBody;
pub use traits::{FrameInfo, PhaseOutcome, SteeringAgent};
pub use world::{AgentSummary, WorldView};
