//! `crowd-orca` — obstacle-aware ORCA/RVO2 steering.
//!
//! Each tick the agent collects its nearest obstacle segments and agents,
//! converts every neighbour into a half-plane constraint on its velocity
//! (an *ORCA line*), and picks the feasible velocity closest to its
//! preferred velocity by two-dimensional linear programming.  Obstacle
//! lines are hard; agent lines are relaxed under congestion by a
//! three-stage solver ([`lp`]).
//!
//! | Module     | Contents                                                |
//! |------------|---------------------------------------------------------|
//! | [`params`] | `OrcaParams` — the `rvo_*` parameter set                |
//! | [`lines`]  | ORCA half-plane construction for obstacles and agents   |
//! | [`lp`]     | `linear_program_1/2/3`                                  |
//! | [`agent`]  | `OrcaAgent` — neighbour collection, solve, integration  |
//! | [`module`] | `Rvo2dModule` + engine registration                     |

pub mod agent;
pub mod lines;
pub mod lp;
pub mod module;
pub mod params;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::OrcaAgent;
pub use lines::Line;
pub use module::{register, Rvo2dModule, RVO2D_AI};
pub use params::OrcaParams;
