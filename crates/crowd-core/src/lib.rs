//! `crowd-core` — foundational types for the `rust_crowd` steering framework.
//!
//! This crate is a dependency of every other `crowd-*` crate.  It intentionally
//! has no `crowd-*` dependencies and minimal external ones (only `rand`,
//! `thiserror`, and `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`ids`]      | `AgentId`, `SegmentId`, `CellIndex`                      |
//! | [`geometry`] | `Point`, `Vector`, `AxisAlignedBox`, `Ray`, intersections|
//! | [`clock`]    | `SimClock` (fixed sim timestep + real-time measurement)  |
//! | [`rng`]      | `AgentRng` (per-agent), `SimRng` (global)                |
//! | [`goal`]     | `GoalKind`, `AgentGoal`, `AgentInitialConditions`        |
//! | [`options`]  | `Behaviour`, `OptionDictionary` (string-keyed parameters)|
//! | [`error`]    | `CrowdError`, `CrowdResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod clock;
pub mod error;
pub mod geometry;
pub mod goal;
pub mod ids;
pub mod options;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use clock::SimClock;
pub use error::{CrowdError, CrowdResult};
pub use geometry::{AxisAlignedBox, Point, Ray, Vector};
pub use goal::{AgentGoal, AgentInitialConditions, GoalKind};
pub use ids::{AgentId, CellIndex, SegmentId};
pub use options::{Behaviour, OptionDictionary};
pub use rng::{AgentRng, SimRng};
