//! `crowd-engine` — the simulation engine of the `rust_crowd` framework.
//!
//! # The tick
//!
//! ```text
//! update(paused):
//!   ① real-time clock advances (always; paused returns here)
//!   ② simulation clock advances one fixed dt
//!   ③ module preprocess-frame hooks, in dependency execution order
//!   ④ agent emitters spawn due agents
//!   ⑤ agent k-d tree rebuilt from the enabled agents
//!   ⑥ every enabled agent updates, sequentially, in registration order;
//!      each agent's new state is visible to the agents after it
//!   ⑦ module postprocess-frame hooks
//!   → false once a module signalled termination, the frame budget was
//!     reached, or the controller requested a stop
//! ```
//!
//! Every public operation is gated by the lifecycle state machine
//! ([`lifecycle`]); calling `update` before `preprocess_simulation` is an
//! `InvalidLifecycleTransition`, not a crash.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`engine`]    | `SimulationEngine`, `Obstacle`, the command table     |
//! | [`lifecycle`] | `EngineState`, the legal-transition edge set          |
//! | [`module`]    | `Module` trait, `ModuleMeta`, factory registration    |
//! | [`emitter`]   | `AgentEmitter` spawn schedules                        |
//! | [`scenario`]  | `Scenario` + CSV loader                               |
//! | [`modules`]   | built-ins: simpleAI, testCasePlayer, recorder, replay |
//! | [`options`]   | `SimulationOptions`, `EngineController`               |

pub mod emitter;
pub mod engine;
pub mod lifecycle;
pub mod module;
pub mod modules;
pub mod options;
pub mod scenario;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use emitter::AgentEmitter;
pub use engine::{CommandFn, Obstacle, SimulationEngine};
pub use lifecycle::{EngineState, LifecycleStateMachine};
pub use module::{Module, ModuleFactory, ModuleMeta};
pub use options::{EngineController, NoopController, SimulationOptions};
pub use scenario::{EmitterSpec, Scenario};
