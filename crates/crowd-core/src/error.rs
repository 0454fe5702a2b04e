//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `CrowdError` via `From` impls, or keep them separate and wrap `CrowdError`
//! as one variant.  Fatal errors unwind to the engine driver; non-fatal ones
//! are logged at warn level and the offending entity is disabled or bypassed.

use thiserror::Error;

use crate::ids::AgentId;

/// The top-level error type for the `crowd-*` crates.
#[derive(Debug, Error)]
pub enum CrowdError {
    /// A lifecycle edge that does not exist was requested.  Fatal for the
    /// caller; the engine's state machine stays in its current state.
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidLifecycleTransition { from: &'static str, to: &'static str },

    /// Loading `module` would violate a declared conflict.
    #[error("module '{module}' conflicts with already-loaded module '{conflicts_with}'")]
    ModuleConflict { module: String, conflicts_with: String },

    /// The declared dependency graph contains a cycle through `module`.
    #[error("module dependency cycle detected at '{module}'")]
    ModuleDependencyCycle { module: String },

    /// A module was asked for that no factory or built-in provides.
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// An agent module was handed a goal variant it does not implement.
    /// The agent is disabled; the simulation continues.
    #[error("agent {agent} given unsupported goal type {goal:?}")]
    UnsupportedGoalType { agent: AgentId, goal: crate::goal::GoalKind },

    /// No path could be found; the agent falls back to straight-line
    /// steering towards its goal.
    #[error("no path found from {from} to {to}")]
    PlanningFailure { from: crate::Point, to: crate::Point },

    /// The scenario feeder had nothing to feed.
    #[error("missing test case: {0}")]
    MissingTestCase(String),

    /// The replay module could not open its recording.
    #[error("missing rec file: {0}")]
    MissingRecFile(String),

    /// Zero-length segment, parallel-ray intersection, and similar.
    /// Handled locally with sensible defaults wherever possible.
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `crowd-*` crates.
pub type CrowdResult<T> = Result<T, CrowdError>;
