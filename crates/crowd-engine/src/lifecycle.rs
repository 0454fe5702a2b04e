//! The engine lifecycle state machine.
//!
//! Every public engine operation is gated by this machine: calls arriving
//! in the wrong state are rejected with `InvalidLifecycleTransition` and
//! the machine stays where it is — the engine never ends up half-way
//! through a phase it was not ready for.

use crowd_core::{CrowdError, CrowdResult};

// ── States ────────────────────────────────────────────────────────────────────

/// Engine lifecycle states.
///
/// Adjective states are stable; "-ing" states are transient while the
/// engine performs the corresponding task.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EngineState {
    New,
    Initializing,
    Ready,
    LoadingModule,
    UnloadingModule,
    LoadingSimulation,
    SimulationLoaded,
    PreprocessingSimulation,
    SimulationReadyForUpdate,
    UpdatingSimulation,
    SimulationNoMoreUpdatesAllowed,
    PostprocessingSimulation,
    SimulationFinished,
    UnloadingSimulation,
    CleaningUp,
    Finished,
}

impl EngineState {
    pub fn name(self) -> &'static str {
        match self {
            EngineState::New => "new",
            EngineState::Initializing => "initializing",
            EngineState::Ready => "ready",
            EngineState::LoadingModule => "loading-module",
            EngineState::UnloadingModule => "unloading-module",
            EngineState::LoadingSimulation => "loading-simulation",
            EngineState::SimulationLoaded => "simulation-loaded",
            EngineState::PreprocessingSimulation => "preprocessing-simulation",
            EngineState::SimulationReadyForUpdate => "simulation-ready-for-update",
            EngineState::UpdatingSimulation => "updating-simulation",
            EngineState::SimulationNoMoreUpdatesAllowed => "simulation-no-more-updates-allowed",
            EngineState::PostprocessingSimulation => "postprocessing-simulation",
            EngineState::SimulationFinished => "simulation-finished",
            EngineState::UnloadingSimulation => "unloading-simulation",
            EngineState::CleaningUp => "cleaning-up",
            EngineState::Finished => "finished",
        }
    }
}

// ── Edge set ──────────────────────────────────────────────────────────────────

use EngineState::*;

/// The fixed, enumerated set of legal transitions.
const EDGES: &[(EngineState, EngineState)] = &[
    (New, Initializing),
    (Initializing, Ready),
    // Module loading / unloading brackets.
    (Ready, LoadingModule),
    (LoadingModule, Ready),
    (Ready, UnloadingModule),
    (UnloadingModule, Ready),
    // Simulation setup.
    (Ready, LoadingSimulation),
    (LoadingSimulation, SimulationLoaded),
    (LoadingSimulation, Ready), // load failure: back to ready
    (SimulationLoaded, PreprocessingSimulation),
    (SimulationLoaded, UnloadingSimulation), // cleanup without running
    (PreprocessingSimulation, SimulationReadyForUpdate),
    (PreprocessingSimulation, Ready), // preprocess failure: back to ready
    // The update cycle.
    (SimulationReadyForUpdate, UpdatingSimulation),
    (UpdatingSimulation, SimulationReadyForUpdate),
    (UpdatingSimulation, SimulationNoMoreUpdatesAllowed),
    // Teardown.
    (SimulationReadyForUpdate, PostprocessingSimulation), // driver stopped early
    (SimulationNoMoreUpdatesAllowed, PostprocessingSimulation),
    (PostprocessingSimulation, SimulationFinished),
    (SimulationFinished, UnloadingSimulation),
    (UnloadingSimulation, Ready),
    // Engine shutdown.
    (Ready, CleaningUp),
    (CleaningUp, Finished),
];

// ── LifecycleStateMachine ─────────────────────────────────────────────────────

/// Tracks the current state and enforces the edge set.
pub struct LifecycleStateMachine {
    current: EngineState,
}

impl Default for LifecycleStateMachine {
    fn default() -> Self {
        Self { current: EngineState::New }
    }
}

impl LifecycleStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> EngineState {
        self.current
    }

    /// Whether `to` is reachable from the current state in one step.
    pub fn can_transition(&self, to: EngineState) -> bool {
        EDGES.iter().any(|&(f, t)| f == self.current && t == to)
    }

    /// Move along an edge, or report `InvalidLifecycleTransition` with the
    /// machine unchanged.
    pub fn transition(&mut self, to: EngineState) -> CrowdResult<()> {
        if !self.can_transition(to) {
            return Err(CrowdError::InvalidLifecycleTransition {
                from: self.current.name(),
                to: to.name(),
            });
        }
        tracing::debug!(from = self.current.name(), to = to.name(), "engine state transition");
        self.current = to;
        Ok(())
    }
}
