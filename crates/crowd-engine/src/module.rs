//! The module interface and its meta-information.
//!
//! Modules are the unit of extension: steering AIs, scenario feeders, the
//! recorder — each is a `Module` registered with the engine under a name.
//! The engine resolves names against a factory registry; built-ins are
//! pre-registered and external crates add their own with
//! [`register_module_factory`][crate::SimulationEngine::register_module_factory]
//! (the factory registration stands in for the original design's
//! dynamic-library `createModule`/`destroyModule` symbols).

use crowd_agent::{FrameInfo, SteeringAgent};
use crowd_core::{AgentId, CrowdResult, OptionDictionary};

use crate::engine::SimulationEngine;

// ── Module ────────────────────────────────────────────────────────────────────

/// The interface every module implements.  All hooks except
/// `dependencies`/`conflicts` receive the engine, with this module's slot
/// temporarily vacated, so hooks may freely call engine operations
/// (`create_agent`, `add_obstacle`, `run_command`, …).
///
/// Hook order per simulation: `init` once at load; then per simulation
/// `initialize_simulation` → `preprocess_simulation` → per frame
/// (`preprocess_frame` → agents → `postprocess_frame`) →
/// `postprocess_simulation` → `cleanup_simulation`; `finish` once at
/// unload.  Hooks fire in dependency topological order, so a module never
/// observes state mutated by a later-scheduled module in the same phase.
#[allow(unused_variables)]
pub trait Module {
    /// Names of modules that must be loaded before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of modules this one cannot coexist with.
    fn conflicts(&self) -> Vec<String> {
        Vec::new()
    }

    fn init(
        &mut self,
        options: &OptionDictionary,
        engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        Ok(())
    }

    fn finish(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        Ok(())
    }

    fn initialize_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        Ok(())
    }

    fn cleanup_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        Ok(())
    }

    fn preprocess_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        Ok(())
    }

    fn postprocess_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        Ok(())
    }

    fn preprocess_frame(
        &mut self,
        engine: &mut SimulationEngine,
        frame: FrameInfo,
    ) -> CrowdResult<()> {
        Ok(())
    }

    fn postprocess_frame(
        &mut self,
        engine: &mut SimulationEngine,
        frame: FrameInfo,
    ) -> CrowdResult<()> {
        Ok(())
    }

    /// Allocate one agent for the engine's `create_agent` pathway.
    /// Modules that do not provide steering AI return `None`.
    fn create_agent(&mut self, id: AgentId, seed: u64) -> Option<Box<dyn SteeringAgent>> {
        None
    }

    /// The counterpart of `create_agent`; called as the engine drops an
    /// agent this module owns.
    fn destroy_agent(&mut self, agent: &dyn SteeringAgent) {}

    /// GUI passthrough; headless builds ignore it.
    fn process_keyboard_input(&mut self, key: i32, action: i32) {}

    /// GUI passthrough; headless builds ignore it.
    fn draw(&self) {}
}

/// Constructor registered under a module name.
pub type ModuleFactory = fn() -> Box<dyn Module>;

// ── ModuleMeta ────────────────────────────────────────────────────────────────

/// Book-keeping the engine holds per registered module.
#[derive(Clone, Debug, Default)]
pub struct ModuleMeta {
    pub name: String,
    /// Declared dependencies, as loaded.
    pub dependencies: Vec<String>,
    /// Declared conflicts.
    pub conflicts: Vec<String>,
    /// Modules that declared a dependency on this one.
    pub dependents: Vec<String>,
    pub loaded: bool,
    pub initialized: bool,
}
