//! Engine configuration and the controller hook.

use std::collections::BTreeMap;

use crowd_core::{AxisAlignedBox, OptionDictionary};

// ── SimulationOptions ─────────────────────────────────────────────────────────

/// Top-level engine configuration.
///
/// Typically assembled by the driver (command line, test harness) and
/// handed to [`SimulationEngine::init`][crate::SimulationEngine::init].
#[derive(Clone, Debug)]
pub struct SimulationOptions {
    /// Fixed simulation timestep in seconds.
    pub fixed_dt: f32,

    /// Frame budget: `update` reports "no more updates" once this many
    /// frames have been simulated.  0 means unbounded.
    pub max_frames: u64,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,

    /// Horizontal extent of the world; also the navigation grid's bounds.
    pub world_bounds: AxisAlignedBox,

    /// Edge length of one navigation-grid cell in metres.
    pub grid_cell_size: f32,

    /// Per-module option dictionaries, keyed by module name.
    pub module_options: BTreeMap<String, OptionDictionary>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            fixed_dt: 0.05,
            max_frames: 0,
            seed: 1,
            world_bounds: AxisAlignedBox::flat(-100.0, 100.0, -100.0, 100.0),
            grid_cell_size: 1.0,
            module_options: BTreeMap::new(),
        }
    }
}

impl SimulationOptions {
    /// Options for `module`, or an empty dictionary.
    pub fn options_for(&self, module: &str) -> OptionDictionary {
        self.module_options.get(module).cloned().unwrap_or_default()
    }

    /// Insert one module option (builder style for tests and drivers).
    pub fn with_module_option(
        mut self,
        module: &str,
        key: &str,
        value: &str,
    ) -> Self {
        self.module_options
            .entry(module.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }
}

// ── EngineController ──────────────────────────────────────────────────────────

/// The driver-side hook the engine polls between ticks.
///
/// The pause flag is passed into `update` directly; the controller only
/// carries the asynchronous stop request, checked at the end of every tick
/// and before every lifecycle transition the driver asks for.
pub trait EngineController {
    fn stop_requested(&self) -> bool {
        false
    }
}

/// A controller that never stops the engine.
pub struct NoopController;

impl EngineController for NoopController {}
