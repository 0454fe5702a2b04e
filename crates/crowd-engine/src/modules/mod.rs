//! Built-in modules: the baseline AI, the scenario feeder, and the
//! recorder/replay pair.

pub mod rec_file_player;
pub mod recorder;
pub mod simple_ai;
pub mod test_case_player;

pub use rec_file_player::RecFilePlayerModule;
pub use recorder::SimulationRecorderModule;
pub use simple_ai::SimpleAiModule;
pub use test_case_player::TestCasePlayerModule;

use crate::engine::SimulationEngine;

/// Names the built-ins are registered under.
pub const SIMPLE_AI: &str = "simpleAI";
pub const TEST_CASE_PLAYER: &str = "testCasePlayer";
pub const SIMULATION_RECORDER: &str = "simulationRecorder";
pub const REC_FILE_PLAYER: &str = "recFilePlayer";

/// Pre-register every built-in factory.  Called by `SimulationEngine::init`.
pub fn register_builtins(engine: &mut SimulationEngine) {
    engine.register_module_factory(SIMPLE_AI, || Box::new(SimpleAiModule));
    engine.register_module_factory(TEST_CASE_PLAYER, || {
        Box::new(TestCasePlayerModule::default())
    });
    engine.register_module_factory(SIMULATION_RECORDER, || {
        Box::new(SimulationRecorderModule::default())
    });
    engine.register_module_factory(REC_FILE_PLAYER, || {
        Box::new(RecFilePlayerModule::default())
    });
}
