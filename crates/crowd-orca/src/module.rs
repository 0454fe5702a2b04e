//! The ORCA steering module.

use crowd_agent::SteeringAgent;
use crowd_core::options::parse_flag;
use crowd_core::{AgentId, CrowdResult, OptionDictionary};
use crowd_engine::{Module, SimulationEngine};
use tracing::debug;

use crate::agent::OrcaAgent;
use crate::params::OrcaParams;

/// Name the module registers under.
pub const RVO2D_AI: &str = "rvo2dAI";

/// Hands out [`OrcaAgent`]s configured from the module options.
///
/// Recognised options: the `rvo_*` parameter keys (applied as defaults for
/// every created agent) and `dont_plan` (bypass A*, steer straight at the
/// goal).
#[derive(Default)]
pub struct Rvo2dModule {
    params: OrcaParams,
    dont_plan: bool,
}

impl Module for Rvo2dModule {
    fn init(
        &mut self,
        options: &OptionDictionary,
        _engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        for (key, value) in options {
            match key.as_str() {
                "dont_plan" => self.dont_plan = parse_flag(value),
                _ => {
                    if !self.params.apply_option(key, value) {
                        debug!(key, value, "rvo2dAI ignoring unknown option");
                    }
                }
            }
        }
        Ok(())
    }

    fn create_agent(&mut self, id: AgentId, seed: u64) -> Option<Box<dyn SteeringAgent>> {
        Some(Box::new(OrcaAgent::new(
            id,
            seed,
            self.params.clone(),
            self.dont_plan,
        )))
    }
}

/// Register the module's factory with an engine.
pub fn register(engine: &mut SimulationEngine) {
    engine.register_module_factory(RVO2D_AI, || Box::new(Rvo2dModule::default()));
}
