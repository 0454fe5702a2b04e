//! The scenario feeder.
//!
//! Owns the test case for a simulation: at `initialize_simulation` it
//! pushes every obstacle, creates every agent through the engine's
//! `create_agent` pathway (owned by the configured AI module), and
//! registers emitters; at `cleanup_simulation` it destroys the agents it
//! asked for.
//!
//! # Options
//!
//! | Key          | Effect                                               |
//! |--------------|------------------------------------------------------|
//! | `ai`         | Module that provides the agents (default `simpleAI`) |
//! | `testcase`   | CSV scenario file; omitted means a staged scenario   |
//! | `autoFinish` | Request engine stop once all created agents are done |

use crowd_agent::FrameInfo;
use crowd_core::options::parse_flag;
use crowd_core::{AgentId, CrowdError, CrowdResult, OptionDictionary};
use tracing::info;

use crate::emitter::AgentEmitter;
use crate::engine::{Obstacle, SimulationEngine};
use crate::module::Module;
use crate::modules::{SIMPLE_AI, TEST_CASE_PLAYER};
use crate::scenario::Scenario;

pub struct TestCasePlayerModule {
    ai_module: String,
    testcase_path: Option<String>,
    auto_finish: bool,
    created: Vec<AgentId>,
}

impl Default for TestCasePlayerModule {
    fn default() -> Self {
        Self {
            ai_module: SIMPLE_AI.to_string(),
            testcase_path: None,
            auto_finish: true,
            created: Vec::new(),
        }
    }
}

impl Module for TestCasePlayerModule {
    fn dependencies(&self) -> Vec<String> {
        vec![self.ai_module.clone()]
    }

    fn init(
        &mut self,
        options: &OptionDictionary,
        _engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        if let Some(ai) = options.get("ai") {
            self.ai_module = ai.clone();
        }
        self.testcase_path = options.get("testcase").cloned();
        if let Some(v) = options.get("autoFinish") {
            self.auto_finish = parse_flag(v);
        }
        Ok(())
    }

    fn initialize_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        // A scenario staged on the engine wins; otherwise load the CSV.
        let scenario = match engine.take_staged_scenario() {
            Some(s) => s,
            None => match &self.testcase_path {
                Some(path) => Scenario::from_csv(std::path::Path::new(path))?,
                None => {
                    return Err(CrowdError::MissingTestCase(
                        "no staged scenario and no 'testcase' option".to_string(),
                    ))
                }
            },
        };

        for bounds in &scenario.obstacles {
            engine.add_obstacle(Obstacle::Box(*bounds), TEST_CASE_PLAYER)?;
        }
        self.created.clear();
        for initial in &scenario.agents {
            let id = engine.create_agent(initial, &self.ai_module)?;
            self.created.push(id);
        }
        for spec in &scenario.emitters {
            engine.add_emitter(AgentEmitter::new(
                self.ai_module.clone(),
                spec.template.clone(),
                spec.period_frames,
                spec.total,
                spec.trigger_region,
            ));
        }
        info!(
            agents = scenario.agents.len(),
            obstacles = scenario.obstacles.len(),
            emitters = scenario.emitters.len(),
            "test case loaded"
        );
        Ok(())
    }

    fn postprocess_frame(
        &mut self,
        engine: &mut SimulationEngine,
        _frame: FrameInfo,
    ) -> CrowdResult<()> {
        if self.auto_finish && !self.created.is_empty() {
            let any_alive = self
                .created
                .iter()
                .any(|&id| engine.summaries().get(id.index()).is_some_and(|s| s.enabled));
            if !any_alive {
                engine.request_simulation_stop();
            }
        }
        Ok(())
    }

    fn cleanup_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        for id in self.created.drain(..) {
            engine.destroy_agent(id)?;
        }
        Ok(())
    }
}
