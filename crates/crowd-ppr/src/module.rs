//! The PPR steering module.

use std::sync::{Arc, Mutex};

use crowd_agent::SteeringAgent;
use crowd_core::options::{parse_flag, parse_u32};
use crowd_core::{AgentId, CrowdResult, OptionDictionary};
use crowd_engine::{Module, SimulationEngine};
use tracing::{debug, info};

use crate::agent::{PhaseScheduling, PprAgent};
use crate::params::PprParams;
use crate::profile::{PhaseProfiler, ProfilerHandle};

/// Name the module registers under.
pub const PPR_AI: &str = "pprAI";

/// Hands out [`PprAgent`]s configured from the module options.
///
/// Recognised options: `longplan`, `midplan`, `shortplan`, `perceptive`,
/// `predictive`, `reactive` (frame periods), `dynamic` (adaptive
/// scheduling), `dont_plan`, `stats` / `allstats` / `ailogFileName`
/// (profiler output), and every `ped_*` behavioural parameter.
#[derive(Default)]
pub struct PprModule {
    params: PprParams,
    scheduling: PhaseScheduling,
    dont_plan: bool,
    stats: bool,
    ailog_file_name: Option<String>,
    profiler: Option<ProfilerHandle>,
}

impl Module for PprModule {
    fn init(
        &mut self,
        options: &OptionDictionary,
        _engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        for (key, value) in options {
            match key.as_str() {
                "longplan" => {
                    self.scheduling.long_interval =
                        parse_u32(key, value, self.scheduling.long_interval as u32) as u64
                }
                "midplan" => {
                    self.scheduling.mid_interval =
                        parse_u32(key, value, self.scheduling.mid_interval as u32) as u64
                }
                "shortplan" => {
                    self.scheduling.short_interval =
                        parse_u32(key, value, self.scheduling.short_interval as u32) as u64
                }
                "perceptive" => {
                    self.scheduling.perceptive_interval =
                        parse_u32(key, value, self.scheduling.perceptive_interval as u32) as u64
                }
                "predictive" => {
                    self.scheduling.predictive_interval =
                        parse_u32(key, value, self.scheduling.predictive_interval as u32) as u64
                }
                "reactive" => {
                    self.scheduling.reactive_interval =
                        parse_u32(key, value, self.scheduling.reactive_interval as u32) as u64
                }
                "dynamic" => self.scheduling.dynamic = parse_flag(value),
                "dont_plan" => self.dont_plan = parse_flag(value),
                "stats" | "allstats" => self.stats = parse_flag(value),
                "ailogFileName" => {
                    self.ailog_file_name = Some(value.clone());
                    self.stats = true;
                }
                _ => {
                    if !self.params.apply_option(key, value) {
                        debug!(key, value, "pprAI ignoring unknown option");
                    }
                }
            }
        }
        if self.stats {
            self.profiler = Some(Arc::new(Mutex::new(PhaseProfiler::default())));
        }
        Ok(())
    }

    fn create_agent(&mut self, id: AgentId, seed: u64) -> Option<Box<dyn SteeringAgent>> {
        Some(Box::new(PprAgent::new(
            id,
            seed,
            self.params.clone(),
            self.scheduling.clone(),
            self.dont_plan,
            self.profiler.clone(),
        )))
    }

    fn postprocess_simulation(&mut self, _engine: &mut SimulationEngine) -> CrowdResult<()> {
        let Some(handle) = &self.profiler else {
            return Ok(());
        };
        let Ok(profiler) = handle.lock() else {
            return Ok(());
        };
        let report = profiler.report();
        info!("pprAI phase profile:\n{report}");
        if let Some(path) = &self.ailog_file_name {
            std::fs::write(path, &report)?;
        }
        Ok(())
    }
}

/// Register the module's factory with an engine.
pub fn register(engine: &mut SimulationEngine) {
    engine.register_module_factory(PPR_AI, || Box::new(PprModule::default()));
}
