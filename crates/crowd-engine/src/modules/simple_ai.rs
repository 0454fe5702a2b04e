//! The baseline AI as a module: hands out [`SimpleAgent`]s.

use crowd_agent::{SimpleAgent, SteeringAgent};
use crowd_core::AgentId;

use crate::module::Module;

pub struct SimpleAiModule;

impl Module for SimpleAiModule {
    fn create_agent(&mut self, id: AgentId, seed: u64) -> Option<Box<dyn SteeringAgent>> {
        Some(Box::new(SimpleAgent::new(id, seed)))
    }
}
