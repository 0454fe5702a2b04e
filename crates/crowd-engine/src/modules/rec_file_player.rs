//! Replay of a recorded simulation.
//!
//! Re-creates the recorded agents and drives them positionally, frame by
//! frame, through the ordinary agent-update pathway — so the rest of the
//! engine (spatial index, recorder, observers) cannot tell a replay from a
//! live run.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use crowd_agent::{FrameInfo, SteeringAgent, WorldView};
use crowd_core::geometry::{Point, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, Behaviour, CrowdError, CrowdResult,
    OptionDictionary,
};
use tracing::info;

use crate::engine::SimulationEngine;
use crate::module::Module;
use crate::modules::recorder::RecRow;
use crate::modules::REC_FILE_PLAYER;

// ── ReplayAgent ───────────────────────────────────────────────────────────────

/// An agent whose trajectory is a recorded track.
struct ReplayAgent {
    id: AgentId,
    enabled: bool,
    position: Point,
    forward: Vector,
    velocity: Vector,
    radius: f32,
    goals: VecDeque<AgentGoal>,
    track: Vec<RecRow>,
    cursor: usize,
}

impl ReplayAgent {
    fn new(id: AgentId, track: Vec<RecRow>) -> Self {
        Self {
            id,
            enabled: false,
            position: Point::ORIGIN,
            forward: Vector::ZERO,
            velocity: Vector::ZERO,
            radius: 0.0,
            goals: VecDeque::new(),
            track,
            cursor: 0,
        }
    }
}

impl SteeringAgent for ReplayAgent {
    fn id(&self) -> AgentId {
        self.id
    }
    fn enabled(&self) -> bool {
        self.enabled
    }
    fn position(&self) -> Point {
        self.position
    }
    fn forward(&self) -> Vector {
        self.forward
    }
    fn velocity(&self) -> Vector {
        self.velocity
    }
    fn radius(&self) -> f32 {
        self.radius
    }
    fn current_goal(&self) -> Option<&AgentGoal> {
        self.goals.front()
    }
    fn goals(&self) -> &VecDeque<AgentGoal> {
        &self.goals
    }

    fn reset(
        &mut self,
        initial: &AgentInitialConditions,
        _world: &WorldView<'_>,
    ) -> CrowdResult<()> {
        self.position = initial.position;
        self.forward = initial.direction.flattened().normalized();
        self.velocity = self.forward * initial.speed;
        self.radius = initial.radius;
        self.goals = initial.goals.iter().cloned().collect();
        self.enabled = true;
        self.cursor = 0;
        Ok(())
    }

    fn update_ai(&mut self, frame: FrameInfo, _world: &WorldView<'_>) -> CrowdResult<()> {
        while self.cursor < self.track.len() && self.track[self.cursor].frame < frame.frame {
            self.cursor += 1;
        }
        let Some(row) = self.track.get(self.cursor).filter(|r| r.frame == frame.frame) else {
            // The recording ran out for this agent.
            self.disable();
            return Ok(());
        };
        let new_position = Point::on_ground(row.x, row.z);
        self.velocity = (new_position - self.position) * (1.0 / frame.dt);
        self.position = new_position;
        self.forward = Vector::new(row.dir_x, 0.0, row.dir_z);
        self.radius = row.radius;
        if let Some(goal) = self.goals.front_mut() {
            goal.target = Point::on_ground(row.goal_x, row.goal_z);
        }
        if !row.enabled {
            self.disable();
        }
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.velocity = Vector::ZERO;
    }

    fn add_goal(&mut self, goal: AgentGoal) -> CrowdResult<()> {
        self.goals.push_back(goal);
        Ok(())
    }

    fn clear_goals(&mut self) {
        self.goals.clear();
    }

    fn set_parameters(&mut self, _behaviour: &Behaviour) {
        // Replay has nothing to tune.
    }
}

// ── RecFilePlayerModule ───────────────────────────────────────────────────────

/// Re-creates agents from a rec file.
///
/// Options: `recfile` — the recording to replay (required).
#[derive(Default)]
pub struct RecFilePlayerModule {
    path: Option<PathBuf>,
    created: Vec<AgentId>,
}

impl Module for RecFilePlayerModule {
    fn init(
        &mut self,
        options: &OptionDictionary,
        _engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        self.path = options.get("recfile").map(PathBuf::from);
        Ok(())
    }

    fn initialize_simulation(&mut self, engine: &mut SimulationEngine) -> CrowdResult<()> {
        let Some(path) = self.path.clone() else {
            return Err(CrowdError::MissingRecFile("no 'recfile' option".to_string()));
        };
        if !path.exists() {
            return Err(CrowdError::MissingRecFile(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| CrowdError::MissingRecFile(format!("{}: {e}", path.display())))?;

        // Group rows into per-agent tracks, ascending frame order.
        let mut tracks: BTreeMap<u32, Vec<RecRow>> = BTreeMap::new();
        for row in reader.deserialize::<RecRow>() {
            let row = row.map_err(|e| CrowdError::Config(format!("bad rec row: {e}")))?;
            tracks.entry(row.agent).or_default().push(row);
        }

        self.created.clear();
        for (_, track) in tracks {
            let Some(first) = track.first() else { continue };
            let initial = AgentInitialConditions {
                position: Point::on_ground(first.x, first.z),
                direction: Vector::new(first.dir_x, 0.0, first.dir_z),
                radius: first.radius,
                speed: 0.0,
                goals: vec![AgentGoal::seek(
                    Point::on_ground(first.goal_x, first.goal_z),
                    0.0,
                )],
            };
            let agent = Box::new(ReplayAgent::new(engine.next_agent_id(), track));
            let id = engine.adopt_agent(&initial, REC_FILE_PLAYER, agent)?;
            self.created.push(id);
        }
        info!(path = %path.display(), agents = self.created.len(), "replay loaded");
        Ok(())
    }

    fn postprocess_frame(
        &mut self,
        engine: &mut SimulationEngine,
        _frame: FrameInfo,
    ) -> CrowdResult<()> {
        // Replay ends when every recorded track has run out.
        if !self.created.is_empty() {
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
