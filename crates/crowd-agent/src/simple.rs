//! `SimpleAgent` — the straight-to-goal baseline.
//!
//! No planning, no avoidance: the vector to the goal is used directly as a
//! steering force and Euler-integrated with clamped force and speed.  It
//! exists as the engine's reference agent: cheap enough to drive thousands
//! of instances in tests, and honest about the shared goal-queue semantics
//! (goal reached at one radius, disable on an empty queue).

use std::collections::VecDeque;

use crowd_core::geometry::{Point, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, Behaviour, CrowdError, CrowdResult, GoalKind,
};

use crate::state::AgentBody;
use crate::traits::{FrameInfo, PhaseOutcome, SteeringAgent};
use crate::world::WorldView;

const MAX_FORCE_MAGNITUDE: f32 = 3.0;
const MAX_SPEED: f32 = 1.3;
const AGENT_MASS: f32 = 1.0;

const SUPPORTED_GOALS: &[GoalKind] =
    &[GoalKind::SeekStaticTarget, GoalKind::BoxRegion, GoalKind::Random];

pub struct SimpleAgent {
    body: AgentBody,
}

impl SimpleAgent {
    pub fn new(id: AgentId, global_seed: u64) -> Self {
        Self { body: AgentBody::new(id, global_seed) }
    }

    fn do_euler_step(&mut self, force: Vector, dt: f32) {
        let clipped = force.flattened().clamped(MAX_FORCE_MAGNITUDE);
        let acceleration = clipped / AGENT_MASS;
        self.body.velocity = (self.body.velocity + acceleration * dt).clamped(MAX_SPEED);
        self.body.position = self.body.position + self.body.velocity * dt;
        if self.body.velocity.length_squared() != 0.0 {
            self.body.forward = self.body.velocity.normalized();
        }
    }
}

impl SteeringAgent for SimpleAgent {
    fn id(&self) -> AgentId {
        self.body.id
    }
    fn enabled(&self) -> bool {
        self.body.enabled
    }
    fn position(&self) -> Point {
        self.body.position
    }
    fn forward(&self) -> Vector {
        self.body.forward
    }
    fn velocity(&self) -> Vector {
        self.body.velocity
    }
    fn radius(&self) -> f32 {
        self.body.radius
    }
    fn current_goal(&self) -> Option<&AgentGoal> {
        self.body.current_goal()
    }
    fn goals(&self) -> &VecDeque<AgentGoal> {
        &self.body.goals
    }

    fn reset(
        &mut self,
        initial: &AgentInitialConditions,
        world: &WorldView<'_>,
    ) -> CrowdResult<()> {
        self.body.reset_kinematics(initial)?;
        self.body.goals.clear();
        if initial.goals.is_empty() {
            return Err(CrowdError::Config("no goals were specified".into()));
        }
        for goal in &initial.goals {
            self.body.push_goal(goal.clone(), SUPPORTED_GOALS)?;
        }
        self.body.activate_current_goal(world);
        Ok(())
    }

    fn update_ai(&mut self, frame: FrameInfo, world: &WorldView<'_>) -> CrowdResult<()> {
        if !self.body.enabled {
            return Ok(());
        }
        // Reaching is one radius for the simple agent.
        match self.body.phase_outcome(self.body.radius) {
            PhaseOutcome::Disable => {
                self.body.goals.clear();
                self.disable();
                return Ok(());
            }
            PhaseOutcome::AdvanceGoal => {
                self.body.advance_goal(world);
            }
            PhaseOutcome::AdvanceWaypoint | PhaseOutcome::Continue => {}
        }
        let Some(goal) = self.body.current_goal() else {
            self.disable();
            return Ok(());
        };

        let to_goal = goal.target - self.body.position;
        self.do_euler_step(to_goal, frame.dt);
        Ok(())
    }

    fn disable(&mut self) {
        self.body.enabled = false;
        self.body.velocity = Vector::ZERO;
    }

    fn add_goal(&mut self, goal: AgentGoal) -> CrowdResult<()> {
        self.body.push_goal(goal, SUPPORTED_GOALS)
    }

    fn clear_goals(&mut self) {
        self.body.goals.clear();
    }

    fn set_parameters(&mut self, _behaviour: &Behaviour) {
        // The baseline has no tunable parameters.
    }
}
