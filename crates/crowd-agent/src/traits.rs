//! The polymorphic agent interface and the phase-outcome result type.

use std::collections::VecDeque;

use crowd_core::geometry::{circle_penetration_2d, ray_circle_intersection, Point, Ray, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, Behaviour, CrowdResult,
};

use crate::world::{AgentSummary, WorldView};

// ── FrameInfo ─────────────────────────────────────────────────────────────────

/// Timing of the tick an agent is being updated for.
#[derive(Copy, Clone, Debug)]
pub struct FrameInfo {
    /// Simulated seconds since frame 0.
    pub time: f32,
    /// Fixed simulation timestep.
    pub dt: f32,
    /// Frame number, starting at 0 for the first updated frame.
    pub frame: u64,
}

// ── PhaseOutcome ──────────────────────────────────────────────────────────────

/// How a planning or steering phase ended.
///
/// The original design signalled "goal reached, switch phase" by throwing;
/// here the caller dispatches on an explicit result instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Keep going with the current plan.
    Continue,
    /// The current waypoint was consumed; move to the next one.
    AdvanceWaypoint,
    /// The current goal was consumed; activate the next goal in the queue.
    AdvanceGoal,
    /// The goal queue is empty; the agent leaves the simulation.
    Disable,
}

// ── SteeringAgent ─────────────────────────────────────────────────────────────

/// The interface every agent kind implements.
///
/// The engine owns agents as `Box<dyn SteeringAgent>` and calls
/// [`update_ai`](Self::update_ai) once per tick for each enabled agent, in
/// registration order.  The read accessors feed the engine's summary
/// mirror and the recorder; the spatial hooks let rays and overlap tests
/// treat agents and obstacles uniformly.
pub trait SteeringAgent {
    // ── Read access ───────────────────────────────────────────────────────

    fn id(&self) -> AgentId;
    fn enabled(&self) -> bool;
    fn position(&self) -> Point;
    fn forward(&self) -> Vector;
    fn velocity(&self) -> Vector;
    fn radius(&self) -> f32;
    fn current_goal(&self) -> Option<&AgentGoal>;
    fn goals(&self) -> &VecDeque<AgentGoal>;

    // ── Mutation ──────────────────────────────────────────────────────────

    /// (Re-)initialise from initial conditions.  Enables the agent.
    fn reset(
        &mut self,
        initial: &AgentInitialConditions,
        world: &WorldView<'_>,
    ) -> CrowdResult<()>;

    /// One tick of steering.  Only called while enabled.
    fn update_ai(&mut self, frame: FrameInfo, world: &WorldView<'_>) -> CrowdResult<()>;

    /// Take the agent out of the simulation.  The engine removes it from
    /// the spatial index at the next rebuild.
    fn disable(&mut self);

    fn add_goal(&mut self, goal: AgentGoal) -> CrowdResult<()>;
    fn clear_goals(&mut self);

    /// Apply a behaviour's parameter overrides.  Unknown keys are ignored.
    fn set_parameters(&mut self, behaviour: &Behaviour);

    // ── Spatial-database hooks ────────────────────────────────────────────

    /// Ray test against the agent's disc.
    fn intersects(&self, ray: &Ray) -> Option<f32> {
        ray_circle_intersection(ray, self.position(), self.radius())
    }

    /// Disc-overlap test.
    fn overlaps(&self, p: Point, radius: f32) -> bool {
        (p - self.position()).flattened().length_squared()
            <= (radius + self.radius()) * (radius + self.radius())
    }

    /// Penetration depth of a disc into this agent; 0 when clear.
    fn compute_penetration(&self, p: Point, radius: f32) -> f32 {
        circle_penetration_2d(p, radius, self.position(), self.radius())
    }

    // ── Mirror ────────────────────────────────────────────────────────────

    /// The summary the engine mirrors after each update.
    fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id(),
            enabled: self.enabled(),
            position: self.position(),
            forward: self.forward(),
            velocity: self.velocity(),
            radius: self.radius(),
            goal_target: self
                .current_goal()
                .map(|g| g.target)
                .unwrap_or(self.position()),
        }
    }
}
