//! `AgentBody` — the state block shared by every agent kind.

use std::collections::VecDeque;

use crowd_core::geometry::{Point, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, AgentRng, CrowdError, CrowdResult, GoalKind,
};

use crate::traits::PhaseOutcome;
use crate::world::WorldView;

/// Shared agent state: kinematics, the goal queue, and the three levels of
/// plan (waypoints, mid-term path, local target).
///
/// Concrete agents embed one of these and layer their own steering state on
/// top.  Invariants maintained here:
///
/// - `forward` is unit length whenever `velocity` is non-zero;
/// - `radius > 0` after a successful reset;
/// - an empty goal queue disables the agent within one tick.
pub struct AgentBody {
    pub id: AgentId,
    pub enabled: bool,
    pub position: Point,
    pub forward: Vector,
    pub velocity: Vector,
    pub radius: f32,

    /// FIFO goal queue; front is the current goal.
    pub goals: VecDeque<AgentGoal>,
    /// Coarse subgoals produced by long-term planning.
    pub waypoints: Vec<Point>,
    /// Index of the waypoint currently steered towards.
    pub current_waypoint: usize,
    /// Fine-grained points between the agent and the next waypoint.
    pub mid_term_path: VecDeque<Point>,
    /// Furthest mid-term point with line of sight; the steering target.
    pub local_target: Point,

    /// Per-agent deterministic RNG (random goal targets).
    pub rng: AgentRng,
}

impl AgentBody {
    pub fn new(id: AgentId, global_seed: u64) -> Self {
        Self {
            id,
            enabled: false,
            position: Point::ORIGIN,
            forward: Vector::ZERO,
            velocity: Vector::ZERO,
            radius: 0.0,
            goals: VecDeque::new(),
            waypoints: Vec::new(),
            current_waypoint: 0,
            mid_term_path: VecDeque::new(),
            local_target: Point::ORIGIN,
            rng: AgentRng::new(global_seed, id),
        }
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Load kinematic state from initial conditions and enable the agent.
    pub fn reset_kinematics(&mut self, initial: &AgentInitialConditions) -> CrowdResult<()> {
        let forward = initial.direction.flattened().normalized();
        if forward == Vector::ZERO {
            return Err(CrowdError::GeometryDegenerate("agent initial direction is zero"));
        }
        if initial.radius <= 0.0 {
            return Err(CrowdError::Config(format!(
                "agent {} has non-positive radius {}",
                self.id, initial.radius
            )));
        }
        self.position = initial.position;
        self.forward = forward;
        self.velocity = forward * initial.speed;
        self.radius = initial.radius;
        self.enabled = true;

        self.waypoints.clear();
        self.current_waypoint = 0;
        self.mid_term_path.clear();
        self.local_target = initial.position;
        Ok(())
    }

    // ── Goals ─────────────────────────────────────────────────────────────

    pub fn current_goal(&self) -> Option<&AgentGoal> {
        self.goals.front()
    }

    /// Queue a goal, rejecting kinds outside `supported`.
    pub fn push_goal(&mut self, goal: AgentGoal, supported: &[GoalKind]) -> CrowdResult<()> {
        if !supported.contains(&goal.kind) {
            return Err(CrowdError::UnsupportedGoalType { agent: self.id, goal: goal.kind });
        }
        self.goals.push_back(goal);
        Ok(())
    }

    /// Pop the finished goal and activate the next one.  Returns `false`
    /// when the queue is exhausted (caller disables the agent).
    pub fn advance_goal(&mut self, world: &WorldView<'_>) -> bool {
        self.goals.pop_front();
        match self.goals.front() {
            None => false,
            Some(_) => {
                self.activate_current_goal(world);
                true
            }
        }
    }

    /// Resolve a `Random` goal's target the moment it becomes current.
    pub fn activate_current_goal(&mut self, world: &WorldView<'_>) {
        let Some(goal) = self.goals.front_mut() else { return };
        if goal.kind == GoalKind::Random {
            let rng = &mut self.rng;
            if let Some(p) = world
                .spatial()
                .random_position_without_collisions(|r| rng.gen_range(r))
            {
                goal.target = p;
            }
            // An exhausted sample budget leaves the previous target; the
            // agent will simply steer to wherever that points.
        }
    }

    /// Reached test for the current goal; `false` with an empty queue.
    pub fn reached_current_goal(&self, threshold: f32) -> bool {
        self.current_goal()
            .is_some_and(|g| g.is_reached(self.position, self.radius, threshold))
    }

    /// Classify this tick's plan progress.  Callers dispatch on the
    /// result explicitly — reaching a goal is a value, not an exception.
    pub fn phase_outcome(&self, threshold: f32) -> PhaseOutcome {
        if self.reached_current_goal(threshold) {
            if self.goals.len() > 1 {
                PhaseOutcome::AdvanceGoal
            } else {
                PhaseOutcome::Disable
            }
        } else if self.reached_current_waypoint(threshold) {
            PhaseOutcome::AdvanceWaypoint
        } else {
            PhaseOutcome::Continue
        }
    }

    // ── Waypoints and paths ───────────────────────────────────────────────

    /// The waypoint currently steered towards, when planning produced one.
    pub fn current_waypoint_point(&self) -> Option<Point> {
        self.waypoints.get(self.current_waypoint).copied()
    }

    pub fn reached_current_waypoint(&self, threshold: f32) -> bool {
        self.current_waypoint_point().is_some_and(|w| {
            (w - self.position).flattened().length_squared() <= threshold * threshold
        })
    }

    pub fn reached_local_target(&self, threshold: f32) -> bool {
        (self.local_target - self.position).flattened().length_squared()
            <= threshold * threshold
    }
}
