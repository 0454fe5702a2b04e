//! The ORCA steering agent.

use std::collections::VecDeque;

use crowd_agent::{AgentBody, FrameInfo, SteeringAgent, WorldView};
use crowd_core::geometry::{Point, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, Behaviour, CrowdError, CrowdResult, GoalKind,
    SegmentId,
};
use crowd_spatial::NeighborList;

use crate::lines::{build_agent_lines, build_obstacle_lines, Line};
use crate::lp::{linear_program_2, linear_program_3};
use crate::params::{OrcaParams, REACHED_GOAL_MULTIPLIER, REACHED_WAYPOINT_MULTIPLIER};

const SUPPORTED_GOALS: &[GoalKind] =
    &[GoalKind::SeekStaticTarget, GoalKind::BoxRegion, GoalKind::Random];

/// Velocity-obstacle agent: three sub-steps per tick — neighbour
/// collection, velocity solve, integration.
pub struct OrcaAgent {
    body: AgentBody,
    params: OrcaParams,
    /// Bypass A* and steer straight at the goal.
    dont_plan: bool,

    pref_velocity: Vector,
    new_velocity: Vector,
    agent_neighbors: NeighborList<AgentId>,
    obstacle_neighbors: NeighborList<SegmentId>,
    orca_lines: Vec<Line>,
}

impl OrcaAgent {
    pub fn new(id: AgentId, global_seed: u64, params: OrcaParams, dont_plan: bool) -> Self {
        let max_neighbors = params.max_neighbors;
        Self {
            body: AgentBody::new(id, global_seed),
            params,
            dont_plan,
            pref_velocity: Vector::ZERO,
            new_velocity: Vector::ZERO,
            agent_neighbors: NeighborList::new(max_neighbors, 0.0),
            obstacle_neighbors: NeighborList::new(max_neighbors, 0.0),
            orca_lines: Vec::new(),
        }
    }

    pub fn params(&self) -> &OrcaParams {
        &self.params
    }

    // ── Neighbour collection ──────────────────────────────────────────────

    fn compute_neighbors(&mut self, world: &WorldView<'_>) {
        let obstacle_range =
            self.params.time_horizon_obstacles * self.params.max_speed + self.body.radius;
        self.obstacle_neighbors.reset(obstacle_range * obstacle_range);
        world.obstacle_neighbors(self.body.position, &mut self.obstacle_neighbors);

        self.agent_neighbors
            .reset(self.params.neighbor_distance * self.params.neighbor_distance);
        if self.params.max_neighbors > 0 {
            world.agent_neighbors(self.body.position, self.body.id, &mut self.agent_neighbors);
        }
    }

    // ── Velocity solve ────────────────────────────────────────────────────

    fn compute_new_velocity(&mut self, dt: f32, world: &WorldView<'_>) {
        self.orca_lines.clear();

        build_obstacle_lines(
            self.body.position,
            self.body.velocity,
            self.body.radius,
            1.0 / self.params.time_horizon_obstacles,
            world.spatial().obstacles().arena(),
            self.obstacle_neighbors.items(),
            &mut self.orca_lines,
        );
        let num_obst_lines = self.orca_lines.len();

        build_agent_lines(
            self.body.position,
            self.body.velocity,
            self.body.radius,
            1.0 / self.params.time_horizon,
            1.0 / dt,
            self.agent_neighbors.items(),
            |id| world.agent(id).map(|s| (s.position, s.velocity, s.radius)),
            &mut self.orca_lines,
        );

        let line_fail = linear_program_2(
            &self.orca_lines,
            self.params.max_speed,
            self.pref_velocity,
            false,
            &mut self.new_velocity,
        );
        if line_fail < self.orca_lines.len() {
            linear_program_3(
                &self.orca_lines,
                num_obst_lines,
                line_fail,
                self.params.max_speed,
                &mut self.new_velocity,
            );
        }
    }

    /// The constraints of the last solve (tests inspect these).
    pub fn orca_lines(&self) -> &[Line] {
        &self.orca_lines
    }
}

impl SteeringAgent for OrcaAgent {
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

        self.agent_neighbors = NeighborList::new(self.params.max_neighbors, 0.0);
        self.obstacle_neighbors = NeighborList::new(self.params.max_neighbors, 0.0);
        self.orca_lines.clear();

        // Plan to the first goal; the preferred velocity starts along the
        // first waypoint (or straight at the goal if planning was skipped).
        let goal_target = self.body.current_goal().map(|g| g.target);
        if let Some(target) = goal_target {
            self.body.run_long_term_planning(
                world,
                target,
                self.dont_plan,
                self.params.next_waypoint_distance,
            );
            let aim = self
                .body
                .current_waypoint_point()
                .unwrap_or(target);
            self.pref_velocity = (aim - self.body.position).flattened().normalized();
        }
        Ok(())
    }

    fn update_ai(&mut self, frame: FrameInfo, world: &WorldView<'_>) -> CrowdResult<()> {
        if !self.body.enabled {
            return Ok(());
        }
        let Some(goal) = self.body.current_goal() else {
            self.disable();
            return Ok(());
        };
        let goal_target = goal.target;

        // ── Steering target ───────────────────────────────────────────────
        let goal_direction = if !self.body.mid_term_path.is_empty() {
            let waypoint_threshold = self.body.radius * REACHED_WAYPOINT_MULTIPLIER;
            if self.body.reached_current_waypoint(waypoint_threshold) {
                self.body
                    .update_mid_term_path(self.params.next_waypoint_distance);
            }
            self.body
                .update_local_target(world, self.params.next_waypoint_distance);
            (self.body.local_target - self.body.position).flattened().normalized()
        } else {
            (goal_target - self.body.position).flattened().normalized()
        };
        self.pref_velocity = goal_direction * self.params.max_speed;

        // ── Solve and integrate ───────────────────────────────────────────
        self.compute_neighbors(world);
        self.compute_new_velocity(frame.dt, world);

        self.body.velocity = self.new_velocity.flattened();
        self.body.position = self.body.position + self.body.velocity * frame.dt;

        // Consume a waypoint the step carried us into.
        if !self.body.waypoints.is_empty() {
            let reach = self.body.radius * REACHED_WAYPOINT_MULTIPLIER;
            let front = self.body.waypoints[0];
            if (front - self.body.position).flattened().length() < reach {
                self.body.waypoints.remove(0);
            }
        }

        // ── Goal bookkeeping ──────────────────────────────────────────────
        let goal_threshold = self.body.radius * REACHED_GOAL_MULTIPLIER;
        if self.body.reached_current_goal(goal_threshold) {
            if !self.body.advance_goal(world) {
                self.disable();
                return Ok(());
            }
            let next_target = self.body.current_goal().map(|g| g.target);
            if let Some(target) = next_target {
                self.body.run_long_term_planning(
                    world,
                    target,
                    self.dont_plan,
                    self.params.next_waypoint_distance,
                );
                self.pref_velocity = (target - self.body.position).flattened();
            }
        }

        // Only re-orient while actually moving; a blocked agent keeps its
        // last facing.
        if self.body.velocity.length_squared() > 0.0 {
            self.body.forward = self.body.velocity.normalized();
        }
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

    fn set_parameters(&mut self, behaviour: &Behaviour) {
        self.params.apply_behaviour(behaviour);
    }
}
