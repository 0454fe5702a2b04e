//! The PPR steering agent: an amortised six-phase pipeline.
//!
//! Phases, coarse to fine: cognitive (goal selection, on demand) →
//! long-term planning (waypoints) → mid-term planning (cell path to the
//! next waypoint) → short-term planning (local target with line of sight)
//! → perception (neighbour set) → prediction (threat list and steering
//! state) → reaction (steering command) → locomotion (every tick).
//!
//! Each phase is scheduled independently by frame counters; with dynamic
//! scheduling the phases stretch their own next interval when the agent is
//! slow, alone, or threat-free, and tighten it the moment a feeler hits
//! something.

use std::collections::VecDeque;

use crowd_agent::{AgentBody, AgentSummary, FrameInfo, SteeringAgent, WorldView};
use crowd_core::geometry::{intersect_two_rays_2d, Point, Ray, Vector};
use crowd_core::{
    AgentGoal, AgentId, AgentInitialConditions, Behaviour, CrowdError, CrowdResult, GoalKind,
};
use crowd_spatial::{HitKind, NeighborList};
use tracing::{debug, error};

use crate::params::PprParams;
use crate::profile::{profiled, PhaseId, ProfilerHandle};
use crate::steering::{FeelerInfo, ReactiveSituation, SteeringCommand, SteeringState};
use crate::threat::{collision_window, PredictedThreat, ThreatType};

const SUPPORTED_GOALS: &[GoalKind] =
    &[GoalKind::SeekStaticTarget, GoalKind::BoxRegion, GoalKind::Random];

/// Cap on the perceived-neighbour list; generous relative to the query
/// radius so dense crowds still see everyone that matters.
const MAX_PERCEIVED_NEIGHBORS: usize = 32;

// ── Phase scheduling ──────────────────────────────────────────────────────────

/// Static per-phase frame intervals, plus the dynamic-scheduling switch.
#[derive(Clone, Debug)]
pub struct PhaseScheduling {
    pub long_interval: u64,
    pub mid_interval: u64,
    pub short_interval: u64,
    pub perceptive_interval: u64,
    pub predictive_interval: u64,
    pub reactive_interval: u64,
    pub dynamic: bool,
}

impl Default for PhaseScheduling {
    fn default() -> Self {
        Self {
            // Long- and mid-term planning are effectively on-demand: the
            // finer phases re-run them when a waypoint or goal is reached.
            long_interval: 10_000,
            mid_interval: 10_000,
            short_interval: 1,
            perceptive_interval: 1,
            predictive_interval: 1,
            reactive_interval: 1,
            dynamic: false,
        }
    }
}

// ── PprAgent ──────────────────────────────────────────────────────────────────

pub struct PprAgent {
    body: AgentBody,
    params: PprParams,
    scheduling: PhaseScheduling,
    dont_plan: bool,
    profiler: Option<ProfilerHandle>,

    // GEOMETRY / PHYSICS STATE
    right_side: Vector,
    current_speed: f32,
    mass: f32,

    // PERCEPTION PHASE
    neighbors: NeighborList<AgentId>,
    num_agents_in_visual_field: usize,

    // PREDICTION PHASE
    threat_list: Vec<PredictedThreat>,
    min_threat_time: f32,
    max_threat_time: f32,
    most_imminent_threat: Option<usize>,
    time_to_wait: f32,
    crowd_control_direction: Vector,
    steering_state: SteeringState,

    // REACTIVE PHASE
    command: SteeringCommand,

    // PHASE SCHEDULERS
    next_long: u64,
    next_mid: u64,
    next_short: u64,
    next_perceptive: u64,
    next_predictive: u64,
    next_reactive: u64,
    frames_to_next_long: u64,
    frames_to_next_mid: u64,
    frames_to_next_short: u64,
    frames_to_next_perceptive: u64,
    frames_to_next_predictive: u64,
    frames_to_next_reactive: u64,

    current_time: f32,
}

impl PprAgent {
    pub fn new(
        id: AgentId,
        global_seed: u64,
        params: PprParams,
        scheduling: PhaseScheduling,
        dont_plan: bool,
        profiler: Option<ProfilerHandle>,
    ) -> Self {
        let query_radius = params.ped_query_radius;
        Self {
            body: AgentBody::new(id, global_seed),
            params,
            scheduling,
            dont_plan,
            profiler,
            right_side: Vector::ZERO,
            current_speed: 0.0,
            mass: 1.0,
            neighbors: NeighborList::new(MAX_PERCEIVED_NEIGHBORS, query_radius * query_radius),
            num_agents_in_visual_field: 0,
            threat_list: Vec::new(),
            min_threat_time: f32::INFINITY,
            max_threat_time: f32::NEG_INFINITY,
            most_imminent_threat: None,
            time_to_wait: 0.0,
            crowd_control_direction: Vector::ZERO,
            steering_state: SteeringState::TurnTowardsTarget,
            command: SteeringCommand::default(),
            next_long: 0,
            next_mid: 0,
            next_short: 0,
            next_perceptive: 0,
            next_predictive: 0,
            next_reactive: 0,
            frames_to_next_long: 100_000,
            frames_to_next_mid: 100_000,
            frames_to_next_short: 1,
            frames_to_next_perceptive: 1,
            frames_to_next_predictive: 1,
            frames_to_next_reactive: 1,
            current_time: 0.0,
        }
    }

    pub fn steering_state(&self) -> SteeringState {
        self.steering_state
    }

    pub fn threat_count(&self) -> usize {
        self.threat_list.len()
    }

    pub fn threats(&self) -> &[PredictedThreat] {
        &self.threat_list
    }

    fn reach_threshold(&self) -> f32 {
        self.params.ped_reached_target_distance_threshold
    }

    // ── Cognitive phase ───────────────────────────────────────────────────

    /// Pop the reached goal; disable when nothing is left to steer to.
    pub(crate) fn run_cognitive_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.advance_goal(world) {
            self.disable();
        }
    }

    // ── Long-term planning ────────────────────────────────────────────────

    pub(crate) fn run_long_term_planning_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        if self.body.reached_current_goal(self.reach_threshold()) {
            self.run_cognitive_phase(world);
            if !self.body.enabled {
                return;
            }
        }
        let Some(target) = self.body.current_goal().map(|g| g.target) else {
            return;
        };

        self.body.waypoints.clear();
        self.body.current_waypoint = 0;

        if !self.dont_plan {
            match world.spatial().plan_path(self.body.position, target) {
                Ok(path) if path.len() > 2 => {
                    let stride = self.params.ped_next_waypoint_distance.max(1);
                    for (i, &p) in path.iter().enumerate().skip(1) {
                        if i % stride == 0 {
                            self.body.waypoints.push(p);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    // Can't plan (outside the grid, or no route): steer
                    // straight at the goal and hope.
                    debug!(agent = %self.body.id, error = %e, "long-term planning failed");
                }
            }
        }
        let max_waypoints = self.params.ped_max_num_waypoints.max(1);
        if self.body.waypoints.len() >= max_waypoints {
            self.body.waypoints.truncate(max_waypoints - 1);
        }
        self.body.waypoints.push(target);
    }

    // ── Mid-term planning ─────────────────────────────────────────────────

    pub(crate) fn run_mid_term_planning_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        if self.body.reached_current_goal(self.reach_threshold()) {
            // Long-term planning calls cognitive itself.
            self.run_long_term_planning_phase(world);
            if !self.body.enabled {
                return;
            }
        }
        if self.body.reached_current_waypoint(self.reach_threshold()) {
            self.body.current_waypoint += 1;
            if self.body.current_waypoint >= self.body.waypoints.len() {
                if let Some(target) = self.body.current_goal().map(|g| g.target) {
                    self.body.waypoints.push(target);
                }
            }
        }
        let Some(waypoint) = self.body.current_waypoint_point() else {
            return;
        };

        self.body.mid_term_path.clear();
        match world.spatial().plan_path(self.body.position, waypoint) {
            Ok(path) => {
                self.body.mid_term_path.extend(path.into_iter().skip(1));
            }
            Err(_) => {
                // Steer straight for the waypoint; short-term planning
                // will keep aiming at it.
                self.body.local_target = waypoint;
            }
        }
    }

    // ── Short-term planning ───────────────────────────────────────────────

    /// Both-shoulders visibility of a candidate local target, obstacles
    /// only.
    fn local_target_visible(&self, world: &WorldView<'_>, target: Point) -> bool {
        let offset = self.right_side * self.body.radius;
        for start in [self.body.position + offset, self.body.position - offset] {
            let ray = Ray::with_unit_interval(start, target - start);
            if world.trace_obstacles(&ray).is_some() {
                return false;
            }
        }
        true
    }

    pub(crate) fn run_short_term_planning_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        if self.body.reached_current_waypoint(self.reach_threshold()) {
            self.run_mid_term_planning_phase(world);
            if !self.body.enabled {
                return;
            }
        }

        let path_len = self.body.mid_term_path.len();
        if path_len == 0 {
            self.body.local_target = self
                .body
                .current_waypoint_point()
                .or_else(|| self.body.current_goal().map(|g| g.target))
                .unwrap_or(self.body.local_target);
            return;
        }

        // Find the nearest path node.  All nodes must be scanned: the path
        // may snake so that far-index nodes are spatially closest.
        let mut closest = 0usize;
        let mut min_dist_sq = f32::INFINITY;
        for (i, &p) in self.body.mid_term_path.iter().enumerate() {
            let d = (p - self.body.position).flattened().length_squared();
            if d < min_dist_sq {
                min_dist_sq = d;
                closest = i;
            }
        }

        if closest + 3 < path_len {
            // Walk forward along the path while both shoulders can see the
            // node; the furthest visible node becomes the local target.
            let furthest =
                (closest + self.params.ped_furthest_local_target_distance).min(path_len - 1);
            let mut visible: Option<usize> = None;
            let mut idx = closest;
            while idx <= furthest && self.local_target_visible(world, self.body.mid_term_path[idx])
            {
                visible = Some(idx);
                idx += 1;
            }

            match visible {
                Some(i) => {
                    self.body.local_target = self.body.mid_term_path[i];
                    if let Some(waypoint) = self.body.current_waypoint_point() {
                        // Snap onto the waypoint when the local target has
                        // effectively reached it.
                        if (self.body.local_target - waypoint).flattened().length()
                            < 2.0 * self.reach_threshold()
                        {
                            self.body.local_target = waypoint;
                        }
                    }
                }
                None => {
                    // Nothing visible (an obstacle hugs the path): aim two
                    // nodes ahead of the closest and let reaction cope.
                    self.body.local_target =
                        self.body.mid_term_path[(closest + 2).min(path_len - 1)];
                }
            }
        } else {
            self.body.local_target = self
                .body
                .current_waypoint_point()
                .or_else(|| self.body.current_goal().map(|g| g.target))
                .unwrap_or(self.body.local_target);
        }

        if self.scheduling.dynamic {
            // Decimate short-term planning with distance to the target.
            let distance_heuristic =
                (self.body.position - self.body.local_target).flattened().length() - 5.0;
            self.frames_to_next_short = if distance_heuristic <= 0.0 {
                75
            } else {
                let frames = 75 + (2.0 * distance_heuristic * distance_heuristic) as u64;
                if frames > 170 {
                    150
                } else {
                    frames
                }
            };
        }
    }

    // ── Perceptive phase ──────────────────────────────────────────────────

    pub(crate) fn run_perceptive_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        let r = self.params.ped_query_radius;
        self.neighbors.reset(r * r);
        world.agent_neighbors(self.body.position, self.body.id, &mut self.neighbors);

        if self.scheduling.dynamic {
            // Perception is cheaper when moving slowly.
            self.frames_to_next_perceptive =
                if self.current_speed <= self.params.ped_typical_speed - 0.2 {
                    65
                } else {
                    30
                };
        }
    }

    // ── Predictive phase ──────────────────────────────────────────────────

    fn threat_index_for(&self, other: AgentId) -> Option<usize> {
        self.threat_list.iter().position(|t| t.other == other)
    }

    pub(crate) fn run_predictive_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        let now = self.current_time;
        let mut threat_list_changed = false;
        let direction_to_local_target =
            (self.body.local_target - self.body.position).flattened().normalized();

        self.crowd_control_direction = self.body.forward;
        self.num_agents_in_visual_field = 0;

        // Purge outdated threats (swap-remove keeps this O(n)).
        let mut i = 0;
        while i < self.threat_list.len() {
            if now > self.threat_list[i].max_time {
                self.threat_list.swap_remove(i);
            } else {
                i += 1;
            }
        }

        // While turning towards the target, threats are ignored entirely.
        if self.steering_state != SteeringState::TurnTowardsTarget {
            let neighbor_ids: Vec<AgentId> =
                self.neighbors.items().iter().map(|&(_, id)| id).collect();
            for other_id in neighbor_ids {
                let Some(other) = world.agent(other_id).copied() else {
                    continue;
                };
                self.num_agents_in_visual_field += 1;

                let dv = self.body.velocity - other.velocity;
                let d0 = (self.body.position - other.position).flattened();
                let combined =
                    self.body.radius + other.radius + self.params.ped_dynamic_collision_padding;
                let window = collision_window(dv, d0, combined);
                let existing = self.threat_index_for(other_id);

                match existing {
                    None => {
                        let Some((min_t, max_t)) = window else { continue };
                        if min_t < 0.0 && max_t > 0.0 {
                            // Already interpenetrating; reaction deals with
                            // contact, prediction has nothing to add.
                            continue;
                        }
                        if !(min_t > self.params.ped_threat_min_time_threshold
                            && max_t < self.params.ped_threat_max_time_threshold)
                        {
                            continue;
                        }

                        let mut threat = PredictedThreat {
                            other: other_id,
                            min_time: now + min_t,
                            max_time: now + max_t,
                            original_max_time: now + max_t,
                            threat_type: ThreatType::Unknown,
                            imminent: true,
                            oncoming_to_right_side: false,
                        };

                        let cos_theta = self.body.forward.dot(other.forward);
                        if cos_theta > self.params.ped_similar_direction_dot_product_threshold {
                            // Similar heading: reactive steering handles it.
                        } else if cos_theta < self.params.ped_oncoming_prediction_threshold {
                            // Oncoming: only a threat when the other agent
                            // stands between us and the local target.
                            let to_other_from_target =
                                (other.position - self.body.local_target).flattened();
                            let to_other_from_here =
                                (other.position - self.body.position).flattened();
                            let side_of_target =
                                direction_to_local_target.dot(to_other_from_target);
                            let side_of_location =
                                direction_to_local_target.dot(to_other_from_here);
                            threat.threat_type = ThreatType::Oncoming;
                            if side_of_target < 0.0 && side_of_location > 0.0 {
                                let dir_to_other =
                                    (other.position - self.body.position).flattened();
                                if dir_to_other.dot(self.right_side) > 0.0
                                    && (-dir_to_other).dot(other.forward.right_side_xz()) > 0.0
                                {
                                    threat.oncoming_to_right_side = true;
                                }
                                threat_list_changed = true;
                                self.threat_list.push(threat);
                            }
                        } else {
                            // Possibly crossing: compare heading-ray
                            // intersections against the distance between us.
                            let Some((my_t, his_t)) = intersect_two_rays_2d(
                                self.body.position,
                                self.body.forward,
                                other.position,
                                other.forward,
                            ) else {
                                continue;
                            };
                            let distance_to_other =
                                (other.position - self.body.position).flattened().length();
                            if my_t < distance_to_other {
                                // Do the planned routes actually cross, or
                                // does one of us stop short of the point?
                                let crossing = intersect_two_rays_2d(
                                    self.body.position,
                                    self.body.local_target - self.body.position,
                                    other.position,
                                    other.goal_target - other.position,
                                );
                                if let Some((t1, t2)) = crossing {
                                    if t1 > 0.0 && t1 < 1.0 && t2 > 0.0 && t2 < 1.0 {
                                        threat.threat_type = if my_t < his_t {
                                            ThreatType::CrossingSoon
                                        } else {
                                            ThreatType::CrossingLate
                                        };
                                        threat_list_changed = true;
                                        self.threat_list.push(threat);
                                    }
                                }
                            }
                        }
                    }
                    Some(index) => {
                        // Known threat: refresh or demote in place.
                        match window {
                            Some((min_t, max_t))
                                if min_t > self.params.ped_threat_min_time_threshold
                                    && max_t < self.params.ped_threat_max_time_threshold =>
                            {
                                self.threat_list[index].min_time = now + min_t;
                                self.threat_list[index].max_time = now + max_t;
                                self.threat_list[index].imminent = true;
                            }
                            _ => {
                                // Outside the window (or no contact at
                                // all): keep it until expiry so reactive
                                // feelers know it was already considered.
                                self.threat_list[index].imminent = false;
                            }
                        }
                    }
                }
            }
        }

        // Recompute aggregates over the updated list.
        self.max_threat_time = f32::NEG_INFINITY;
        self.min_threat_time = f32::INFINITY;
        self.most_imminent_threat = None;
        let mut num_imminent = 0usize;
        for (i, threat) in self.threat_list.iter().enumerate() {
            self.max_threat_time = self.max_threat_time.max(threat.original_max_time);
            if threat.imminent {
                num_imminent += 1;
                if threat.min_time < self.min_threat_time {
                    self.min_threat_time = threat.min_time;
                    self.most_imminent_threat = Some(i);
                }
            }
        }

        // ── Steering-state transitions ────────────────────────────────────
        let facing_dot = direction_to_local_target.dot(self.body.forward);
        if facing_dot < self.params.ped_wrong_direction_dot_product_threshold
            || (facing_dot < self.params.ped_same_direction_dot_product_threshold
                && self.steering_state == SteeringState::TurnTowardsTarget)
        {
            // Not facing the local target: turn first, predict later.
            self.steering_state = SteeringState::TurnTowardsTarget;
        } else if !self.threat_list.is_empty() && num_imminent > 0 {
            self.steering_state = SteeringState::ProactivelyAvoid;
            if let Some(index) = self.most_imminent_threat {
                // Don't remember the expected threat for more than a
                // moment past its window.
                self.time_to_wait = self.threat_list[index].original_max_time + 0.5;
            }
        } else if self.steering_state == SteeringState::ProactivelyAvoid
            || (self.steering_state == SteeringState::WaitUntilClear
                && !threat_list_changed
                && self.time_to_wait > now)
        {
            self.steering_state = SteeringState::WaitUntilClear;
        } else {
            self.steering_state = SteeringState::NoThreat;
            self.threat_list.clear();
        }
    }

    // ── Reactive feelers ──────────────────────────────────────────────────

    pub(crate) fn update_reactive_feelers(&self, world: &WorldView<'_>) -> FeelerInfo {
        let reach = self.params.ped_typical_speed * self.params.ped_reactive_anticipation_factor;
        let forward = self.body.forward;
        let right = self.right_side;
        let position = self.body.position;
        let radius = self.body.radius;

        // The front feeler is stretched slightly so the agent commits to a
        // turn direction before its shoulders are level with the contact.
        let rays = [
            Ray::with_length_interval(position, forward * (reach * 1.1)),
            Ray::with_length_interval(
                position + right * radius,
                (forward * 0.75 + right * 0.1) * reach,
            ),
            Ray::with_length_interval(
                position - right * radius,
                (forward * 0.75 - right * 0.1) * reach,
            ),
            Ray::with_length_interval(
                position + right * radius,
                (forward * 0.05 + right * 0.1) * reach,
            ),
            Ray::with_length_interval(
                position - right * radius,
                (forward * 0.05 - right * 0.1) * reach,
            ),
        ];

        let mut feelers = FeelerInfo::default();
        let slots: [(&mut Option<HitKind>, &mut f32, &Ray); 5] = [
            (&mut feelers.object_front, &mut feelers.t_front, &rays[0]),
            (&mut feelers.object_right, &mut feelers.t_right, &rays[1]),
            (&mut feelers.object_left, &mut feelers.t_left, &rays[2]),
            (&mut feelers.object_rside, &mut feelers.t_rside, &rays[3]),
            (&mut feelers.object_lside, &mut feelers.t_lside, &rays[4]),
        ];
        for (object, t, ray) in slots {
            if let Some(hit) = world.trace(ray, self.body.id) {
                *object = Some(hit.kind);
                *t = hit.t;
            }
        }
        feelers
    }

    fn hit_agent<'w>(
        &self,
        world: &'w WorldView<'_>,
        hit: Option<HitKind>,
    ) -> Option<&'w AgentSummary> {
        match hit {
            Some(HitKind::Agent(id)) => world.agent(id),
            _ => None,
        }
    }

    fn is_static_hit(hit: Option<HitKind>) -> bool {
        matches!(hit, Some(HitKind::Obstacle(_)))
    }

    /// Would this already-perceived agent still collide with us if nothing
    /// changes?  Used to ignore feeler contacts the prediction phase has
    /// dealt with.
    fn poses_no_threat(&self, other: &AgentSummary) -> bool {
        let dv = self.body.velocity - other.velocity;
        let d0 = (self.body.position - other.position).flattened();
        let combined =
            self.body.radius + other.radius + self.params.ped_dynamic_collision_padding;
        collision_window(dv, d0, combined).is_none()
    }

    // ── Reactive phase ────────────────────────────────────────────────────

    pub(crate) fn run_reactive_phase(&mut self, world: &WorldView<'_>) {
        if !self.body.enabled {
            return;
        }
        if self.body.reached_local_target(self.reach_threshold()) {
            self.run_short_term_planning_phase(world);
            if !self.body.enabled {
                return;
            }
        }

        let params = self.params.clone();
        let feelers = self.update_reactive_feelers(world);
        let hit_something = feelers.hit_something();
        let mut comfort_zone_violated = false;

        let desired_speed = self
            .body
            .current_goal()
            .map(|g| g.desired_speed)
            .unwrap_or(params.ped_typical_speed);

        self.command.clear();
        self.command.scoot = 0.0;
        self.command.aim_for_target_direction = true;
        self.command.target_direction =
            (self.body.local_target - self.body.position).flattened().normalized();
        self.command.aim_for_target_speed = true;
        self.command.turning_amount = params.ped_adjustment_turn_rate;
        self.command.acceleration = 1.0;
        self.command.target_speed = params.ped_typical_speed_factor * desired_speed;

        // Scooting: a side force proportional to how close an object is,
        // applied regardless of state.
        if feelers.t_right < params.ped_comfort_zone {
            if feelers.object_left.is_none() && feelers.object_lside.is_none() {
                self.command.scoot = (-1.0 / feelers.t_right).max(-params.ped_max_force);
            } else {
                comfort_zone_violated = true;
            }
        }
        if feelers.t_left < params.ped_comfort_zone {
            if feelers.object_right.is_none() && feelers.object_rside.is_none() {
                self.command.scoot = (1.0 / feelers.t_left).min(params.ped_max_force);
            } else {
                comfort_zone_violated = true;
            }
        }

        if hit_something {
            self.react_to_feeler_hits(world, &feelers, comfort_zone_violated, desired_speed);
        } else {
            match self.steering_state {
                SteeringState::TurnTowardsTarget => {
                    if self.command.target_direction.dot(self.body.forward)
                        > params.ped_same_direction_dot_product_threshold
                    {
                        self.steering_state = SteeringState::NoThreat;
                    }
                    self.command.aim_for_target_direction = true;
                    self.command.turning_amount = params.ped_cornering_turn_rate;
                    self.command.aim_for_target_speed = true;
                    self.command.target_speed = desired_speed;
                }
                SteeringState::CooperateWithCrowd => {
                    // Steer with the aggregate crowd direction when it
                    // agrees with the goal side, otherwise creep towards
                    // the goal.
                    let posneg = self.crowd_control_direction.dot(self.right_side)
                        * self.command.target_direction.dot(self.right_side);
                    self.command.aim_for_target_direction = true;
                    if posneg >= 0.0 {
                        self.command.target_direction =
                            self.crowd_control_direction.normalized();
                    }
                    self.command.turning_amount = params.ped_adjustment_turn_rate;
                    self.command.aim_for_target_speed = true;
                    self.command.target_speed =
                        params.ped_typical_speed_factor * desired_speed;
                }
                SteeringState::ProactivelyAvoid => {
                    self.steer_to_avoid_most_imminent(world, desired_speed);
                }
                SteeringState::WaitUntilClear => {
                    self.command.aim_for_target_speed = false;
                    self.command.acceleration = 0.0;
                    self.command.aim_for_target_direction = false;
                    self.command.turning_amount = 0.0;
                }
                SteeringState::NoThreat => {
                    let td = self.command.target_direction.dot(self.body.forward);
                    self.command.turning_amount = if td
                        > params.ped_wrong_direction_dot_product_threshold
                        && td < params.ped_similar_direction_dot_product_threshold
                    {
                        params.ped_faster_avoidance_turn_rate
                    } else {
                        params.ped_adjustment_turn_rate
                    };
                    self.command.aim_for_target_direction = true;
                    self.command.aim_for_target_speed = true;
                    self.command.target_speed =
                        params.ped_typical_speed_factor * desired_speed;
                }
            }
        }

        if self.scheduling.dynamic {
            if hit_something {
                // Give perception a break; reaction carries the load now.
                self.frames_to_next_perceptive = 100;
            }
            self.frames_to_next_predictive = 6;
            self.frames_to_next_reactive = if hit_something {
                1
            } else if self.neighbors.is_empty() {
                4
            } else if self.threat_list.is_empty() {
                2
            } else {
                1
            };
        }
    }

    /// Steer around the most imminent predicted threat (the no-feeler-hit
    /// `ProactivelyAvoid` arm).
    fn steer_to_avoid_most_imminent(&mut self, world: &WorldView<'_>, desired_speed: f32) {
        let params = self.params.clone();
        let Some(threat) = self
            .most_imminent_threat
            .and_then(|i| self.threat_list.get(i))
            .cloned()
        else {
            return;
        };
        match threat.threat_type {
            ThreatType::Oncoming => {
                self.command.aim_for_target_direction = false;
                self.command.turning_amount = if threat.oncoming_to_right_side {
                    -params.ped_adjustment_turn_rate
                } else {
                    params.ped_adjustment_turn_rate
                };
            }
            ThreatType::CrossingSoon => {
                // Steer away and speed up to clear the crossing first.
                let on_left = world
                    .agent(threat.other)
                    .map(|other| self.right_side.dot(other.forward) < 0.0)
                    .unwrap_or(false);
                self.command.aim_for_target_speed = true;
                self.command.target_speed =
                    params.ped_slightly_faster_speed_factor * desired_speed;
                self.command.aim_for_target_direction = false;
                self.command.turning_amount = if on_left {
                    -params.ped_typical_avoidance_turn_rate
                } else {
                    params.ped_typical_avoidance_turn_rate
                };
            }
            ThreatType::CrossingLate => {
                // Steer behind the other agent and slow down.
                let on_left = world
                    .agent(threat.other)
                    .map(|other| self.right_side.dot(other.forward) < 0.0)
                    .unwrap_or(false);
                self.command.aim_for_target_speed = true;
                self.command.target_speed =
                    params.ped_slightly_slower_speed_factor * desired_speed;
                self.command.aim_for_target_direction = false;
                self.command.turning_amount = if on_left {
                    params.ped_typical_avoidance_turn_rate
                } else {
                    -params.ped_typical_avoidance_turn_rate
                };
            }
            ThreatType::Unknown => {
                error!(agent = %self.body.id, "imminent threat with unknown type");
            }
        }
    }

    /// Clamp a matched speed into the command, with the crowd discount.
    fn match_speed_of_hit_agents(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        comfort_zone_violated: bool,
    ) {
        for hit in [feelers.object_left, feelers.object_right, feelers.object_front] {
            if let Some(other) = self.hit_agent(world, hit) {
                let along = self.body.forward.dot(other.velocity);
                self.command.target_speed = self.command.target_speed.min(along);
            }
        }
        if comfort_zone_violated {
            self.command.target_speed *= 0.7;
        }
        if self.command.target_speed < 0.0 {
            self.command.target_speed = 0.0;
        }
    }

    fn react_to_feeler_hits(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        mut comfort_zone_violated: bool,
        desired_speed: f32,
    ) {
        let params = self.params.clone();

        let hit_static_object = Self::is_static_hit(feelers.object_front)
            || Self::is_static_hit(feelers.object_left)
            || Self::is_static_hit(feelers.object_right);

        // Agents our feelers touched that prediction does not know about.
        let mut found_new_threat = false;
        let mut existing_threat_raised_again = false;
        for hit in [feelers.object_front, feelers.object_left, feelers.object_right] {
            let Some(HitKind::Agent(id)) = hit else { continue };
            match self.threat_index_for(id) {
                None => found_new_threat = true,
                Some(i) if !self.threat_list[i].imminent => existing_threat_raised_again = true,
                Some(_) => {}
            }
        }

        if feelers.t_front < params.ped_comfort_zone
            || feelers.t_right < params.ped_comfort_zone
            || feelers.t_left < params.ped_comfort_zone
        {
            comfort_zone_violated = true;
        }

        // Count distinct agents touched, and how many of those pose no
        // threat on current velocities (already predictively avoided).
        let mut num_agents_hit = 0usize;
        let mut num_agents_not_posing_threat = 0usize;
        let mut count_hit = |hit: Option<HitKind>, this: &Self| {
            if let Some(other) = this.hit_agent(world, hit) {
                num_agents_hit += 1;
                if this.poses_no_threat(other) {
                    num_agents_not_posing_threat += 1;
                }
            }
        };
        count_hit(feelers.object_front, self);
        if feelers.object_left != feelers.object_front {
            count_hit(feelers.object_left, self);
        }
        if feelers.object_right != feelers.object_front
            && feelers.object_right != feelers.object_left
        {
            count_hit(feelers.object_right, self);
        }

        // ── Situation classification ──────────────────────────────────────
        let situation = if !hit_static_object && num_agents_hit == num_agents_not_posing_threat {
            ReactiveSituation::NoThreats
        } else if !hit_static_object && num_agents_hit == 1 {
            ReactiveSituation::OneAgent
        } else if !hit_static_object && num_agents_hit == 2 {
            ReactiveSituation::TwoAgents
        } else if !hit_static_object && num_agents_hit == 3 {
            ReactiveSituation::ThreeAgents
        } else if hit_static_object && num_agents_hit == 0 {
            ReactiveSituation::StaticOnly
        } else if hit_static_object && num_agents_hit == 1 {
            ReactiveSituation::StaticOneAgent
        } else if hit_static_object && num_agents_hit == 2 {
            ReactiveSituation::StaticTwoAgents
        } else {
            error!(agent = %self.body.id, "unclassifiable reactive situation");
            ReactiveSituation::Unknown
        };

        // ── Dispatch on (state, situation) ────────────────────────────────
        if self.steering_state == SteeringState::TurnTowardsTarget {
            if self.command.target_direction.dot(self.body.forward)
                > params.ped_same_direction_dot_product_threshold
            {
                self.steering_state = SteeringState::NoThreat;
            }
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_cornering_turn_rate;
            self.command.aim_for_target_speed = true;
            self.command.target_speed = 0.0;
            if feelers.t_left < params.ped_comfort_zone
                && feelers.t_right >= params.ped_comfort_zone
            {
                self.command.scoot = 0.5 * params.ped_max_force;
            } else if feelers.t_right < params.ped_comfort_zone {
                self.command.scoot = -0.5 * params.ped_max_force;
            }
        } else if self.steering_state == SteeringState::ProactivelyAvoid
            && found_new_threat
            && situation == ReactiveSituation::OneAgent
        {
            // Match the speed of whoever we're steering into, dodge it if
            // oncoming, otherwise keep avoiding the prediction.
            self.match_speed_of_hit_agents(world, feelers, true);

            let hit = feelers
                .object_front
                .or(feelers.object_right)
                .or(feelers.object_left);
            if let Some(other) = self.hit_agent(world, hit).copied() {
                let cos_theta = self.body.forward.dot(other.forward);
                if cos_theta < 0.0 {
                    let go_right =
                        (feelers.object_front.is_some() || feelers.object_left.is_some())
                            && feelers.object_right.is_none();
                    self.command.aim_for_target_direction = false;
                    self.command.turning_amount = if go_right {
                        params.ped_typical_avoidance_turn_rate
                    } else {
                        -params.ped_typical_avoidance_turn_rate
                    };
                } else {
                    self.steer_to_avoid_most_imminent(world, desired_speed);
                }
            }
        } else if situation != ReactiveSituation::NoThreats {
            match situation {
                ReactiveSituation::OneAgent => {
                    self.react_one_agent(world, feelers, comfort_zone_violated, desired_speed);
                }
                ReactiveSituation::TwoAgents => {
                    self.react_two_agents(world, feelers, comfort_zone_violated);
                }
                ReactiveSituation::ThreeAgents => {
                    self.match_speed_of_hit_agents(world, feelers, comfort_zone_violated);
                }
                ReactiveSituation::StaticOnly => {
                    self.react_static_only(feelers, comfort_zone_violated, desired_speed);
                }
                ReactiveSituation::StaticOneAgent => {
                    self.react_static_one_agent(world, feelers, desired_speed);
                }
                ReactiveSituation::StaticTwoAgents => {
                    self.react_static_two_agents(world, feelers, comfort_zone_violated);
                }
                ReactiveSituation::Unknown | ReactiveSituation::NoThreats => {}
            }
            if found_new_threat || existing_threat_raised_again {
                // A more imminent contact appeared: forget the predicted
                // wait and re-evaluate almost immediately.
                self.time_to_wait = self.current_time + 0.1;
            }
        }
    }

    fn react_one_agent(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        comfort_zone_violated: bool,
        desired_speed: f32,
    ) {
        let params = self.params.clone();
        let hit = feelers
            .object_front
            .or(feelers.object_right)
            .or(feelers.object_left);
        let Some(other) = self.hit_agent(world, hit).copied() else {
            return;
        };
        let cos_theta = self.body.forward.dot(other.forward);
        if cos_theta < params.ped_oncoming_reaction_threshold {
            // Oncoming: dodge away from the occupied side.
            let go_right = (feelers.object_front.is_some() || feelers.object_left.is_some())
                && feelers.object_right.is_none();
            self.command.aim_for_target_direction = false;
            let rate = if comfort_zone_violated {
                params.ped_faster_avoidance_turn_rate
            } else {
                params.ped_typical_avoidance_turn_rate
            };
            self.command.turning_amount = if go_right { rate } else { -rate };
            self.command.target_speed = if comfort_zone_violated {
                params.ped_slower_speed_factor * desired_speed
            } else {
                params.ped_typical_speed_factor * desired_speed
            };
        } else {
            // Crossing: yield to whoever reaches the intersection first.
            let crossing = intersect_two_rays_2d(
                self.body.position,
                self.body.forward,
                other.position,
                other.forward,
            );
            let (my_time, his_time) = crossing.unwrap_or((f32::INFINITY, f32::INFINITY));
            if his_time < my_time {
                // They go first; fall in behind them.
                let along = self.body.forward.dot(other.velocity);
                self.command.target_speed = self
                    .command
                    .target_speed
                    .min(params.ped_slower_speed_factor * along);
            } else {
                // We go first.
                let turn_left = feelers.object_right.is_some() && feelers.object_front.is_none();
                self.command.aim_for_target_direction = false;
                self.command.turning_amount = if turn_left {
                    -params.ped_typical_avoidance_turn_rate
                } else {
                    params.ped_typical_avoidance_turn_rate
                };
                self.command.target_speed = if comfort_zone_violated {
                    params.ped_slower_speed_factor * desired_speed
                } else {
                    params.ped_typical_speed_factor * desired_speed
                };
            }
        }
    }

    fn react_two_agents(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        comfort_zone_violated: bool,
    ) {
        let params = self.params.clone();
        // A big disc straight ahead may be caught by both side feelers;
        // front stands in for whichever side is empty.
        let obj_left = feelers.object_left.or(feelers.object_front);
        let obj_right = feelers.object_right.or(feelers.object_front);
        let (Some(left), Some(right)) = (
            self.hit_agent(world, obj_left).copied(),
            self.hit_agent(world, obj_right).copied(),
        ) else {
            return;
        };
        let cos_left = self.body.forward.dot(left.forward);
        let cos_right = self.body.forward.dot(right.forward);

        if cos_left < params.ped_oncoming_reaction_threshold
            && cos_right < params.ped_oncoming_reaction_threshold
        {
            // Both oncoming: stop and let them flow around.
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_typical_avoidance_turn_rate;
            self.command.target_speed = 0.0;
        } else if cos_left > params.ped_same_direction_dot_product_threshold
            && cos_right < params.ped_oncoming_reaction_threshold
        {
            // Follow the one going our way, on the left.
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if obj_right == feelers.object_front {
                -params.ped_typical_avoidance_turn_rate
            } else {
                -params.ped_adjustment_turn_rate
            };
            let along = self.body.forward.dot(left.velocity);
            self.command.target_speed = self.command.target_speed.min(along);
            if comfort_zone_violated {
                self.command.target_speed *= 0.7;
            }
            self.command.target_speed = self.command.target_speed.max(0.0);
        } else if cos_left < params.ped_oncoming_reaction_threshold
            && cos_right > params.ped_same_direction_dot_product_threshold
        {
            // Follow the one going our way, on the right.
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if obj_left == feelers.object_front {
                params.ped_typical_avoidance_turn_rate
            } else {
                params.ped_adjustment_turn_rate
            };
            let along = self.body.forward.dot(right.velocity);
            self.command.target_speed = self.command.target_speed.min(along);
            if comfort_zone_violated {
                self.command.target_speed *= 0.7;
            }
            self.command.target_speed = self.command.target_speed.max(0.0);
        } else {
            // Mixed headings: just match the slower of the two.
            let along = self
                .body
                .forward
                .dot(left.velocity)
                .min(self.body.forward.dot(right.velocity));
            self.command.target_speed = self.command.target_speed.min(along);
            if comfort_zone_violated {
                self.command.target_speed *= 0.7;
            }
            self.command.target_speed = self.command.target_speed.max(0.0);
        }
    }

    pub(crate) fn react_static_only(
        &mut self,
        feelers: &FeelerInfo,
        comfort_zone_violated: bool,
        desired_speed: f32,
    ) {
        let params = self.params.clone();
        if feelers.t_left >= feelers.t_front && feelers.t_front > feelers.t_right {
            // More room on the left.
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if comfort_zone_violated {
                -params.ped_faster_avoidance_turn_rate
            } else {
                -params.ped_typical_avoidance_turn_rate
            };
            self.command.target_speed = params.ped_typical_speed_factor * desired_speed;
        } else if feelers.t_right >= feelers.t_front && feelers.t_front > feelers.t_left {
            // More room on the right.
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if comfort_zone_violated {
                params.ped_faster_avoidance_turn_rate
            } else {
                params.ped_typical_avoidance_turn_rate
            };
            self.command.target_speed = params.ped_typical_speed_factor * desired_speed;
        } else if feelers.t_front < feelers.t_left && feelers.t_front < feelers.t_right {
            // t_front not between the sides: a convex corner dead ahead.
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_faster_avoidance_turn_rate;
            self.command.target_speed = if comfort_zone_violated {
                params.ped_slower_speed_factor * desired_speed
            } else {
                params.ped_typical_speed_factor * desired_speed
            };
        } else if feelers.t_front == f32::INFINITY {
            // A doorway: both sides clipped, the middle clear.
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_typical_avoidance_turn_rate;
            self.command.target_speed = params.ped_typical_speed_factor * desired_speed;
            self.command.scoot = if feelers.t_left < feelers.t_right {
                0.5 * params.ped_max_force
            } else {
                -0.5 * params.ped_max_force
            };
        } else {
            // A concave corner: turn hard towards the target and slow down.
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_faster_avoidance_turn_rate;
            self.command.target_speed = params.ped_slower_speed_factor * desired_speed;
        }
    }

    fn react_static_one_agent(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        desired_speed: f32,
    ) {
        let params = self.params.clone();
        let agent_hit = [feelers.object_front, feelers.object_right, feelers.object_left]
            .into_iter()
            .flatten()
            .find(|h| matches!(h, HitKind::Agent(_)));
        let obstacle_hit = [feelers.object_front, feelers.object_right, feelers.object_left]
            .into_iter()
            .flatten()
            .find(|h| matches!(h, HitKind::Obstacle(_)));
        let Some(other) = self.hit_agent(world, agent_hit).copied() else {
            return;
        };

        if other.forward.dot(self.body.forward) < params.ped_oncoming_reaction_threshold {
            // Oncoming agent next to a wall.
            if obstacle_hit == feelers.object_right {
                // Wall on our right: wait for them to go around us.
                self.command.target_speed = 0.0;
            } else if obstacle_hit == feelers.object_left {
                // Wall on our left: swing right around them.
                self.command.aim_for_target_direction = false;
                self.command.turning_amount = params.ped_typical_avoidance_turn_rate;
                self.command.target_speed = params.ped_typical_speed_factor * desired_speed;
            } else {
                // Only the front feeler found the wall: a corner.
                self.command.aim_for_target_direction = true;
                self.command.turning_amount = params.ped_cornering_turn_rate;
                self.command.target_speed = 0.0;
            }
        } else {
            let crossing = intersect_two_rays_2d(
                self.body.position,
                self.body.forward,
                other.position,
                other.forward,
            );
            let (my_time, his_time) = crossing.unwrap_or((f32::INFINITY, f32::INFINITY));
            if my_time < his_time {
                // We reach the pinch point first: press on.
                self.command.target_speed =
                    params.ped_slightly_faster_speed_factor * desired_speed;
            } else {
                // They do: fall in behind.
                let along = self.body.forward.dot(other.velocity);
                self.command.target_speed = self
                    .command
                    .target_speed
                    .min(params.ped_slower_speed_factor * along);
            }
        }
    }

    fn react_static_two_agents(
        &mut self,
        world: &WorldView<'_>,
        feelers: &FeelerInfo,
        comfort_zone_violated: bool,
    ) {
        let params = self.params.clone();
        self.match_speed_of_hit_agents(world, feelers, comfort_zone_violated);

        let obstacle_hit = [feelers.object_front, feelers.object_right, feelers.object_left]
            .into_iter()
            .flatten()
            .find(|h| matches!(h, HitKind::Obstacle(_)));
        if obstacle_hit == feelers.object_right {
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if comfort_zone_violated {
                -params.ped_faster_avoidance_turn_rate
            } else {
                -params.ped_typical_avoidance_turn_rate
            };
        } else if obstacle_hit == feelers.object_left {
            self.command.aim_for_target_direction = false;
            self.command.turning_amount = if comfort_zone_violated {
                params.ped_faster_avoidance_turn_rate
            } else {
                params.ped_typical_avoidance_turn_rate
            };
        } else {
            // Obstacle dead centre between two agents: corner or clutter.
            self.command.aim_for_target_direction = true;
            self.command.turning_amount = params.ped_cornering_turn_rate;
            self.command.target_speed = 0.0;
        }
    }

    // ── Locomotion ────────────────────────────────────────────────────────

    fn do_euler_step_with_force(&mut self, force: Vector, dt: f32) {
        let clipped = force.clamped(self.params.ped_max_force);
        let acceleration = clipped / self.mass;
        self.body.velocity =
            (self.body.velocity + acceleration * dt).clamped(self.params.ped_max_speed);
        self.current_speed = self.body.velocity.length();
        self.body.position = self.body.position + self.body.velocity * dt;
    }

    pub(crate) fn do_command_based_steering(&mut self, dt: f32) {
        let params = self.params.clone();

        // ── Orientation ───────────────────────────────────────────────────
        let mut new_forward;
        if !self.command.aim_for_target_direction {
            // Plain "turn left" / "turn right".
            new_forward = self.body.forward
                + self.right_side * (params.ped_max_turning_rate * self.command.turning_amount);
        } else {
            // Turn to face the target direction; positive rate turns right.
            let initial_dot = self.command.target_direction.dot(self.right_side);
            let turning_rate = if initial_dot > 0.0 {
                params.ped_max_turning_rate
            } else {
                -params.ped_max_turning_rate
            };
            new_forward = self.body.forward
                + self.right_side * (turning_rate * self.command.turning_amount.abs());
            let new_dot = self.command.target_direction.dot(new_forward.right_side_xz());
            if initial_dot * new_dot <= 0.0 {
                // Overshot (or already aligned): snap to the target
                // direction instead of oscillating around it.
                new_forward = self.command.target_direction;
            }
        }

        new_forward = new_forward.normalized();
        if new_forward != Vector::ZERO {
            self.body.forward = new_forward;
            self.right_side = new_forward.right_side_xz();
        }
        // Command-based steering redirects the current momentum along the
        // new facing; everything after this is physically integrated.
        self.body.velocity = self.body.forward * self.current_speed;

        // ── Force ─────────────────────────────────────────────────────────
        let mut total_force;
        if !self.command.aim_for_target_speed {
            total_force =
                self.body.forward * (params.ped_max_force * self.command.acceleration);
        } else {
            let max_backwards_force =
                -params.ped_braking_rate * self.current_speed.abs() * self.mass / dt;
            let scalar_force = ((self.command.target_speed - self.current_speed) * 8.0)
                .clamp(max_backwards_force, params.ped_max_force);
            total_force = self.body.forward * scalar_force;
        }
        total_force =
            total_force + self.right_side * (params.ped_scoot_rate * self.command.scoot);

        self.do_euler_step_with_force(total_force, dt);
    }

    // ── Test access ───────────────────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn command(&self) -> &SteeringCommand {
        &self.command
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: SteeringState) {
        self.steering_state = state;
    }

    #[cfg(test)]
    pub(crate) fn set_time(&mut self, time: f32) {
        self.current_time = time;
    }
}

// ── SteeringAgent impl ────────────────────────────────────────────────────────

impl SteeringAgent for PprAgent {
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

        // LONG-TERM / MID-TERM / SHORT-TERM PLANNING
        self.body.waypoints.clear();
        self.body.current_waypoint = 0;
        self.body.mid_term_path.clear();
        self.body.local_target = self
            .body
            .current_goal()
            .map(|g| g.target)
            .unwrap_or(initial.position);

        // PERCEPTION
        self.neighbors.reset(self.params.ped_query_radius * self.params.ped_query_radius);
        self.num_agents_in_visual_field = 0;

        // PREDICTION
        self.time_to_wait = 0.0;
        self.min_threat_time = f32::INFINITY;
        self.max_threat_time = f32::NEG_INFINITY;
        self.most_imminent_threat = None;
        self.threat_list.clear();
        self.crowd_control_direction = self.body.forward;
        self.steering_state = SteeringState::TurnTowardsTarget;

        // REACTION
        self.command.clear();

        // PHASE SCHEDULERS
        self.next_long = 0;
        self.next_mid = 0;
        self.next_short = 0;
        self.next_perceptive = 0;
        self.next_predictive = 0;
        self.next_reactive = 0;
        self.frames_to_next_long = 100_000;
        self.frames_to_next_mid = 100_000;
        self.frames_to_next_short = 1;
        self.frames_to_next_perceptive = 1;
        self.frames_to_next_predictive = 1;
        self.frames_to_next_reactive = 1;

        // GEOMETRY / PHYSICS
        self.right_side = self.body.forward.right_side_xz();
        self.current_speed = initial.speed;
        self.body.velocity =
            (self.body.forward * self.current_speed).clamped(self.params.ped_max_speed);
        self.mass = 1.0;
        Ok(())
    }

    fn update_ai(&mut self, frame: FrameInfo, world: &WorldView<'_>) -> CrowdResult<()> {
        if !self.body.enabled {
            return Ok(());
        }
        self.current_time = frame.time;
        let n = frame.frame;
        let profiler = self.profiler.clone();

        // Run whatever phases are scheduled for this frame.
        if n >= self.next_long {
            profiled(&profiler, PhaseId::LongTerm, || {
                self.run_long_term_planning_phase(world)
            });
            self.next_long = n + if self.scheduling.dynamic {
                self.frames_to_next_long
            } else {
                self.scheduling.long_interval
            };
        }
        if n >= self.next_mid {
            profiled(&profiler, PhaseId::MidTerm, || {
                self.run_mid_term_planning_phase(world)
            });
            self.next_mid = n + if self.scheduling.dynamic {
                self.frames_to_next_mid
            } else {
                self.scheduling.mid_interval
            };
        }
        if n >= self.next_short {
            profiled(&profiler, PhaseId::ShortTerm, || {
                self.run_short_term_planning_phase(world)
            });
            self.next_short = n + if self.scheduling.dynamic {
                self.frames_to_next_short
            } else {
                self.scheduling.short_interval
            };
        }
        if n >= self.next_perceptive {
            profiled(&profiler, PhaseId::Perceptive, || self.run_perceptive_phase(world));
            self.next_perceptive = n + if self.scheduling.dynamic {
                self.frames_to_next_perceptive
            } else {
                self.scheduling.perceptive_interval
            };
        }
        if n >= self.next_predictive {
            profiled(&profiler, PhaseId::Predictive, || self.run_predictive_phase(world));
            self.next_predictive = n + if self.scheduling.dynamic {
                self.frames_to_next_predictive
            } else {
                self.scheduling.predictive_interval
            };
        }
        if n >= self.next_reactive {
            profiled(&profiler, PhaseId::Reactive, || self.run_reactive_phase(world));
            self.next_reactive = n + if self.scheduling.dynamic {
                self.frames_to_next_reactive
            } else {
                self.scheduling.reactive_interval
            };
        }

        // Locomotion runs every tick.
        let dt = frame.dt;
        profiled(&profiler, PhaseId::Steering, || {
            self.do_command_based_steering(dt)
        });
        Ok(())
    }

    fn disable(&mut self) {
        self.body.enabled = false;
        self.body.velocity = Vector::ZERO;
        self.current_speed = 0.0;
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
