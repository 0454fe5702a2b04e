//! The `rvo_*` parameter set.

use crowd_core::options::{parse_f32, parse_u32};
use crowd_core::Behaviour;

/// How far past its own radius an agent may sit from a waypoint and still
/// count it as reached.
pub const REACHED_WAYPOINT_MULTIPLIER: f32 = 1.0;
/// Same, for the current goal — ORCA agents declare victory early and let
/// the cognitive layer move on.
pub const REACHED_GOAL_MULTIPLIER: f32 = 2.5;

/// Tunable ORCA parameters, overridable through the behaviour dictionary.
///
/// Recognised keys: `rvo_neighbor_distance`, `rvo_max_neighbors`,
/// `rvo_time_horizon`, `rvo_max_speed`, `rvo_preferred_speed`,
/// `rvo_time_horizon_obstacles`, `next_waypoint_distance`.  Unknown keys
/// are ignored.
#[derive(Clone, Debug)]
pub struct OrcaParams {
    /// Agent-neighbour query radius in metres.
    pub neighbor_distance: f32,
    /// Cap on the agent-neighbour list.
    pub max_neighbors: usize,
    /// Look-ahead horizon τ for agent avoidance, seconds.
    pub time_horizon: f32,
    /// Hard speed cap; also the preferred-velocity magnitude.
    pub max_speed: f32,
    /// Nominal cruising speed (kept for behaviours that tune it; the
    /// preferred velocity itself uses `max_speed`, as the solver expects).
    pub preferred_speed: f32,
    /// Look-ahead horizon τ_obs for obstacle avoidance, seconds.
    pub time_horizon_obstacles: f32,
    /// Waypoint spacing along planned paths, in path nodes.
    pub next_waypoint_distance: usize,
}

impl Default for OrcaParams {
    fn default() -> Self {
        Self {
            neighbor_distance: 10.0,
            max_neighbors: 10,
            time_horizon: 2.0,
            max_speed: 1.33,
            preferred_speed: 1.33,
            time_horizon_obstacles: 2.0,
            next_waypoint_distance: 5,
        }
    }
}

impl OrcaParams {
    /// Apply a behaviour's overrides.
    pub fn apply_behaviour(&mut self, behaviour: &Behaviour) {
        behaviour.apply_each(|key, value| self.apply_option(key, value));
    }

    /// Apply one `key = value` override; returns false for unknown keys.
    pub fn apply_option(&mut self, key: &str, value: &str) -> bool {
        match key {
            "rvo_neighbor_distance" => {
                self.neighbor_distance = parse_f32(key, value, self.neighbor_distance)
            }
            "rvo_max_neighbors" => {
                self.max_neighbors = parse_u32(key, value, self.max_neighbors as u32) as usize
            }
            "rvo_time_horizon" => self.time_horizon = parse_f32(key, value, self.time_horizon),
            "rvo_max_speed" => self.max_speed = parse_f32(key, value, self.max_speed),
            "rvo_preferred_speed" => {
                self.preferred_speed = parse_f32(key, value, self.preferred_speed)
            }
            "rvo_time_horizon_obstacles" => {
                self.time_horizon_obstacles =
                    parse_f32(key, value, self.time_horizon_obstacles)
            }
            "next_waypoint_distance" => {
                self.next_waypoint_distance =
                    parse_u32(key, value, self.next_waypoint_distance as u32) as usize
            }
            _ => return false,
        }
        true
    }
}
