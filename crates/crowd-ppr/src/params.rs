//! The `ped_*` parameter set.
//!
//! Defaults are the tuned constants of the reference pedestrian model.
//! Speeds are m/s, forces mass·m/s², turn rates are fractions of the
//! side vector added per decision, thresholds on unit-vector dot products
//! are cosines.

use crowd_core::options::{parse_f32, parse_u32};
use crowd_core::Behaviour;

/// Tunable PPR parameters, overridable through the behaviour dictionary.
/// Unknown keys are ignored.
#[derive(Clone, Debug)]
pub struct PprParams {
    pub ped_max_speed: f32,
    pub ped_typical_speed: f32,
    pub ped_max_force: f32,

    // Factors multiplied into the goal's desired speed.
    pub ped_max_speed_factor: f32,
    pub ped_faster_speed_factor: f32,
    pub ped_slightly_faster_speed_factor: f32,
    pub ped_typical_speed_factor: f32,
    pub ped_slightly_slower_speed_factor: f32,
    pub ped_slower_speed_factor: f32,

    pub ped_cornering_turn_rate: f32,
    pub ped_adjustment_turn_rate: f32,
    pub ped_faster_avoidance_turn_rate: f32,
    pub ped_typical_avoidance_turn_rate: f32,

    /// Braking is expressed positively; negate at the point of use.
    pub ped_braking_rate: f32,
    pub ped_comfort_zone: f32,
    pub ped_query_radius: f32,

    // Facing-comparison cosines.
    pub ped_similar_direction_dot_product_threshold: f32,
    pub ped_same_direction_dot_product_threshold: f32,
    pub ped_oncoming_prediction_threshold: f32,
    pub ped_oncoming_reaction_threshold: f32,
    pub ped_wrong_direction_dot_product_threshold: f32,

    pub ped_threat_distance_threshold: f32,
    pub ped_threat_min_time_threshold: f32,
    pub ped_threat_max_time_threshold: f32,

    pub ped_predictive_anticipation_factor: f32,
    pub ped_reactive_anticipation_factor: f32,
    pub ped_crowd_influence_factor: f32,
    pub ped_facing_static_object_threshold: f32,

    pub ped_ordinary_steering_strength: f32,
    pub ped_oncoming_threat_avoidance_strength: f32,
    pub ped_cross_threat_avoidance_strength: f32,

    /// Turning adds a fraction of the side vector to forward and
    /// renormalises; this caps that fraction so -1..1 turning amounts map
    /// onto a bounded angular rate.
    pub ped_max_turning_rate: f32,
    pub ped_feeling_crowded_threshold: u32,
    pub ped_scoot_rate: f32,
    pub ped_reached_target_distance_threshold: f32,
    pub ped_dynamic_collision_padding: f32,

    // Waypoint management.
    pub ped_furthest_local_target_distance: usize,
    pub ped_next_waypoint_distance: usize,
    pub ped_max_num_waypoints: usize,
}

impl Default for PprParams {
    fn default() -> Self {
        Self {
            ped_max_speed: 2.6,
            ped_typical_speed: 1.33,
            ped_max_force: 14.0,
            ped_max_speed_factor: 1.7,
            ped_faster_speed_factor: 1.31,
            ped_slightly_faster_speed_factor: 1.15,
            ped_typical_speed_factor: 1.0,
            ped_slightly_slower_speed_factor: 0.77,
            ped_slower_speed_factor: 0.5,
            ped_cornering_turn_rate: 1.9,
            ped_adjustment_turn_rate: 0.16,
            ped_faster_avoidance_turn_rate: 0.55,
            ped_typical_avoidance_turn_rate: 0.26,
            ped_braking_rate: 0.95,
            ped_comfort_zone: 1.5,
            ped_query_radius: 10.0,
            ped_similar_direction_dot_product_threshold: 0.94,
            ped_same_direction_dot_product_threshold: 0.99,
            ped_oncoming_prediction_threshold: -0.95,
            ped_oncoming_reaction_threshold: -0.95,
            ped_wrong_direction_dot_product_threshold: 0.55,
            ped_threat_distance_threshold: 8.0,
            ped_threat_min_time_threshold: 0.8,
            ped_threat_max_time_threshold: 4.0,
            ped_predictive_anticipation_factor: 5.0,
            ped_reactive_anticipation_factor: 1.1,
            ped_crowd_influence_factor: 0.3,
            ped_facing_static_object_threshold: 0.3,
            ped_ordinary_steering_strength: 0.05,
            ped_oncoming_threat_avoidance_strength: 0.15,
            ped_cross_threat_avoidance_strength: 0.9,
            ped_max_turning_rate: 0.1,
            ped_feeling_crowded_threshold: 3,
            ped_scoot_rate: 0.4,
            ped_reached_target_distance_threshold: 0.5,
            ped_dynamic_collision_padding: 0.2,
            ped_furthest_local_target_distance: 20,
            ped_next_waypoint_distance: 70,
            ped_max_num_waypoints: 20,
        }
    }
}

impl PprParams {
    pub fn apply_behaviour(&mut self, behaviour: &Behaviour) {
        behaviour.apply_each(|key, value| self.apply_option(key, value));
    }

    /// Apply one `key = value` override; returns false for unknown keys.
    pub fn apply_option(&mut self, key: &str, value: &str) -> bool {
        macro_rules! float_keys {
            ($($name:ident),+ $(,)?) => {
                match key {
                    $(stringify!($name) => {
                        self.$name = parse_f32(key, value, self.$name);
                        return true;
                    })+
                    _ => {}
                }
            };
        }
        float_keys!(
            ped_max_speed,
            ped_typical_speed,
            ped_max_force,
            ped_max_speed_factor,
            ped_faster_speed_factor,
            ped_slightly_faster_speed_factor,
            ped_typical_speed_factor,
            ped_slightly_slower_speed_factor,
            ped_slower_speed_factor,
            ped_cornering_turn_rate,
            ped_adjustment_turn_rate,
            ped_faster_avoidance_turn_rate,
            ped_typical_avoidance_turn_rate,
            ped_braking_rate,
            ped_comfort_zone,
            ped_query_radius,
            ped_similar_direction_dot_product_threshold,
            ped_same_direction_dot_product_threshold,
            ped_oncoming_prediction_threshold,
            ped_oncoming_reaction_threshold,
            ped_wrong_direction_dot_product_threshold,
            ped_threat_distance_threshold,
            ped_threat_min_time_threshold,
            ped_threat_max_time_threshold,
            ped_predictive_anticipation_factor,
            ped_reactive_anticipation_factor,
            ped_crowd_influence_factor,
            ped_facing_static_object_threshold,
            ped_ordinary_steering_strength,
            ped_oncoming_threat_avoidance_strength,
            ped_cross_threat_avoidance_strength,
            ped_max_turning_rate,
            ped_scoot_rate,
            ped_reached_target_distance_threshold,
            ped_dynamic_collision_padding,
        );
        match key {
            "ped_feeling_crowded_threshold" => {
                self.ped_feeling_crowded_threshold =
                    parse_u32(key, value, self.ped_feeling_crowded_threshold);
            }
            "ped_furthest_local_target_distance" => {
                self.ped_furthest_local_target_distance =
                    parse_u32(key, value, self.ped_furthest_local_target_distance as u32) as usize;
            }
            "ped_next_waypoint_distance" => {
                self.ped_next_waypoint_distance =
                    parse_u32(key, value, self.ped_next_waypoint_distance as u32) as usize;
            }
            "ped_max_num_waypoints" => {
                self.ped_max_num_waypoints =
                    parse_u32(key, value, self.ped_max_num_waypoints as u32) as usize;
            }
            _ => return false,
        }
        true
    }
}
