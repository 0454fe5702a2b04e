//! Predicted collision threats.
//!
//! A threat is a neighbour whose closest approach to this agent falls
//! inside the prediction window.  The times come from solving
//! `‖dO + t·dV‖ = rA + rB + pad` as a quadratic in `t`: the two roots
//! bracket the interval during which the discs would interpenetrate if
//! both agents kept their current velocities.

use crowd_core::geometry::Vector;
use crowd_core::AgentId;

/// Classification used by the reactive dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThreatType {
    /// Not yet typed; kept distinct to make stale entries visible.
    Unknown,
    /// Facing nearly opposite this agent and standing between it and the
    /// local target.
    Oncoming,
    /// Paths cross and the other agent gets to the crossing point first.
    CrossingSoon,
    /// Paths cross and this agent gets there first.
    CrossingLate,
}

/// One tracked threat.  Times are absolute simulation times.
#[derive(Clone, Debug)]
pub struct PredictedThreat {
    pub other: AgentId,
    /// Earliest predicted contact.
    pub min_time: f32,
    /// Latest predicted contact; refreshed while the threat stays imminent.
    pub max_time: f32,
    /// `max_time` as first predicted — used for wait-until-clear expiry so
    /// that refreshes don't extend the wait forever.
    pub original_max_time: f32,
    pub threat_type: ThreatType,
    pub imminent: bool,
    /// For oncoming threats: whether the other agent passes on this
    /// agent's right side (so avoidance turns left).
    pub oncoming_to_right_side: bool,
}

/// Solve the closest-approach quadratic.
///
/// Returns the `(t_min, t_max)` interpenetration window in *relative*
/// seconds from now, or `None` when the discriminant shows no contact.
/// A non-positive quadratic coefficient (zero relative velocity) also
/// reports `None`.
pub fn collision_window(dv: Vector, d0: Vector, combined_radius: f32) -> Option<(f32, f32)> {
    let a = dv.dot(dv);
    let b = 2.0 * dv.dot(d0);
    let c = d0.dot(d0) - combined_radius * combined_radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant <= 0.0 || a <= f32::EPSILON {
        return None;
    }
    let sqrt_discriminant = discriminant.sqrt();
    let inv_2a = 0.5 / a;
    Some(((-b - sqrt_discriminant) * inv_2a, (-b + sqrt_discriminant) * inv_2a))
}
