//! Steering state, reactive situations, feelers, and the command the
//! reactive phase hands to locomotion.

use crowd_core::geometry::Vector;
use crowd_spatial::HitKind;

// ── SteeringState ─────────────────────────────────────────────────────────────

/// The agent's high-level steering mode, driven by the predictive phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SteeringState {
    /// Facing error too large: rotate towards the local target first.
    TurnTowardsTarget,
    /// An imminent predicted threat is being steered around.
    ProactivelyAvoid,
    /// Hold still until the predicted threat interval has passed.
    WaitUntilClear,
    /// Nothing predicted: ordinary goal steering.
    NoThreat,
    /// Follow the aggregate crowd direction.  The enabling transition is
    /// intentionally absent; the reactive dispatch keeps the arm so the
    /// state machine stays complete.
    CooperateWithCrowd,
}

// ── ReactiveSituation ─────────────────────────────────────────────────────────

/// What the feelers found this frame, condensed for dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReactiveSituation {
    /// Everything hit was already predictively avoided.
    NoThreats,
    OneAgent,
    TwoAgents,
    ThreeAgents,
    StaticOnly,
    StaticOneAgent,
    StaticTwoAgents,
    /// Should be unreachable; kept so logging can prove it stays that way.
    Unknown,
}

// ── FeelerInfo ────────────────────────────────────────────────────────────────

/// Results of the five reactive rays.  `t_*` is the ray parameter of the
/// first hit (infinity for a clear ray).
#[derive(Copy, Clone, Debug)]
pub struct FeelerInfo {
    pub object_front: Option<HitKind>,
    pub object_right: Option<HitKind>,
    pub object_left: Option<HitKind>,
    pub object_rside: Option<HitKind>,
    pub object_lside: Option<HitKind>,
    pub t_front: f32,
    pub t_right: f32,
    pub t_left: f32,
    pub t_rside: f32,
    pub t_lside: f32,
}

impl Default for FeelerInfo {
    fn default() -> Self {
        Self {
            object_front: None,
            object_right: None,
            object_left: None,
            object_rside: None,
            object_lside: None,
            t_front: f32::INFINITY,
            t_right: f32::INFINITY,
            t_left: f32::INFINITY,
            t_rside: f32::INFINITY,
            t_lside: f32::INFINITY,
        }
    }
}

impl FeelerInfo {
    pub fn hit_something(&self) -> bool {
        self.object_front.is_some() || self.object_right.is_some() || self.object_left.is_some()
    }
}

// ── SteeringCommand ───────────────────────────────────────────────────────────

/// The reactive phase's output: what locomotion should do this frame.
#[derive(Clone, Debug)]
pub struct SteeringCommand {
    /// Turn towards `target_direction` (true) or turn by the signed
    /// `turning_amount` relative to the current facing (false).
    pub aim_for_target_direction: bool,
    pub target_direction: Vector,
    /// Fraction of the capped turning rate to apply; signed when
    /// `aim_for_target_direction` is false (positive turns right).
    pub turning_amount: f32,
    /// Accelerate towards `target_speed` (true) or apply the raw
    /// `acceleration` fraction of max force (false).
    pub aim_for_target_speed: bool,
    pub target_speed: f32,
    /// Raw acceleration command in [-1, 1]; used when not aiming for a
    /// target speed.
    pub acceleration: f32,
    /// Side-to-side force fraction, positive towards the right side.
    pub scoot: f32,
}

impl Default for SteeringCommand {
    fn default() -> Self {
        Self {
            aim_for_target_direction: true,
            target_direction: Vector::ZERO,
            turning_amount: 0.0,
            aim_for_target_speed: true,
            target_speed: 0.0,
            acceleration: 1.0,
            scoot: 0.0,
        }
    }
}

impl SteeringCommand {
    /// Clearing between reactive runs avoids accidental reuse of the
    /// previous frame's decision.
    pub fn clear(&mut self) {
        *self = SteeringCommand::default();
    }
}
