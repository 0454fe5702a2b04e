//! Agent goals and initial conditions.

use crate::geometry::{box_overlaps_circle_2d, AxisAlignedBox, Point, Vector};

// ── GoalKind ──────────────────────────────────────────────────────────────────

/// The kinds of goal an agent can pursue.
///
/// Agent modules declare which kinds they support; handing an agent an
/// unsupported kind raises `CrowdError::UnsupportedGoalType` and disables
/// that agent without stopping the simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GoalKind {
    /// Steer to a fixed target point.
    SeekStaticTarget,
    /// Reach anywhere inside an axis-aligned box region.
    BoxRegion,
    /// Target is drawn at random from the walkable world when the goal
    /// becomes current.
    Random,
}

// ── AgentGoal ─────────────────────────────────────────────────────────────────

/// One entry in an agent's FIFO goal queue.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentGoal {
    pub kind: GoalKind,
    /// Target point.  For `BoxRegion` goals this is the region centre (used
    /// for steering); for `Random` goals it is filled in when the goal is
    /// activated.
    pub target: Point,
    /// Target region for `BoxRegion` goals.
    pub region: Option<AxisAlignedBox>,
    /// Speed the agent would like to travel at while pursuing this goal.
    pub desired_speed: f32,
}

impl AgentGoal {
    /// A seek-static-target goal at `target`.
    pub fn seek(target: Point, desired_speed: f32) -> Self {
        Self { kind: GoalKind::SeekStaticTarget, target, region: None, desired_speed }
    }

    /// A box-region goal; the steering target is the region centre.
    pub fn region(region: AxisAlignedBox, desired_speed: f32) -> Self {
        Self {
            kind: GoalKind::BoxRegion,
            target: region.center(),
            region: Some(region),
            desired_speed,
        }
    }

    /// A random goal; the target is assigned when the goal becomes current.
    pub fn random(desired_speed: f32) -> Self {
        Self { kind: GoalKind::Random, target: Point::ORIGIN, region: None, desired_speed }
    }

    /// Goal-reached test: within `threshold` of the target, or (for box
    /// goals) the agent disc overlapping the region.
    pub fn is_reached(&self, position: Point, radius: f32, threshold: f32) -> bool {
        if (self.target - position).flattened().length_squared() <= threshold * threshold {
            return true;
        }
        match (self.kind, self.region) {
            (GoalKind::BoxRegion, Some(r)) => {
                box_overlaps_circle_2d(r.xmin, r.xmax, r.zmin, r.zmax, position, radius)
            }
            _ => false,
        }
    }
}

// ── AgentInitialConditions ────────────────────────────────────────────────────

/// Everything needed to place one agent into the world.
///
/// Produced by the scenario feeder, agent emitters, and the replay module;
/// consumed by `SteeringAgent::reset`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentInitialConditions {
    pub position: Point,
    /// Initial facing.  Normalised by `reset`; must be non-zero.
    pub direction: Vector,
    pub radius: f32,
    /// Initial speed along `direction`.
    pub speed: f32,
    /// Goal queue, front first.  Must be non-empty for steering agents.
    pub goals: Vec<AgentGoal>,
}

impl AgentInitialConditions {
    /// Conditions for an agent at rest, facing `direction`, with one goal.
    pub fn at(position: Point, direction: Vector, radius: f32, goal: AgentGoal) -> Self {
        Self { position, direction, radius, speed: 0.0, goals: vec![goal] }
    }
}
