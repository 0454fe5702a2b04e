//! The read-only context an agent sees during its update.
//!
//! The engine owns the spatial index and a dense array of per-agent
//! kinematic summaries.  After each agent finishes its `update_ai`, the
//! engine writes that agent's new summary back into the array — so an agent
//! updated later in the tick observes the *current* positions of agents
//! updated earlier, while the k-d tree's structure remains the snapshot
//! taken at the top of the tick.  That is exactly the sequential,
//! race-free schedule the replay format depends on.

use crowd_core::geometry::{Point, Ray, Vector};
use crowd_core::AgentId;
use crowd_spatial::{Hit, NeighborList, SpatialIndex};

// ── AgentSummary ──────────────────────────────────────────────────────────────

/// The publicly readable state of one agent, mirrored by the engine.
#[derive(Copy, Clone, Debug)]
pub struct AgentSummary {
    pub id: AgentId,
    pub enabled: bool,
    pub position: Point,
    pub forward: Vector,
    pub velocity: Vector,
    pub radius: f32,
    /// Target of the agent's current goal; used by threat prediction to
    /// test whether two planned paths actually cross.
    pub goal_target: Point,
}

impl AgentSummary {
    /// Placeholder for a slot whose agent is disabled or destroyed.
    pub fn disabled(id: AgentId) -> Self {
        Self {
            id,
            enabled: false,
            position: Point::ORIGIN,
            forward: Vector::ZERO,
            velocity: Vector::ZERO,
            radius: 0.0,
            goal_target: Point::ORIGIN,
        }
    }
}

// ── WorldView ─────────────────────────────────────────────────────────────────

/// Per-tick read access to the spatial index and the live agent summaries.
pub struct WorldView<'a> {
    spatial: &'a SpatialIndex,
    /// Indexed by `AgentId`.
    summaries: &'a [AgentSummary],
}

impl<'a> WorldView<'a> {
    pub fn new(spatial: &'a SpatialIndex, summaries: &'a [AgentSummary]) -> Self {
        Self { spatial, summaries }
    }

    pub fn spatial(&self) -> &SpatialIndex {
        self.spatial
    }

    /// The live summary of an enabled agent, or `None` for unknown ids and
    /// agents disabled earlier this tick.
    pub fn agent(&self, id: AgentId) -> Option<&AgentSummary> {
        self.summaries
            .get(id.index())
            .filter(|s| s.enabled)
    }

    // ── Query helpers (live-position closures pre-wired) ──────────────────

    /// Nearest enabled agents to `position`, excluding the querying agent.
    pub fn agent_neighbors(
        &self,
        position: Point,
        exclude: AgentId,
        out: &mut NeighborList<AgentId>,
    ) {
        self.spatial
            .agent_neighbors(position, exclude, out, |id| {
                self.agent(id).map(|s| s.position)
            });
    }

    /// Nearest visible obstacle segments to `position`.
    pub fn obstacle_neighbors(
        &self,
        position: Point,
        out: &mut NeighborList<crowd_core::SegmentId>,
    ) {
        self.spatial.obstacle_neighbors(position, out);
    }

    /// First object hit by `ray` — agent discs and obstacle segments.
    pub fn trace(&self, ray: &Ray, exclude: AgentId) -> Option<Hit> {
        self.spatial.trace(ray, exclude, |id| {
            self.agent(id).map(|s| (s.position, s.radius))
        })
    }

    /// First obstacle segment hit by `ray`, ignoring agents.
    pub fn trace_obstacles(&self, ray: &Ray) -> Option<(crowd_core::SegmentId, f32)> {
        self.spatial.obstacles().trace(ray)
    }

    /// Obstacle-clearance visibility between two points for radius `r`.
    pub fn visibility(&self, q1: Point, q2: Point, r: f32) -> bool {
        self.spatial.visibility(q1, q2, r)
    }
}
