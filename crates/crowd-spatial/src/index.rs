//! The `SpatialIndex` facade the engine owns and agents query through.
//!
//! Bundles the per-tick agent k-d tree, the static obstacle BSP, and the
//! navigation grid behind one handle.  The engine rebuilds the agent tree
//! at the top of every tick and the obstacle side once at preprocess;
//! agents only ever see the immutable query surface.

use crowd_core::geometry::{Point, Ray};
use crowd_core::{AgentId, AxisAlignedBox, CrowdError, CrowdResult, SegmentId};

use crate::bsp::ObstacleBsp;
use crate::grid::NavGrid;
use crate::kdtree::{AgentEntry, AgentKdTree};
use crate::neighbors::NeighborList;
use crate::obstacle::SegmentArena;
use crate::planner::{BestFirstSearchPlanner, GridDomain};

// ── Hits ──────────────────────────────────────────────────────────────────────

/// What a ray hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HitKind {
    Agent(AgentId),
    Obstacle(SegmentId),
}

/// First object hit by a traced ray, with the ray parameter.
#[derive(Copy, Clone, Debug)]
pub struct Hit {
    pub kind: HitKind,
    pub t: f32,
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

pub struct SpatialIndex {
    agent_tree: AgentKdTree,
    obstacles: ObstacleBsp,
    grid: NavGrid,
    planner: BestFirstSearchPlanner,
}

impl SpatialIndex {
    /// Index over empty space covering `bounds` with `cell_size` grid cells.
    pub fn new(bounds: AxisAlignedBox, cell_size: f32) -> Self {
        Self {
            agent_tree: AgentKdTree::new(),
            obstacles: ObstacleBsp::empty(),
            grid: NavGrid::new(bounds, cell_size),
            planner: BestFirstSearchPlanner::default(),
        }
    }

    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut NavGrid {
        &mut self.grid
    }

    pub fn obstacles(&self) -> &ObstacleBsp {
        &self.obstacles
    }

    pub fn agent_tree(&self) -> &AgentKdTree {
        &self.agent_tree
    }

    // ── Builds ────────────────────────────────────────────────────────────

    /// Build the obstacle BSP from an arena of polygon segments.  Called
    /// once at simulation preprocess; the tree is immutable afterwards.
    pub fn build_obstacle_tree(&mut self, arena: SegmentArena) {
        self.obstacles = ObstacleBsp::build(arena);
    }

    /// Rebuild the agent tree from the current enabled-agent set.  Called
    /// by the engine once per tick, before any agent update runs.
    pub fn build_agent_tree(&mut self, agents: impl IntoIterator<Item = AgentEntry>) {
        self.agent_tree.rebuild(agents);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Nearest agents to `position` within the list's range, excluding the
    /// querying agent.  `live_pos` resolves current positions.
    pub fn agent_neighbors<F>(
        &self,
        position: Point,
        exclude: AgentId,
        out: &mut NeighborList<AgentId>,
        live_pos: F,
    ) where
        F: Fn(AgentId) -> Option<Point>,
    {
        self.agent_tree.query_neighbors(position, exclude, out, live_pos);
    }

    /// Nearest visible obstacle segments to `position`.
    pub fn obstacle_neighbors(&self, position: Point, out: &mut NeighborList<SegmentId>) {
        self.obstacles.query_neighbors(position, out);
    }

    /// First object (agent disc or obstacle segment) hit by `ray`.
    pub fn trace<F>(&self, ray: &Ray, exclude: AgentId, live: F) -> Option<Hit>
    where
        F: Fn(AgentId) -> Option<(Point, f32)>,
    {
        let obstacle_hit = self
            .obstacles
            .trace(ray)
            .map(|(seg, t)| Hit { kind: HitKind::Obstacle(seg), t });
        let agent_hit = self
            .agent_tree
            .trace(ray, exclude, live)
            .map(|(id, t)| Hit { kind: HitKind::Agent(id), t });

        match (obstacle_hit, agent_hit) {
            (Some(o), Some(a)) => Some(if a.t < o.t { a } else { o }),
            (hit, None) | (None, hit) => hit,
        }
    }

    /// Mutual visibility of two points for an agent of radius `radius`,
    /// against obstacles only.
    pub fn visibility(&self, q1: Point, q2: Point, radius: f32) -> bool {
        self.obstacles.query_visibility(q1, q2, radius)
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Plan a coarse path of grid-cell centres from `from` to `to`.
    ///
    /// The returned path starts at the cell containing `from` and ends at
    /// the cell containing `to`.  Points outside the grid or an exhausted
    /// search are reported as [`CrowdError::PlanningFailure`]; callers fall
    /// back to straight-line steering.
    pub fn plan_path(&self, from: Point, to: Point) -> CrowdResult<Vec<Point>> {
        let start = self
            .grid
            .cell_index(from)
            .ok_or(CrowdError::PlanningFailure { from, to })?;
        let goal = self
            .grid
            .cell_index(to)
            .ok_or(CrowdError::PlanningFailure { from, to })?;

        let domain = GridDomain { grid: &self.grid };
        let cells = self
            .planner
            .plan(&domain, start, goal)
            .ok_or(CrowdError::PlanningFailure { from, to })?;

        Ok(cells.into_iter().map(|c| self.grid.cell_center(c)).collect())
    }

    /// A random position clear of blocked cells, for `Random` goals.
    pub fn random_position_without_collisions(
        &self,
        sample: impl FnMut(std::ops::Range<u32>) -> u32,
    ) -> Option<Point> {
        self.grid.random_position_without_collisions(sample, 256)
    }
}
