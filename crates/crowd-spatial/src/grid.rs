//! Navigation grid for coarse path planning.
//!
//! A uniform cell grid over the world's horizontal bounds.  Long-term and
//! mid-term planning run over cell indices; obstacles are rasterised into
//! blocked cells at preprocess.  Cell indices are row-major (`x` fastest).

use crowd_core::geometry::box_overlaps_circle_2d;
use crowd_core::{AxisAlignedBox, CellIndex, Point};

/// The grid.  `cell_size` is the edge length of one square cell in metres.
pub struct NavGrid {
    bounds: AxisAlignedBox,
    cells_x: u32,
    cells_z: u32,
    cell_size: f32,
    blocked: Vec<bool>,
}

impl NavGrid {
    /// Grid covering `bounds` with square cells of `cell_size` metres.
    ///
    /// The cell counts round up so the grid always covers the full bounds.
    pub fn new(bounds: AxisAlignedBox, cell_size: f32) -> Self {
        let cell_size = cell_size.max(0.01);
        let cells_x = (((bounds.xmax - bounds.xmin) / cell_size).ceil() as u32).max(1);
        let cells_z = (((bounds.zmax - bounds.zmin) / cell_size).ceil() as u32).max(1);
        Self {
            bounds,
            cells_x,
            cells_z,
            cell_size,
            blocked: vec![false; (cells_x * cells_z) as usize],
        }
    }

    pub fn bounds(&self) -> &AxisAlignedBox {
        &self.bounds
    }

    pub fn cell_count(&self) -> usize {
        self.blocked.len()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    // ── Index mapping ─────────────────────────────────────────────────────

    /// Cell containing `p`, or `None` when `p` is outside the grid bounds.
    pub fn cell_index(&self, p: Point) -> Option<CellIndex> {
        if !self.bounds.contains_xz(p) {
            return None;
        }
        let cx = (((p.x - self.bounds.xmin) / self.cell_size) as u32).min(self.cells_x - 1);
        let cz = (((p.z - self.bounds.zmin) / self.cell_size) as u32).min(self.cells_z - 1);
        Some(CellIndex(cz * self.cells_x + cx))
    }

    /// Centre point of a cell.
    pub fn cell_center(&self, cell: CellIndex) -> Point {
        let cx = cell.0 % self.cells_x;
        let cz = cell.0 / self.cells_x;
        Point::on_ground(
            self.bounds.xmin + (cx as f32 + 0.5) * self.cell_size,
            self.bounds.zmin + (cz as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    pub fn is_blocked(&self, cell: CellIndex) -> bool {
        self.blocked.get(cell.index()).copied().unwrap_or(true)
    }

    // ── Obstacle rasterisation ────────────────────────────────────────────

    /// Mark every cell whose centre disc (half a cell) overlaps the box.
    pub fn block_box(&mut self, b: &AxisAlignedBox) {
        let pad = 0.5 * self.cell_size;
        for cz in 0..self.cells_z {
            for cx in 0..self.cells_x {
                let cell = CellIndex(cz * self.cells_x + cx);
                let center = self.cell_center(cell);
                if box_overlaps_circle_2d(b.xmin, b.xmax, b.zmin, b.zmax, center, pad) {
                    self.blocked[cell.index()] = true;
                }
            }
        }
    }

    // ── Neighbourhood for the planner ─────────────────────────────────────

    /// Push the unblocked 8-connected neighbours of `cell` with step costs
    /// (1 orthogonal, √2 diagonal).
    pub fn successors(&self, cell: CellIndex, out: &mut Vec<(CellIndex, f32)>) {
        const DIAG: f32 = std::f32::consts::SQRT_2;
        let cx = (cell.0 % self.cells_x) as i64;
        let cz = (cell.0 / self.cells_x) as i64;
        for (dx, dz, cost) in [
            (-1i64, 0i64, 1.0),
            (1, 0, 1.0),
            (0, -1, 1.0),
            (0, 1, 1.0),
            (-1, -1, DIAG),
            (1, -1, DIAG),
            (-1, 1, DIAG),
            (1, 1, DIAG),
        ] {
            let nx = cx + dx;
            let nz = cz + dz;
            if nx < 0 || nz < 0 || nx >= self.cells_x as i64 || nz >= self.cells_z as i64 {
                continue;
            }
            let neighbor = CellIndex(nz as u32 * self.cells_x + nx as u32);
            if !self.blocked[neighbor.index()] {
                out.push((neighbor, cost));
            }
        }
    }

    /// Straight-line heuristic between cell centres, in cell units.
    pub fn heuristic(&self, from: CellIndex, to: CellIndex) -> f32 {
        let dx = (from.0 % self.cells_x) as f32 - (to.0 % self.cells_x) as f32;
        let dz = (from.0 / self.cells_x) as f32 - (to.0 / self.cells_x) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// A uniformly random unblocked position, or `None` when the grid is so
    /// congested that the attempt budget runs out.
    ///
    /// `sample` draws a uniform value from the given range; both the global
    /// `SimRng` and the per-agent `AgentRng` fit the shape.
    pub fn random_position_without_collisions(
        &self,
        mut sample: impl FnMut(std::ops::Range<u32>) -> u32,
        attempts: usize,
    ) -> Option<Point> {
        for _ in 0..attempts {
            let cell = CellIndex(sample(0..self.blocked.len() as u32));
            if !self.is_blocked(cell) {
                return Some(self.cell_center(cell));
            }
        }
        None
    }
}
