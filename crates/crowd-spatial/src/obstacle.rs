//! Obstacle segments and the flat arena that owns them.
//!
//! Obstacles are closed polygons of **directed edges**.  Each segment stores
//! its start vertex; its end vertex is the start of `next`.  The prev/next
//! links are cyclic and expressed as indices into one flat arena owned by
//! the spatial index — BSP nodes and neighbour lists hold [`SegmentId`]s,
//! never owning pointers, so the cyclic polygon rings need no special
//! lifetime handling; the whole arena lives and dies with one simulation.
//!
//! # Winding
//!
//! Polygons must be wound so their interior lies to the **left** of each
//! directed edge.  An agent standing outside the polygon then sits on the
//! right of the edges facing it, which is the visibility condition the
//! neighbour query tests with `left_of`.

use crowd_core::geometry::{left_of, AxisAlignedBox, Point, Vector};
use crowd_core::{CrowdError, CrowdResult, SegmentId};

// ── ObstacleSegment ───────────────────────────────────────────────────────────

/// One directed edge of an obstacle polygon.
#[derive(Clone, Debug)]
pub struct ObstacleSegment {
    /// Start vertex.  The end vertex is `arena.seg(next).point`.
    pub point: Point,
    /// Unit direction towards the next vertex.
    pub unit_dir: Vector,
    /// Previous edge in the polygon ring.
    pub prev: SegmentId,
    /// Next edge in the polygon ring.
    pub next: SegmentId,
    /// Whether the start vertex is convex: signed `left_of` on
    /// (prev vertex, this vertex, next vertex) is non-negative.
    pub convex: bool,
}

// ── SegmentArena ──────────────────────────────────────────────────────────────

/// Flat storage for all obstacle segments in a simulation, including the
/// synthetic segments the BSP build introduces when splitting straddlers.
#[derive(Default)]
pub struct SegmentArena {
    segments: Vec<ObstacleSegment>,
}

impl SegmentArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn seg(&self, id: SegmentId) -> &ObstacleSegment {
        &self.segments[id.index()]
    }

    #[inline]
    pub fn seg_mut(&mut self, id: SegmentId) -> &mut ObstacleSegment {
        &mut self.segments[id.index()]
    }

    /// Both endpoints of a segment: (start, end).
    #[inline]
    pub fn endpoints(&self, id: SegmentId) -> (Point, Point) {
        let seg = self.seg(id);
        (seg.point, self.seg(seg.next).point)
    }

    /// Iterator over all segment ids currently in the arena.
    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        (0..self.segments.len() as u32).map(SegmentId)
    }

    /// Add one closed polygon of at least two vertices, interior to the
    /// left of the winding.  Returns the ids of the new segments.
    ///
    /// Two vertices describe a degenerate "wall" obstacle; both of its
    /// directed edges are treated as convex, as the BSP expects.
    pub fn add_polygon(&mut self, vertices: &[Point]) -> CrowdResult<Vec<SegmentId>> {
        let n = vertices.len();
        if n < 2 {
            return Err(CrowdError::GeometryDegenerate("obstacle polygon needs >= 2 vertices"));
        }
        for i in 0..n {
            let next = vertices[(i + 1) % n];
            if (next - vertices[i]).flattened().length_squared() <= f32::EPSILON {
                return Err(CrowdError::GeometryDegenerate("zero-length obstacle edge"));
            }
        }

        let base = self.segments.len() as u32;
        let mut ids = Vec::with_capacity(n);
        for (i, &vertex) in vertices.iter().enumerate() {
            let prev_i = if i == 0 { n - 1 } else { i - 1 };
            let next_i = (i + 1) % n;
            let convex = if n == 2 {
                true
            } else {
                left_of(vertices[prev_i], vertices[i], vertices[next_i]) >= 0.0
            };
            let id = SegmentId(base + i as u32);
            self.segments.push(ObstacleSegment {
                point: vertex,
                unit_dir: (vertices[next_i] - vertex).normalized(),
                prev: SegmentId(base + prev_i as u32),
                next: SegmentId(base + next_i as u32),
                convex,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Add the horizontal footprint of an axis-aligned box.
    pub fn add_box(&mut self, bounds: &AxisAlignedBox) -> CrowdResult<Vec<SegmentId>> {
        self.add_polygon(&bounds.footprint_ccw())
    }

    /// Append a synthetic segment produced by a BSP split and re-link the
    /// ring around it: `prev → new → next`.
    ///
    /// Synthetic vertices are always convex (they lie on a straight edge)
    /// and inherit the split edge's direction.
    pub(crate) fn push_split(
        &mut self,
        point: Point,
        prev: SegmentId,
        next: SegmentId,
    ) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        let unit_dir = self.seg(prev).unit_dir;
        self.segments.push(ObstacleSegment { point, unit_dir, prev, next, convex: true });
        self.seg_mut(prev).next = id;
        self.seg_mut(next).prev = id;
        id
    }
}
