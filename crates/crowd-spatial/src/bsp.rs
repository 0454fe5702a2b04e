//! Binary space partition over obstacle edges.
//!
//! Built once during simulation preprocess and immutable afterwards.  Each
//! node stores one segment as the splitter; child subtrees hold the
//! segments wholly to its left / right.  Straddling segments are split at
//! the line–line intersection, producing synthetic segments that live in
//! the same arena as the originals and are re-linked into their polygon
//! ring, so every downstream query sees consistent prev/next chains.
//!
//! The splitter choice minimises `(max(left, right), min(left, right))`
//! lexicographically — the balance criterion matters more than the split
//! count because query depth dominates on large scenes.

use crowd_core::geometry::{
    det, dist_sq_point_segment, intersect_two_rays_2d, left_of, ray_segment_intersection,
    Point, Ray, GEOM_EPSILON,
};
use crowd_core::SegmentId;

use crate::neighbors::NeighborList;
use crate::obstacle::SegmentArena;

// ── Nodes ─────────────────────────────────────────────────────────────────────

struct BspNode {
    segment: SegmentId,
    left: Option<Box<BspNode>>,
    right: Option<Box<BspNode>>,
}

// ── ObstacleBsp ───────────────────────────────────────────────────────────────

/// The obstacle tree plus the segment arena it partitions (and owns).
#[derive(Default)]
pub struct ObstacleBsp {
    arena: SegmentArena,
    root: Option<Box<BspNode>>,
}

impl ObstacleBsp {
    /// An index over no obstacles; every query reports clear space.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Consume an arena of polygon segments and build the tree.
    pub fn build(mut arena: SegmentArena) -> Self {
        let ids: Vec<SegmentId> = arena.ids().collect();
        let root = build_recursive(&mut arena, ids);
        Self { arena, root }
    }

    /// The segment arena, including synthetic split segments.
    pub fn arena(&self) -> &SegmentArena {
        &self.arena
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Collect the obstacle segments nearest to `position` into `out`.
    ///
    /// Only segments the point lies strictly to the right of (i.e. whose
    /// front face it can see) are candidates.
    pub fn query_neighbors(&self, position: Point, out: &mut NeighborList<SegmentId>) {
        self.query_recursive(self.root.as_deref(), position, out);
    }

    fn query_recursive(
        &self,
        node: Option<&BspNode>,
        position: Point,
        out: &mut NeighborList<SegmentId>,
    ) {
        let Some(node) = node else { return };
        let (a, b) = self.arena.endpoints(node.segment);
        let agent_left = left_of(a, b, position);

        // Same side first.
        let (same, other) = if agent_left >= 0.0 {
            (node.left.as_deref(), node.right.as_deref())
        } else {
            (node.right.as_deref(), node.left.as_deref())
        };
        self.query_recursive(same, position, out);

        let len_sq = (b - a).flattened().length_squared().max(GEOM_EPSILON);
        let dist_sq_line = agent_left * agent_left / len_sq;
        if dist_sq_line < out.range_sq() {
            if agent_left < 0.0 {
                // Only usable when the agent is on the right (front) side.
                let dist_sq = dist_sq_point_segment(a, b, position);
                out.insert(dist_sq, node.segment);
            }
            self.query_recursive(other, position, out);
        }
    }

    /// First obstacle segment hit by `ray`, with the ray parameter.
    pub fn trace(&self, ray: &Ray) -> Option<(SegmentId, f32)> {
        let mut best = None;
        self.trace_recursive(self.root.as_deref(), ray, &mut best);
        best
    }

    fn trace_recursive(
        &self,
        node: Option<&BspNode>,
        ray: &Ray,
        best: &mut Option<(SegmentId, f32)>,
    ) {
        let Some(node) = node else { return };
        let (a, b) = self.arena.endpoints(node.segment);
        let side = left_of(a, b, ray.pos);

        let (near, far) = if side >= 0.0 {
            (node.left.as_deref(), node.right.as_deref())
        } else {
            (node.right.as_deref(), node.left.as_deref())
        };
        self.trace_recursive(near, ray, best);

        if let Some(t) = ray_segment_intersection(ray, a, b) {
            if best.is_none_or(|(_, bt)| t < bt) {
                *best = Some((node.segment, t));
            }
        }

        // Cross the splitter plane only when the ray reaches it before the
        // best hit found so far; parallel rays stay on their side.
        if let Some((t_line, _)) = intersect_two_rays_2d(ray.pos, ray.dir, a, b - a) {
            let t_max = best.map_or(ray.maxt, |(_, bt)| bt);
            if t_line >= ray.mint && t_line <= t_max {
                self.trace_recursive(far, ray, best);
            }
        }
    }

    /// Mutual visibility between two points for a disc of radius `radius`:
    /// true when the swept segment clears every obstacle edge.
    pub fn query_visibility(&self, q1: Point, q2: Point, radius: f32) -> bool {
        self.visibility_recursive(self.root.as_deref(), q1, q2, radius)
    }

    fn visibility_recursive(
        &self,
        node: Option<&BspNode>,
        q1: Point,
        q2: Point,
        radius: f32,
    ) -> bool {
        let Some(node) = node else { return true };
        let (a, b) = self.arena.endpoints(node.segment);

        let q1_left = left_of(a, b, q1);
        let q2_left = left_of(a, b, q2);
        let inv_len_sq = 1.0 / (b - a).flattened().length_squared().max(GEOM_EPSILON);
        let radius_sq = radius * radius;

        let left = node.left.as_deref();
        let right = node.right.as_deref();

        if q1_left >= 0.0 && q2_left >= 0.0 {
            self.visibility_recursive(left, q1, q2, radius)
                && ((q1_left * q1_left * inv_len_sq >= radius_sq
                    && q2_left * q2_left * inv_len_sq >= radius_sq)
                    || self.visibility_recursive(right, q1, q2, radius))
        } else if q1_left <= 0.0 && q2_left <= 0.0 {
            self.visibility_recursive(right, q1, q2, radius)
                && ((q1_left * q1_left * inv_len_sq >= radius_sq
                    && q2_left * q2_left * inv_len_sq >= radius_sq)
                    || self.visibility_recursive(left, q1, q2, radius))
        } else if q1_left >= 0.0 && q2_left <= 0.0 {
            // One can see through this splitter from left to right.
            self.visibility_recursive(left, q1, q2, radius)
                && self.visibility_recursive(right, q1, q2, radius)
        } else {
            let p1_left = left_of(q1, q2, a);
            let p2_left = left_of(q1, q2, b);
            let inv_len_q = 1.0 / (q2 - q1).flattened().length_squared().max(GEOM_EPSILON);
            p1_left * p2_left >= 0.0
                && p1_left * p1_left * inv_len_q > radius_sq
                && p2_left * p2_left * inv_len_q > radius_sq
                && self.visibility_recursive(left, q1, q2, radius)
                && self.visibility_recursive(right, q1, q2, radius)
        }
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

/// Lexicographic balance score of a candidate split: `(max, min)` of the
/// left/right counts.  Lower is better.
#[inline]
fn balance(left: usize, right: usize) -> (usize, usize) {
    (left.max(right), left.min(right))
}

/// Count how `j` falls relative to the oriented line of `i`'s segment.
#[inline]
fn classify(arena: &SegmentArena, i1: Point, i2: Point, j: SegmentId) -> (f32, f32) {
    let (j1, j2) = arena.endpoints(j);
    (left_of(i1, i2, j1), left_of(i1, i2, j2))
}

fn build_recursive(arena: &mut SegmentArena, segments: Vec<SegmentId>) -> Option<Box<BspNode>> {
    if segments.is_empty() {
        return None;
    }

    let optimal = choose_splitter(arena, &segments);
    let (i1, i2) = arena.endpoints(optimal);

    let mut left_segments = Vec::new();
    let mut right_segments = Vec::new();

    for &j in &segments {
        if j == optimal {
            continue;
        }
        let (j1_left, j2_left) = classify(arena, i1, i2, j);
        if j1_left >= -GEOM_EPSILON && j2_left >= -GEOM_EPSILON {
            left_segments.push(j);
        } else if j1_left <= GEOM_EPSILON && j2_left <= GEOM_EPSILON {
            right_segments.push(j);
        } else {
            // Straddler: split at the line-line intersection.  The two
            // halves inherit convexity from the split side (the new vertex
            // lies on a straight edge, hence convex).
            let (j1, j2) = arena.endpoints(j);
            let t = det(i2 - i1, j1 - i1) / det(i2 - i1, j1 - j2);
            let split_point = j1 + (j2 - j1) * t;
            let j_next = arena.seg(j).next;
            let new_id = arena.push_split(split_point, j, j_next);

            if j1_left > 0.0 {
                left_segments.push(j);
                right_segments.push(new_id);
            } else {
                right_segments.push(j);
                left_segments.push(new_id);
            }
        }
    }

    let left = build_recursive(arena, left_segments);
    let right = build_recursive(arena, right_segments);
    Some(Box::new(BspNode { segment: optimal, left, right }))
}

/// Exhaustive splitter scoring with early termination on candidates that
/// cannot beat the best so far.
#[cfg(not(feature = "parallel"))]
fn choose_splitter(arena: &SegmentArena, segments: &[SegmentId]) -> SegmentId {
    let mut optimal = segments[0];
    let mut best = (segments.len(), segments.len());

    for &i in segments {
        let (i1, i2) = arena.endpoints(i);
        let mut left_size = 0usize;
        let mut right_size = 0usize;

        for &j in segments {
            if i == j {
                continue;
            }
            let (j1_left, j2_left) = classify(arena, i1, i2, j);
            if j1_left >= -GEOM_EPSILON && j2_left >= -GEOM_EPSILON {
                left_size += 1;
            } else if j1_left <= GEOM_EPSILON && j2_left <= GEOM_EPSILON {
                right_size += 1;
            } else {
                left_size += 1;
                right_size += 1;
            }
            if balance(left_size, right_size) >= best {
                break;
            }
        }

        if balance(left_size, right_size) < best {
            best = balance(left_size, right_size);
            optimal = i;
        }
    }
    optimal
}

/// Rayon-scored variant: every candidate's full count is computed on the
/// pool, then the winner is the minimal `(score, index)` pair so the result
/// matches the sequential build bit for bit.
#[cfg(feature = "parallel")]
fn choose_splitter(arena: &SegmentArena, segments: &[SegmentId]) -> SegmentId {
    use rayon::prelude::*;

    segments
        .par_iter()
        .enumerate()
        .map(|(idx, &i)| {
            let (i1, i2) = arena.endpoints(i);
            let mut left_size = 0usize;
            let mut right_size = 0usize;
            for &j in segments {
                if i == j {
                    continue;
                }
                let (j1_left, j2_left) = classify(arena, i1, i2, j);
                if j1_left >= -GEOM_EPSILON && j2_left >= -GEOM_EPSILON {
                    left_size += 1;
                } else if j1_left <= GEOM_EPSILON && j2_left <= GEOM_EPSILON {
                    right_size += 1;
                } else {
                    left_size += 1;
                    right_size += 1;
                }
            }
            (balance(left_size, right_size), idx, i)
        })
        .min_by_key(|&(score, idx, _)| (score, idx))
        .map(|(_, _, id)| id)
        .unwrap_or(segments[0])
}
