//! ORCA half-plane construction.
//!
//! Obstacle lines are built first, in velocity space scaled by
//! `1/τ_obs`.  Every degenerate viewing case of a segment — collision with
//! a vertex or the segment itself, oblique views collapsing both legs onto
//! one vertex, non-convex vertices extending the cut-off line, legs
//! pointing into a neighbouring edge ("foreign" legs) — reduces to a
//! single constraint or to skipping the segment.  Agent lines follow, and
//! take responsibility for the give-way split: each agent moves by half
//! the minimal relative-velocity change `u`.

use crowd_core::geometry::{det, Point, Vector, GEOM_EPSILON};
use crowd_core::{AgentId, SegmentId};
use crowd_spatial::SegmentArena;

pub use crate::lp::Line;

// ── Obstacle lines ────────────────────────────────────────────────────────────

/// Append one ORCA line per (non-covered, non-degenerate) obstacle
/// neighbour.  `neighbors` is the sorted `(dist_sq, segment)` list.
#[allow(clippy::too_many_arguments)]
pub fn build_obstacle_lines(
    position: Point,
    velocity: Vector,
    radius: f32,
    inv_time_horizon_obst: f32,
    arena: &SegmentArena,
    neighbors: &[(f32, SegmentId)],
    lines: &mut Vec<Line>,
) {
    let radius_sq = radius * radius;

    for &(_, seg) in neighbors {
        let mut obstacle1 = seg;
        let mut obstacle2 = arena.seg(obstacle1).next;

        let relative_position1 = (arena.seg(obstacle1).point - position).flattened();
        let relative_position2 = (arena.seg(obstacle2).point - position).flattened();

        // Already covered by a previously built obstacle line?
        let already_covered = lines.iter().any(|line| {
            det(
                relative_position1 * inv_time_horizon_obst - line.point,
                line.direction,
            ) - inv_time_horizon_obst * radius
                >= -GEOM_EPSILON
                && det(
                    relative_position2 * inv_time_horizon_obst - line.point,
                    line.direction,
                ) - inv_time_horizon_obst * radius
                    >= -GEOM_EPSILON
        });
        if already_covered {
            continue;
        }

        let dist_sq1 = relative_position1.length_squared();
        let dist_sq2 = relative_position2.length_squared();

        let obstacle_vector =
            (arena.seg(obstacle2).point - arena.seg(obstacle1).point).flattened();
        let s = (-relative_position1).dot(obstacle_vector) / obstacle_vector.length_squared();
        let dist_sq_line = (-relative_position1 - obstacle_vector * s).length_squared();

        // ── Collision cases ───────────────────────────────────────────────
        if s < 0.0 && dist_sq1 <= radius_sq {
            // Collision with the left vertex.  Ignore if non-convex.
            if arena.seg(obstacle1).convex {
                lines.push(Line {
                    point: Vector::ZERO,
                    direction: Vector::new(-relative_position1.z, 0.0, relative_position1.x)
                        .normalized(),
                });
            }
            continue;
        } else if s > 1.0 && dist_sq2 <= radius_sq {
            // Collision with the right vertex.  Ignore if non-convex or if
            // the neighbouring edge will take care of it.
            if arena.seg(obstacle2).convex
                && det(relative_position2, arena.seg(obstacle2).unit_dir) >= 0.0
            {
                lines.push(Line {
                    point: Vector::ZERO,
                    direction: Vector::new(-relative_position2.z, 0.0, relative_position2.x)
                        .normalized(),
                });
            }
            continue;
        } else if (0.0..1.0).contains(&s) && dist_sq_line <= radius_sq {
            // Collision with the segment itself.
            lines.push(Line {
                point: Vector::ZERO,
                direction: -arena.seg(obstacle1).unit_dir,
            });
            continue;
        }

        // ── No collision: compute the legs ────────────────────────────────
        //
        // Under an oblique view both legs can come from a single vertex;
        // non-convex vertices extend the cut-off line instead of a leg.
        let mut left_leg_direction;
        let mut right_leg_direction;

        if s < 0.0 && dist_sq_line <= radius_sq {
            // Obliquely viewed so the left vertex defines the velocity
            // obstacle alone.
            if !arena.seg(obstacle1).convex {
                continue;
            }
            obstacle2 = obstacle1;
            let leg1 = (dist_sq1 - radius_sq).sqrt();
            left_leg_direction = Vector::new(
                relative_position1.x * leg1 - relative_position1.z * radius,
                0.0,
                relative_position1.x * radius + relative_position1.z * leg1,
            ) / dist_sq1;
            right_leg_direction = Vector::new(
                relative_position1.x * leg1 + relative_position1.z * radius,
                0.0,
                -relative_position1.x * radius + relative_position1.z * leg1,
            ) / dist_sq1;
        } else if s > 1.0 && dist_sq_line <= radius_sq {
            // Obliquely viewed so the right vertex defines it alone.
            if !arena.seg(obstacle2).convex {
                continue;
            }
            obstacle1 = obstacle2;
            let leg2 = (dist_sq2 - radius_sq).sqrt();
            left_leg_direction = Vector::new(
                relative_position2.x * leg2 - relative_position2.z * radius,
                0.0,
                relative_position2.x * radius + relative_position2.z * leg2,
            ) / dist_sq2;
            right_leg_direction = Vector::new(
                relative_position2.x * leg2 + relative_position2.z * radius,
                0.0,
                -relative_position2.x * radius + relative_position2.z * leg2,
            ) / dist_sq2;
        } else {
            // The usual situation.
            if arena.seg(obstacle1).convex {
                let leg1 = (dist_sq1 - radius_sq).sqrt();
                left_leg_direction = Vector::new(
                    relative_position1.x * leg1 - relative_position1.z * radius,
                    0.0,
                    relative_position1.x * radius + relative_position1.z * leg1,
                ) / dist_sq1;
            } else {
                // Left vertex non-convex: the left leg extends the cut-off
                // line.
                left_leg_direction = -arena.seg(obstacle1).unit_dir;
            }
            if arena.seg(obstacle2).convex {
                let leg2 = (dist_sq2 - radius_sq).sqrt();
                right_leg_direction = Vector::new(
                    relative_position2.x * leg2 + relative_position2.z * radius,
                    0.0,
                    -relative_position2.x * radius + relative_position2.z * leg2,
                ) / dist_sq2;
            } else {
                right_leg_direction = arena.seg(obstacle1).unit_dir;
            }
        }

        // Legs can never point into a neighbouring edge at a convex
        // vertex; take the neighbour's cut-off line instead, and add no
        // constraint if the velocity projects onto such a foreign leg.
        let left_neighbor = arena.seg(obstacle1).prev;
        let mut is_left_leg_foreign = false;
        let mut is_right_leg_foreign = false;

        if arena.seg(obstacle1).convex
            && det(left_leg_direction, -arena.seg(left_neighbor).unit_dir) >= 0.0
        {
            left_leg_direction = -arena.seg(left_neighbor).unit_dir;
            is_left_leg_foreign = true;
        }
        if arena.seg(obstacle2).convex
            && det(right_leg_direction, arena.seg(obstacle2).unit_dir) <= 0.0
        {
            right_leg_direction = arena.seg(obstacle2).unit_dir;
            is_right_leg_foreign = true;
        }

        // Cut-off centres.
        let left_cutoff =
            (arena.seg(obstacle1).point - position).flattened() * inv_time_horizon_obst;
        let right_cutoff =
            (arena.seg(obstacle2).point - position).flattened() * inv_time_horizon_obst;
        let cutoff_vec = right_cutoff - left_cutoff;
        let same_vertex = obstacle1 == obstacle2;

        // Project the current velocity onto the velocity obstacle.
        let t = if same_vertex {
            0.5
        } else {
            (velocity - left_cutoff).dot(cutoff_vec) / cutoff_vec.length_squared()
        };
        let t_left = (velocity - left_cutoff).dot(left_leg_direction);
        let t_right = (velocity - right_cutoff).dot(right_leg_direction);

        if (t < 0.0 && t_left < 0.0) || (same_vertex && t_left < 0.0 && t_right < 0.0) {
            // Project onto the left cut-off circle.
            let unit_w = (velocity - left_cutoff).normalized();
            lines.push(Line {
                direction: Vector::new(unit_w.z, 0.0, -unit_w.x),
                point: left_cutoff + unit_w * (radius * inv_time_horizon_obst),
            });
            continue;
        } else if t > 1.0 && t_right < 0.0 {
            // Project onto the right cut-off circle.
            let unit_w = (velocity - right_cutoff).normalized();
            lines.push(Line {
                direction: Vector::new(unit_w.z, 0.0, -unit_w.x),
                point: right_cutoff + unit_w * (radius * inv_time_horizon_obst),
            });
            continue;
        }

        // Project onto the left leg, the right leg, or the cut-off line —
        // whichever is closest to the current velocity.
        let dist_sq_cutoff = if !(0.0..=1.0).contains(&t) || same_vertex {
            f32::INFINITY
        } else {
            (velocity - (left_cutoff + cutoff_vec * t)).length_squared()
        };
        let dist_sq_left = if t_left < 0.0 {
            f32::INFINITY
        } else {
            (velocity - (left_cutoff + left_leg_direction * t_left)).length_squared()
        };
        let dist_sq_right = if t_right < 0.0 {
            f32::INFINITY
        } else {
            (velocity - (right_cutoff + right_leg_direction * t_right)).length_squared()
        };

        if dist_sq_cutoff <= dist_sq_left && dist_sq_cutoff <= dist_sq_right {
            let direction = -arena.seg(obstacle1).unit_dir;
            lines.push(Line {
                direction,
                point: left_cutoff
                    + Vector::new(-direction.z, 0.0, direction.x)
                        * (radius * inv_time_horizon_obst),
            });
        } else if dist_sq_left <= dist_sq_right {
            if is_left_leg_foreign {
                continue;
            }
            let direction = left_leg_direction;
            lines.push(Line {
                direction,
                point: left_cutoff
                    + Vector::new(-direction.z, 0.0, direction.x)
                        * (radius * inv_time_horizon_obst),
            });
        } else {
            if is_right_leg_foreign {
                continue;
            }
            let direction = -right_leg_direction;
            lines.push(Line {
                direction,
                point: right_cutoff
                    + Vector::new(-direction.z, 0.0, direction.x)
                        * (radius * inv_time_horizon_obst),
            });
        }
    }
}

// ── Agent lines ───────────────────────────────────────────────────────────────

/// Append one ORCA line per agent neighbour.
///
/// Outside collision the minimal change `u` projects `v_rel − p_rel/τ`
/// onto the cut-off circle or a leg; already-colliding pairs project with
/// `1/dt` instead so they separate within one step.  Each line's point is
/// `v + u/2`: both agents take half the correction.
#[allow(clippy::too_many_arguments)]
pub fn build_agent_lines<F>(
    position: Point,
    velocity: Vector,
    radius: f32,
    inv_time_horizon: f32,
    inv_time_step: f32,
    neighbors: &[(f32, AgentId)],
    lookup: F,
    lines: &mut Vec<Line>,
) where
    F: Fn(AgentId) -> Option<(Point, Vector, f32)>,
{
    for &(_, other_id) in neighbors {
        let Some((other_position, other_velocity, other_radius)) = lookup(other_id) else {
            continue;
        };

        let relative_position = (other_position - position).flattened();
        let relative_velocity = velocity - other_velocity;
        let dist_sq = relative_position.length_squared();
        let combined_radius = radius + other_radius;
        let combined_radius_sq = combined_radius * combined_radius;

        let direction;
        let u;

        if dist_sq > combined_radius_sq {
            // No collision: w is from the cut-off centre to the relative
            // velocity.
            let w = relative_velocity - relative_position * inv_time_horizon;
            let w_length_sq = w.length_squared();
            let dot_product1 = w.dot(relative_position);

            if dot_product1 < 0.0 && dot_product1 * dot_product1 > combined_radius_sq * w_length_sq
            {
                // Project onto the cut-off circle.
                let w_length = w_length_sq.sqrt();
                let unit_w = w / w_length;
                direction = Vector::new(unit_w.z, 0.0, -unit_w.x);
                u = unit_w * (combined_radius * inv_time_horizon - w_length);
            } else {
                // Project onto a leg.
                let leg = (dist_sq - combined_radius_sq).sqrt();
                direction = if det(relative_position, w) > 0.0 {
                    Vector::new(
                        relative_position.x * leg - relative_position.z * combined_radius,
                        0.0,
                        relative_position.x * combined_radius + relative_position.z * leg,
                    ) / dist_sq
                } else {
                    -(Vector::new(
                        relative_position.x * leg + relative_position.z * combined_radius,
                        0.0,
                        -relative_position.x * combined_radius + relative_position.z * leg,
                    ) / dist_sq)
                };
                let dot_product2 = relative_velocity.dot(direction);
                u = direction * dot_product2 - relative_velocity;
            }
        } else {
            // Already colliding: project onto the cut-off circle of one
            // time step.
            let w = relative_velocity - relative_position * inv_time_step;
            let w_length = w.length();
            let unit_w = w / w_length;
            direction = Vector::new(unit_w.z, 0.0, -unit_w.x);
            u = unit_w * (combined_radius * inv_time_step - w_length);
        }

        lines.push(Line { point: velocity + u * 0.5, direction });
    }
}
