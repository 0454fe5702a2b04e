//! Two-dimensional linear programming over half-plane constraints.
//!
//! An ORCA [`Line`] is a directed line in velocity space; the permitted
//! half-plane lies to its *left*.  The solver runs in up to three stages:
//!
//! 1. [`linear_program_1`] — optimise along one line, clipped by the
//!    max-speed disk and all earlier half-planes;
//! 2. [`linear_program_2`] — incremental insertion: fix violations by
//!    sliding along the violated line;
//! 3. [`linear_program_3`] — when stage 2 fails on an agent line, relax
//!    the *agent* constraints (never the obstacle ones) by optimising the
//!    signed violation via pairwise bisector lines.

use crowd_core::geometry::{det, Vector, GEOM_EPSILON};

/// A half-plane constraint in velocity space: permitted velocities `v`
/// satisfy `det(direction, point − v) ≤ 0` (left of the directed line).
#[derive(Copy, Clone, Debug)]
pub struct Line {
    pub point: Vector,
    pub direction: Vector,
}

/// Optimise along line `line_no`, subject to the disk of radius `radius`
/// and every line before `line_no`.
///
/// `direction_opt` switches between "maximise along `opt_velocity`
/// direction" (stage-3 mode, `opt_velocity` is unit length) and "closest
/// point to `opt_velocity`".  Returns `false` when the feasible segment on
/// the line is empty; `result` is untouched in that case.
pub fn linear_program_1(
    lines: &[Line],
    line_no: usize,
    radius: f32,
    opt_velocity: Vector,
    direction_opt: bool,
    result: &mut Vector,
) -> bool {
    let dot_product = lines[line_no].point.dot(lines[line_no].direction);
    let discriminant =
        dot_product * dot_product + radius * radius - lines[line_no].point.length_squared();

    if discriminant < 0.0 {
        // The max-speed circle fully invalidates this line.
        return false;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let mut t_left = -dot_product - sqrt_discriminant;
    let mut t_right = -dot_product + sqrt_discriminant;

    for i in 0..line_no {
        let denominator = det(lines[line_no].direction, lines[i].direction);
        let numerator = det(
            lines[i].direction,
            lines[line_no].point - lines[i].point,
        );

        if denominator.abs() <= GEOM_EPSILON {
            // Lines line_no and i are (almost) parallel.
            if numerator < 0.0 {
                return false;
            }
            continue;
        }

        let t = numerator / denominator;
        if denominator >= 0.0 {
            // Line i bounds line_no on the right.
            t_right = t_right.min(t);
        } else {
            // Line i bounds line_no on the left.
            t_left = t_left.max(t);
        }
        if t_left > t_right {
            return false;
        }
    }

    if direction_opt {
        // Optimise direction: take the extreme point.
        if opt_velocity.dot(lines[line_no].direction) > 0.0 {
            *result = lines[line_no].point + lines[line_no].direction * t_right;
        } else {
            *result = lines[line_no].point + lines[line_no].direction * t_left;
        }
    } else {
        // Optimise closest point on the feasible segment.
        let t = lines[line_no]
            .direction
            .dot(opt_velocity - lines[line_no].point);
        let t = t.clamp(t_left, t_right);
        *result = lines[line_no].point + lines[line_no].direction * t;
    }
    true
}

/// Incremental half-plane insertion over the max-speed disk.
///
/// Returns `lines.len()` on success, or the index of the first line whose
/// feasible region is empty; `result` then holds the best velocity found
/// before the failure.
pub fn linear_program_2(
    lines: &[Line],
    radius: f32,
    opt_velocity: Vector,
    direction_opt: bool,
    result: &mut Vector,
) -> usize {
    if direction_opt {
        // opt_velocity is unit length in this mode.
        *result = opt_velocity * radius;
    } else if opt_velocity.length_squared() > radius * radius {
        *result = opt_velocity.normalized() * radius;
    } else {
        *result = opt_velocity;
    }

    for i in 0..lines.len() {
        if det(lines[i].direction, lines[i].point - *result) > 0.0 {
            // The current result violates constraint i.
            let temp_result = *result;
            if !linear_program_1(lines, i, radius, opt_velocity, direction_opt, result) {
                *result = temp_result;
                return i;
            }
        }
    }
    lines.len()
}

/// Relax the agent constraints after a stage-2 failure at `begin_line`.
///
/// Obstacle lines (`..num_obst_lines`) are hard and carried into every
/// sub-program unchanged; for each failing agent line the program
/// minimises the worst violation by optimising along the failing line's
/// left perpendicular over the bisectors of every agent-line pair.
pub fn linear_program_3(
    lines: &[Line],
    num_obst_lines: usize,
    begin_line: usize,
    radius: f32,
    result: &mut Vector,
) {
    let mut distance = 0.0f32;

    for i in begin_line..lines.len() {
        if det(lines[i].direction, lines[i].point - *result) <= distance {
            continue;
        }
        // Result does not satisfy constraint i: rebuild from the hard
        // obstacle lines plus agent-pair bisectors.
        let mut proj_lines: Vec<Line> = lines[..num_obst_lines].to_vec();

        for j in num_obst_lines..i {
            let determinant = det(lines[i].direction, lines[j].direction);
            let point = if determinant.abs() <= GEOM_EPSILON {
                if lines[i].direction.dot(lines[j].direction) > 0.0 {
                    // Parallel, same direction: j adds nothing over i.
                    continue;
                }
                // Parallel, opposite directions: split the difference.
                (lines[i].point + lines[j].point) * 0.5
            } else {
                lines[i].point
                    + lines[i].direction
                        * (det(lines[j].direction, lines[i].point - lines[j].point)
                            / determinant)
            };
            let direction = (lines[j].direction - lines[i].direction).normalized();
            proj_lines.push(Line { point, direction });
        }

        let temp_result = *result;
        let left_perpendicular =
            Vector::new(-lines[i].direction.z, 0.0, lines[i].direction.x);
        if linear_program_2(&proj_lines, radius, left_perpendicular, true, result)
            < proj_lines.len()
        {
            // Should not happen: the result is by definition feasible for
            // this program.  Small floating-point error; keep the old one.
            *result = temp_result;
        }
        distance = det(lines[i].direction, lines[i].point - *result);
    }
}
