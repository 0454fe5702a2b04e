//! Long-term, mid-term, and local-target plan maintenance.
//!
//! Three granularities, coarse to fine:
//!
//! 1. **Long-term**: an A* path from the agent to its current goal, thinned
//!    into waypoints every `waypoint_stride` path nodes.
//! 2. **Mid-term**: the full cell path, kept as a point deque the agent
//!    slides along between consecutive waypoints.
//! 3. **Local target**: the furthest mid-term point the agent can still see
//!    (three-ray clearance against the obstacle BSP); this is what the
//!    steering phases actually aim at.

use crowd_core::geometry::{Point, Ray};
use tracing::warn;

use crate::state::AgentBody;
use crate::world::WorldView;

impl AgentBody {
    // ── Line of sight ─────────────────────────────────────────────────────

    /// Can this agent's disc slide to `target` without clipping an
    /// obstacle?  Tests three rays: both shoulders and the point behind
    /// the agent, all against obstacles only.
    pub fn has_line_of_sight(&self, world: &WorldView<'_>, target: Point) -> bool {
        let right = self.forward.right_side_xz() * self.radius;
        let starts = [
            self.position + right,
            self.position - right,
            self.position - self.forward * self.radius,
        ];
        starts.iter().all(|&start| {
            let ray = Ray::with_unit_interval(start, target - start);
            world.trace_obstacles(&ray).is_none()
        })
    }

    // ── Long-term planning ────────────────────────────────────────────────

    /// Plan from the current position to `goal_location`, filling the
    /// mid-term path and the thinned waypoint list.
    ///
    /// `dont_plan` bypasses A* entirely and routes straight at the goal.
    /// A planning failure degrades to the same straight-line fallback with
    /// a warning — the agent keeps steering, it just stops being clever.
    pub fn run_long_term_planning(
        &mut self,
        world: &WorldView<'_>,
        goal_location: Point,
        dont_plan: bool,
        waypoint_stride: usize,
    ) {
        self.mid_term_path.clear();
        self.waypoints.clear();
        self.current_waypoint = 0;

        if !dont_plan {
            match world.spatial().plan_path(self.position, goal_location) {
                Ok(path) => {
                    // Skip the node the agent is standing on.
                    let stride = waypoint_stride.max(1);
                    for (i, &p) in path.iter().enumerate().skip(1) {
                        self.mid_term_path.push_back(p);
                        if i % stride == 0 {
                            self.waypoints.push(p);
                        }
                    }
                }
                Err(e) => {
                    warn!(agent = %self.id, error = %e, "long-term planning failed; steering straight to goal");
                }
            }
        }
        self.waypoints.push(goal_location);
        if self.mid_term_path.is_empty() {
            self.local_target = goal_location;
        }
    }

    // ── Mid-term maintenance ──────────────────────────────────────────────

    /// Slide the mid-term window forward after the current waypoint was
    /// reached: drop the consumed waypoint and the path points behind the
    /// next window.
    pub fn update_mid_term_path(&mut self, window: usize) {
        if self.mid_term_path.len() < window {
            return;
        }
        if !self.waypoints.is_empty() {
            self.waypoints.remove(0);
        }
        self.mid_term_path.drain(..window);
    }

    // ── Local target ──────────────────────────────────────────────────────

    /// Advance the local target to the furthest of the next `furthest`
    /// mid-term points the agent has line of sight to, then drop the path
    /// points it has clearly passed.
    pub fn update_local_target(&mut self, world: &WorldView<'_>, furthest: usize) {
        if self.mid_term_path.is_empty() {
            return;
        }
        let limit = furthest.min(self.mid_term_path.len());
        let mut visible_upto = 0usize;
        for i in 0..limit {
            let candidate = self.mid_term_path[i];
            if self.has_line_of_sight(world, candidate) {
                self.local_target = candidate;
                visible_upto = i + 1;
            } else {
                break;
            }
        }
        // Points well behind the visible frontier are done; keep a couple
        // so the closest-node scan stays stable on switchbacks.
        if visible_upto > 3 && self.mid_term_path.len() > 1 {
            self.mid_term_path.drain(..visible_upto - 2);
        }
    }
}
