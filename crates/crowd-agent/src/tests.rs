//! Unit tests for crowd-agent.

#[cfg(test)]
mod helpers {
    use crowd_core::{AxisAlignedBox, Point};
    use crowd_spatial::{SegmentArena, SpatialIndex};

    use crate::world::{AgentSummary, WorldView};

    /// Empty 40×40 world, no obstacles.
    pub fn open_index() -> SpatialIndex {
        SpatialIndex::new(AxisAlignedBox::flat(-20.0, 20.0, -20.0, 20.0), 1.0)
    }

    /// World with the unit box obstacle at the origin.
    pub fn boxed_index() -> SpatialIndex {
        let mut index = open_index();
        let bounds = AxisAlignedBox::flat(-1.0, 1.0, -1.0, 1.0);
        let mut arena = SegmentArena::new();
        arena.add_box(&bounds).unwrap();
        index.build_obstacle_tree(arena);
        index.grid_mut().block_box(&bounds);
        index
    }

    pub fn view<'a>(
        index: &'a SpatialIndex,
        summaries: &'a [AgentSummary],
    ) -> WorldView<'a> {
        WorldView::new(index, summaries)
    }

    pub fn p(x: f32, z: f32) -> Point {
        Point::on_ground(x, z)
    }
}

// ── AgentBody ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod body {
    use crowd_core::geometry::Vector;
    use crowd_core::{
        AgentGoal, AgentId, AgentInitialConditions, CrowdError, GoalKind,
    };

    use super::helpers::{open_index, p, view};
    use crate::state::AgentBody;

    fn conditions() -> AgentInitialConditions {
        AgentInitialConditions {
            position: p(0.0, 0.0),
            direction: Vector::new(1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 1.0,
            goals: vec![AgentGoal::seek(p(10.0, 0.0), 1.33)],
        }
    }

    #[test]
    fn reset_normalises_forward_and_scales_velocity() {
        let mut body = AgentBody::new(AgentId(0), 1);
        let mut init = conditions();
        init.direction = Vector::new(3.0, 0.0, 0.0);
        init.speed = 2.0;
        body.reset_kinematics(&init).unwrap();
        assert!((body.forward.length() - 1.0).abs() < 1e-5);
        assert!((body.velocity.length() - 2.0).abs() < 1e-5);
        assert!(body.enabled);
    }

    #[test]
    fn reset_rejects_zero_direction_and_radius() {
        let mut body = AgentBody::new(AgentId(0), 1);
        let mut init = conditions();
        init.direction = Vector::ZERO;
        assert!(matches!(
            body.reset_kinematics(&init),
            Err(CrowdError::GeometryDegenerate(_))
        ));
        let mut init = conditions();
        init.radius = 0.0;
        assert!(matches!(body.reset_kinematics(&init), Err(CrowdError::Config(_))));
    }

    #[test]
    fn unsupported_goal_kind_is_rejected() {
        let mut body = AgentBody::new(AgentId(3), 1);
        let err = body
            .push_goal(AgentGoal::random(1.0), &[GoalKind::SeekStaticTarget])
            .unwrap_err();
        match err {
            CrowdError::UnsupportedGoalType { agent, goal } => {
                assert_eq!(agent, AgentId(3));
                assert_eq!(goal, GoalKind::Random);
            }
            other => panic!("wrong error: {other}"),
        }
    }

    #[test]
    fn goal_queue_is_fifo_and_exhausts() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = AgentBody::new(AgentId(0), 1);
        let kinds = [GoalKind::SeekStaticTarget];
        body.push_goal(AgentGoal::seek(p(1.0, 0.0), 1.0), &kinds).unwrap();
        body.push_goal(AgentGoal::seek(p(2.0, 0.0), 1.0), &kinds).unwrap();

        assert_eq!(body.current_goal().unwrap().target, p(1.0, 0.0));
        assert!(body.advance_goal(&world));
        assert_eq!(body.current_goal().unwrap().target, p(2.0, 0.0));
        assert!(!body.advance_goal(&world));
        assert!(body.current_goal().is_none());
    }

    #[test]
    fn phase_outcome_classifies_plan_progress() {
        use crate::traits::PhaseOutcome;

        let mut body = AgentBody::new(AgentId(0), 1);
        body.position = p(0.0, 0.0);
        body.radius = 0.5;
        let kinds = [GoalKind::SeekStaticTarget];
        body.push_goal(AgentGoal::seek(p(10.0, 0.0), 1.0), &kinds).unwrap();

        // Far from everything: keep going.
        assert_eq!(body.phase_outcome(0.5), PhaseOutcome::Continue);

        // At a waypoint but not the goal: advance the waypoint.
        body.waypoints = vec![p(0.1, 0.0), p(10.0, 0.0)];
        assert_eq!(body.phase_outcome(0.5), PhaseOutcome::AdvanceWaypoint);

        // At the goal with more goals queued: advance the goal.
        body.push_goal(AgentGoal::seek(p(-10.0, 0.0), 1.0), &kinds).unwrap();
        body.position = p(10.0, 0.0);
        assert_eq!(body.phase_outcome(0.5), PhaseOutcome::AdvanceGoal);

        // At the last goal: leave the simulation.
        body.goals.pop_back();
        assert_eq!(body.phase_outcome(0.5), PhaseOutcome::Disable);
    }

    #[test]
    fn random_goal_target_is_assigned_on_activation() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = AgentBody::new(AgentId(0), 99);
        body.push_goal(AgentGoal::random(1.0), &[GoalKind::Random]).unwrap();
        body.activate_current_goal(&world);
        let target = body.current_goal().unwrap().target;
        // Drawn from the grid, so it must be inside the bounds.
        assert!(index.grid().cell_index(target).is_some());
    }
}

// ── Planning driver ───────────────────────────────────────────────────────────

#[cfg(test)]
mod planning {
    use crowd_core::geometry::Vector;
    use crowd_core::AgentId;

    use super::helpers::{boxed_index, open_index, p, view};
    use crate::state::AgentBody;

    fn body_at(x: f32, z: f32) -> AgentBody {
        let mut body = AgentBody::new(AgentId(0), 1);
        body.position = p(x, z);
        body.forward = Vector::new(1.0, 0.0, 0.0);
        body.radius = 0.5;
        body.enabled = true;
        body
    }

    #[test]
    fn dont_plan_routes_straight_to_goal() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = body_at(-5.0, 0.0);
        body.run_long_term_planning(&world, p(5.0, 0.0), true, 5);
        assert_eq!(body.waypoints, vec![p(5.0, 0.0)]);
        assert!(body.mid_term_path.is_empty());
        assert_eq!(body.local_target, p(5.0, 0.0));
    }

    #[test]
    fn planning_fills_mid_term_path_and_waypoints() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = body_at(-5.0, 0.0);
        body.run_long_term_planning(&world, p(5.0, 0.0), false, 3);
        assert!(!body.mid_term_path.is_empty());
        // The final waypoint is always the goal itself.
        assert_eq!(*body.waypoints.last().unwrap(), p(5.0, 0.0));
        // Waypoints are a thinned subset of the path.
        assert!(body.waypoints.len() <= body.mid_term_path.len() + 1);
    }

    #[test]
    fn planning_failure_degrades_to_straight_line() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = body_at(-5.0, 0.0);
        // Goal outside the grid bounds: A* cannot run.
        body.run_long_term_planning(&world, p(100.0, 0.0), false, 5);
        assert_eq!(body.waypoints, vec![p(100.0, 0.0)]);
        assert_eq!(body.local_target, p(100.0, 0.0));
    }

    #[test]
    fn local_target_stops_at_obstacle_occlusion() {
        let index = boxed_index();
        let world = view(&index, &[]);
        let mut body = body_at(-5.0, 0.0);
        // A hand-built path marching straight through the box.
        for x in [-4.0, -3.0, -2.0, 2.0, 3.0, 4.0] {
            body.mid_term_path.push_back(p(x, 0.0));
        }
        body.local_target = p(-4.0, 0.0);
        body.update_local_target(&world, 20);
        // Points beyond the box face at x = -1 are not visible.
        assert!(body.local_target.x <= -2.0 + 1e-4);
    }

    #[test]
    fn mid_term_window_slides_and_consumes_waypoint() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut body = body_at(-5.0, 0.0);
        body.run_long_term_planning(&world, p(5.0, 0.0), false, 3);
        let before_path = body.mid_term_path.len();
        let before_waypoints = body.waypoints.len();
        if before_path >= 3 {
            body.update_mid_term_path(3);
            assert_eq!(body.mid_term_path.len(), before_path - 3);
            assert_eq!(body.waypoints.len(), before_waypoints - 1);
        }
    }

    #[test]
    fn line_of_sight_matches_obstacles() {
        let index = boxed_index();
        let world = view(&index, &[]);
        let body = body_at(-5.0, 0.0);
        assert!(body.has_line_of_sight(&world, p(-2.0, 0.0)));
        assert!(!body.has_line_of_sight(&world, p(5.0, 0.0)));
    }
}

// ── SimpleAgent ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod simple {
    use crowd_core::geometry::{Ray, Vector};
    use crowd_core::{AgentGoal, AgentId, AgentInitialConditions};

    use super::helpers::{open_index, p, view};
    use crate::simple::SimpleAgent;
    use crate::traits::{FrameInfo, SteeringAgent};

    fn spawn(goal_x: f32) -> SimpleAgent {
        let index = open_index();
        let world = view(&index, &[]);
        let mut agent = SimpleAgent::new(AgentId(0), 7);
        agent
            .reset(
                &AgentInitialConditions {
                    position: p(0.0, 0.0),
                    direction: Vector::new(1.0, 0.0, 0.0),
                    radius: 0.5,
                    speed: 0.0,
                    goals: vec![AgentGoal::seek(p(goal_x, 0.0), 1.3)],
                },
                &world,
            )
            .unwrap();
        agent
    }

    #[test]
    fn reaches_goal_and_disables() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut agent = spawn(5.0);
        let dt = 0.05;
        let mut reached_at = None;
        for frame in 0..200u64 {
            agent
                .update_ai(FrameInfo { time: frame as f32 * dt, dt, frame }, &world)
                .unwrap();
            if !agent.enabled() {
                reached_at = Some(frame);
                break;
            }
        }
        let frame = reached_at.expect("agent never reached its goal");
        // 5 m at 1.3 m/s max is ~77 frames of 50 ms plus spin-up.
        assert!(frame < 120, "took {frame} frames");
        assert!(agent.position().distance(p(5.0, 0.0)) < 1.0);
    }

    #[test]
    fn reset_with_no_goals_fails() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut agent = SimpleAgent::new(AgentId(0), 7);
        let result = agent.reset(
            &AgentInitialConditions {
                position: p(0.0, 0.0),
                direction: Vector::new(1.0, 0.0, 0.0),
                radius: 0.5,
                speed: 0.0,
                goals: vec![],
            },
            &world,
        );
        assert!(result.is_err());
    }

    #[test]
    fn spatial_hooks_see_the_disc() {
        let agent = spawn(5.0);
        // Forward ray from behind the agent hits the disc.
        let ray = Ray::with_length_interval(p(-3.0, 0.0), Vector::new(10.0, 0.0, 0.0));
        let t = agent.intersects(&ray).unwrap();
        assert!((t - 2.5).abs() < 1e-4);
        assert!(agent.overlaps(p(0.8, 0.0), 0.5));
        assert!(!agent.overlaps(p(2.0, 0.0), 0.5));
        assert!(agent.compute_penetration(p(0.5, 0.0), 0.5) > 0.0);
    }

    #[test]
    fn forward_stays_unit_while_moving() {
        let index = open_index();
        let world = view(&index, &[]);
        let mut agent = spawn(5.0);
        let dt = 0.05;
        for frame in 0..40u64 {
            agent
                .update_ai(FrameInfo { time: frame as f32 * dt, dt, frame }, &world)
                .unwrap();
            if agent.velocity().length_squared() > 0.0 {
                assert!((agent.forward().length() - 1.0).abs() < 1e-4);
            }
        }
    }
}
