//! Unit and scenario tests for crowd-orca.

#[cfg(test)]
mod helpers {
    use crowd_core::geometry::Vector;

    use crate::lp::Line;

    /// Mirror a velocity-space vector through the origin.
    pub fn mirrored(v: Vector) -> Vector {
        -v
    }

    /// A half-plane whose permitted side contains velocities with
    /// `v.x <= limit` (direction +z at point (limit, 0)).
    pub fn cap_vx(limit: f32) -> Line {
        Line {
            point: Vector::new(limit, 0.0, 0.0),
            direction: Vector::new(0.0, 0.0, 1.0),
        }
    }

    pub fn satisfies(line: &Line, v: Vector, eps: f32) -> bool {
        crowd_core::geometry::det(line.direction, line.point - v) <= eps
    }
}

// ── Linear programming ────────────────────────────────────────────────────────

#[cfg(test)]
mod lp {
    use crowd_core::geometry::Vector;

    use super::helpers::{cap_vx, satisfies};
    use crate::lp::{linear_program_1, linear_program_2, linear_program_3, Line};

    #[test]
    fn lp2_unconstrained_returns_clamped_preference() {
        let mut result = Vector::ZERO;
        // Preference inside the disk: returned verbatim.
        let n = linear_program_2(&[], 2.0, Vector::new(1.0, 0.0, 0.5), false, &mut result);
        assert_eq!(n, 0);
        assert_eq!(result, Vector::new(1.0, 0.0, 0.5));
        // Preference outside: clamped to the disk rim.
        linear_program_2(&[], 2.0, Vector::new(10.0, 0.0, 0.0), false, &mut result);
        assert!((result.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn lp2_slides_along_violated_line() {
        let lines = vec![cap_vx(0.5)];
        let mut result = Vector::ZERO;
        let n = linear_program_2(&lines, 2.0, Vector::new(2.0, 0.0, 0.0), false, &mut result);
        assert_eq!(n, lines.len());
        // Best point on the cap closest to the preference.
        assert!((result.x - 0.5).abs() < 1e-5);
        assert!(result.z.abs() < 1e-5);
    }

    #[test]
    fn lp1_rejects_line_outside_the_disk() {
        // A line at x = 5 can never intersect the radius-2 disk.
        let lines = vec![cap_vx(5.0)];
        let mut result = Vector::ZERO;
        assert!(!linear_program_1(
            &lines,
            0,
            2.0,
            Vector::new(1.0, 0.0, 0.0),
            false,
            &mut result
        ));
    }

    #[test]
    fn degenerate_program_falls_back_to_lp3() {
        // One satisfiable obstacle line, then an agent line whose feasible
        // region misses the max-speed disk entirely.  linear_program_1
        // fails on it, linear_program_2 reports its index, and
        // linear_program_3 must return a velocity still satisfying the
        // (hard) obstacle line.
        let obstacle = cap_vx(1.0);
        let impossible = Line {
            // Permitted side is x >= 5: direction -z at (5, 0).
            point: Vector::new(5.0, 0.0, 0.0),
            direction: Vector::new(0.0, 0.0, -1.0),
        };
        let lines = vec![obstacle, impossible];
        let num_obst_lines = 1;

        let mut result = Vector::ZERO;
        let fail =
            linear_program_2(&lines, 2.0, Vector::new(2.0, 0.0, 0.0), false, &mut result);
        assert_eq!(fail, 1);

        linear_program_3(&lines, num_obst_lines, fail, 2.0, &mut result);
        assert!(satisfies(&lines[0], result, 1e-4), "obstacle line violated");
        assert!(result.length() <= 2.0 + 1e-4);
    }

    #[test]
    fn solver_respects_the_speed_cap() {
        let lines = vec![cap_vx(0.25), cap_vx(1.5)];
        let mut result = Vector::ZERO;
        linear_program_2(&lines, 1.33, Vector::new(5.0, 0.0, 3.0), false, &mut result);
        assert!(result.length() <= 1.33 + 1e-4);
        for line in &lines {
            assert!(satisfies(line, result, 1e-4));
        }
    }
}

// ── ORCA line construction ────────────────────────────────────────────────────

#[cfg(test)]
mod lines {
    use crowd_core::geometry::{Point, Vector};
    use crowd_core::{AgentId, AxisAlignedBox};
    use crowd_spatial::SegmentArena;

    use super::helpers::{mirrored, satisfies};
    use crate::lines::{build_agent_lines, build_obstacle_lines};
    use crate::lp::linear_program_2;

    /// Two agents head-on produce point-mirrored constraint sets and
    /// point-mirrored resolved velocities, bit for bit.
    #[test]
    fn head_on_is_mirror_symmetric() {
        let max_speed = 1.33;
        let pos_a = Point::on_ground(-2.5, 0.0);
        let pos_b = Point::on_ground(2.5, 0.0);
        let vel_a = Vector::new(1.33, 0.0, 0.0);
        let vel_b = Vector::new(-1.33, 0.0, 0.0);
        let radius = 0.5;
        let inv_tau = 1.0 / 2.0;

        let mut lines_a = Vec::new();
        build_agent_lines(
            pos_a,
            vel_a,
            radius,
            inv_tau,
            20.0,
            &[(25.0, AgentId(1))],
            |_| Some((pos_b, vel_b, radius)),
            &mut lines_a,
        );
        let mut lines_b = Vec::new();
        build_agent_lines(
            pos_b,
            vel_b,
            radius,
            inv_tau,
            20.0,
            &[(25.0, AgentId(0))],
            |_| Some((pos_a, vel_a, radius)),
            &mut lines_b,
        );

        assert_eq!(lines_a.len(), 1);
        assert_eq!(lines_b.len(), 1);
        assert_eq!(lines_b[0].point, mirrored(lines_a[0].point));
        assert_eq!(lines_b[0].direction, mirrored(lines_a[0].direction));

        let mut new_a = Vector::ZERO;
        let mut new_b = Vector::ZERO;
        linear_program_2(&lines_a, max_speed, vel_a, false, &mut new_a);
        linear_program_2(&lines_b, max_speed, vel_b, false, &mut new_b);
        assert_eq!(new_b, mirrored(new_a));
        // The imminent threat actually bent both velocities.
        assert!((new_a - vel_a).length() > 0.0);
    }

    #[test]
    fn collision_case_separates_within_a_step() {
        // Overlapping discs: the 1/dt projection must push the agents
        // apart immediately.  The step is coarse enough that the required
        // separation speed (0.8 m/s each) fits inside the speed disk.
        let dt = 0.25;
        let pos_a = Point::on_ground(0.0, 0.0);
        let pos_b = Point::on_ground(0.6, 0.0);
        let radius = 0.5; // combined 1.0 > distance 0.6
        let mut lines = Vec::new();
        build_agent_lines(
            pos_a,
            Vector::ZERO,
            radius,
            0.5,
            1.0 / dt,
            &[(0.36, AgentId(1))],
            |_| Some((pos_b, Vector::ZERO, radius)),
            &mut lines,
        );
        assert_eq!(lines.len(), 1);
        let mut result = Vector::ZERO;
        linear_program_2(&lines, 2.0, Vector::ZERO, false, &mut result);
        // The resolved velocity retreats along -x, away from the overlap.
        assert!(result.x <= -0.8 + 1e-4);
    }

    #[test]
    fn facing_obstacle_yields_a_blocking_line() {
        let mut arena = SegmentArena::new();
        arena
            .add_box(&AxisAlignedBox::flat(1.0, 3.0, -1.0, 1.0))
            .unwrap();
        let bsp = crowd_spatial::ObstacleBsp::build(arena);

        // Agent just in front of the x = 1 face, driving at it; neighbours
        // come through the BSP so only front-facing segments are seen.
        let position = Point::on_ground(0.0, 0.0);
        let velocity = Vector::new(1.0, 0.0, 0.0);
        let mut neighbors = crowd_spatial::NeighborList::new(16, 100.0);
        bsp.query_neighbors(position, &mut neighbors);
        assert!(!neighbors.is_empty());

        let mut lines = Vec::new();
        build_obstacle_lines(
            position,
            velocity,
            0.3,
            0.5,
            bsp.arena(),
            neighbors.items(),
            &mut lines,
        );
        assert!(!lines.is_empty());

        let mut result = Vector::ZERO;
        let fail = linear_program_2(&lines, 1.33, velocity, false, &mut result);
        assert_eq!(fail, lines.len(), "obstacle lines must be feasible");
        for line in &lines {
            assert!(satisfies(line, result, 1e-4));
        }
        // Driving straight into the wall at full speed is no longer allowed.
        assert!(result.x < velocity.x);
    }
}

// ── Engine-level scenarios ────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use crowd_core::geometry::Vector;
    use crowd_core::{AgentGoal, AgentInitialConditions, AxisAlignedBox, OptionDictionary, Point};
    use crowd_engine::{NoopController, Scenario, SimulationEngine, SimulationOptions};

    use crate::module::{register, RVO2D_AI};

    fn orca_engine(options: SimulationOptions, module_opts: OptionDictionary) -> SimulationEngine {
        let mut engine = SimulationEngine::new();
        engine.init(options, Box::new(NoopController)).unwrap();
        register(&mut engine);
        let mut player_opts = OptionDictionary::new();
        player_opts.insert("ai".to_string(), RVO2D_AI.to_string());
        engine.load_module(RVO2D_AI, module_opts).unwrap();
        engine.load_module("testCasePlayer", player_opts).unwrap();
        engine
    }

    #[test]
    fn single_agent_reaches_goal_within_budget() {
        // One agent, empty scene: start (0,0), goal (10,0), max speed 2,
        // dt 0.05.  Expect the goal reached within 120 ticks and the final
        // position within the reach threshold of the goal.
        let options = SimulationOptions { max_frames: 200, fixed_dt: 0.05, ..Default::default() };
        let mut module_opts = OptionDictionary::new();
        module_opts.insert("rvo_max_speed".to_string(), "2.0".to_string());
        // An empty scene needs no A*; steer straight at the goal.
        module_opts.insert("dont_plan".to_string(), "1".to_string());
        let mut engine = orca_engine(options, module_opts);

        engine.stage_scenario(Scenario::default().with_agent(AgentInitialConditions {
            position: Point::on_ground(0.0, 0.0),
            direction: Vector::new(1.0, 0.0, 0.0),
            radius: 0.2,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(10.0, 0.0), 2.0)],
        }));
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();

        let mut frames = 0u64;
        while engine.update(false).unwrap() {
            frames = engine.frames_simulated();
            // Speed-cap invariant holds every frame.
            let s = engine.summaries()[0];
            if s.enabled {
                assert!(s.velocity.length() <= 2.0 + 1e-3);
            }
        }
        assert!(engine.frames_simulated() <= 120, "took {frames} frames");
        let summary = engine.summaries()[0];
        assert!(!summary.enabled);
        assert!(summary.position.distance(Point::on_ground(10.0, 0.0)) <= 0.5 + 1e-3);
    }

    #[test]
    fn two_agents_cross_without_touching() {
        let options = SimulationOptions { max_frames: 600, fixed_dt: 0.05, ..Default::default() };
        let mut engine = orca_engine(options, OptionDictionary::new());

        let walker = |x: f32, goal_x: f32| AgentInitialConditions {
            position: Point::on_ground(x, 0.0),
            direction: Vector::new(goal_x - x, 0.0, 0.0),
            radius: 0.5,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(goal_x, 0.0), 1.33)],
        };
        engine.stage_scenario(
            Scenario::default()
                .with_agent(walker(-5.0, 5.0))
                .with_agent(walker(5.0, -5.0)),
        );
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();

        let mut min_gap = f32::INFINITY;
        while engine.update(false).unwrap() {
            let s = engine.summaries();
            if s[0].enabled && s[1].enabled {
                min_gap = min_gap.min(s[0].position.distance(s[1].position));
            }
        }
        // Discs of radius 0.5 each: centre distance must stay near or
        // above 1.0 the whole way through.
        assert!(min_gap > 0.9, "agents interpenetrated: min gap {min_gap}");
        assert!(!engine.summaries()[0].enabled && !engine.summaries()[1].enabled);
    }

    #[test]
    fn agent_detours_around_a_box() {
        let options = SimulationOptions { max_frames: 800, fixed_dt: 0.05, ..Default::default() };
        let mut engine = orca_engine(options, OptionDictionary::new());

        engine.stage_scenario(
            Scenario::default()
                .with_agent(AgentInitialConditions {
                    position: Point::on_ground(-5.0, 0.0),
                    direction: Vector::new(1.0, 0.0, 0.0),
                    radius: 0.5,
                    speed: 0.0,
                    goals: vec![AgentGoal::seek(Point::on_ground(5.0, 0.0), 1.33)],
                })
                .with_obstacle(AxisAlignedBox::flat(-1.0, 1.0, -1.0, 1.0)),
        );
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();

        while engine.update(false).unwrap() {
            let s = engine.summaries()[0];
            if s.enabled {
                // Never inside the box (with a small numeric allowance).
                assert!(
                    !(s.position.x.abs() < 1.0 - 0.05 && s.position.z.abs() < 1.0 - 0.05),
                    "agent entered the obstacle at {}",
                    s.position
                );
            }
        }
        let summary = engine.summaries()[0];
        assert!(!summary.enabled, "agent never reached the far side");
        assert!(summary.position.distance(Point::on_ground(5.0, 0.0)) < 1.5);
    }
}
