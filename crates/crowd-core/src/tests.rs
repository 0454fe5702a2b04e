//! Unit tests for crowd-core.

// ── Geometry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geometry {
    use crate::geometry::*;

    #[test]
    fn left_of_sign_convention() {
        let a = Point::on_ground(0.0, 0.0);
        let b = Point::on_ground(1.0, 0.0);
        // +z is to the left of the +x direction; -z to the right.
        assert!(left_of(a, b, Point::on_ground(0.5, 1.0)) > 0.0);
        assert!(left_of(a, b, Point::on_ground(0.5, -1.0)) < 0.0);
        assert_eq!(left_of(a, b, Point::on_ground(0.5, 0.0)), 0.0);
    }

    #[test]
    fn right_side_matches_left_of() {
        let forward = Vector::new(1.0, 0.0, 0.0);
        let right = forward.right_side_xz();
        // A point displaced along the right side must test as "not left".
        let a = Point::ORIGIN;
        let b = a + forward;
        assert!(left_of(a, b, a + right) < 0.0);
        assert!((right.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vector::ZERO.normalized(), Vector::ZERO);
    }

    #[test]
    fn clamped_preserves_short_vectors() {
        let v = Vector::new(1.0, 0.0, 0.0);
        assert_eq!(v.clamped(2.0), v);
        let long = Vector::new(6.0, 0.0, 8.0);
        let clamped = long.clamped(5.0);
        assert!((clamped.length() - 5.0).abs() < 1e-4);
        // direction preserved
        assert!((clamped.normalized() - long.normalized()).length() < 1e-5);
    }

    #[test]
    fn parallel_rays_do_not_intersect() {
        let r = intersect_two_rays_2d(
            Point::on_ground(0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Point::on_ground(0.0, 1.0),
            Vector::new(2.0, 0.0, 0.0),
        );
        assert!(r.is_none());
    }

    #[test]
    fn crossing_rays_intersect_at_expected_params() {
        let (t1, t2) = intersect_two_rays_2d(
            Point::on_ground(0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Point::on_ground(2.0, -1.0),
            Vector::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!((t1 - 2.0).abs() < 1e-5);
        assert!((t2 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_circle_front_hit() {
        let ray = Ray::with_length_interval(
            Point::on_ground(0.0, 0.0),
            Vector::new(10.0, 0.0, 0.0),
        );
        let t = ray_circle_intersection(&ray, Point::on_ground(5.0, 0.0), 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn ray_circle_miss_behind() {
        let ray = Ray::with_length_interval(
            Point::on_ground(0.0, 0.0),
            Vector::new(10.0, 0.0, 0.0),
        );
        assert!(ray_circle_intersection(&ray, Point::on_ground(-5.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn ray_segment_hit_and_range() {
        let ray = Ray::with_unit_interval(
            Point::on_ground(0.0, 0.0),
            Vector::new(4.0, 0.0, 0.0),
        );
        let a = Point::on_ground(2.0, -1.0);
        let b = Point::on_ground(2.0, 1.0);
        let t = ray_segment_intersection(&ray, a, b).unwrap();
        assert!((t - 0.5).abs() < 1e-5);
        // Segment beyond maxt is not hit.
        let far_a = Point::on_ground(8.0, -1.0);
        let far_b = Point::on_ground(8.0, 1.0);
        assert!(ray_segment_intersection(&ray, far_a, far_b).is_none());
    }

    #[test]
    fn dist_sq_point_segment_cases() {
        let a = Point::on_ground(0.0, 0.0);
        let b = Point::on_ground(2.0, 0.0);
        // Projection inside the segment.
        assert!((dist_sq_point_segment(a, b, Point::on_ground(1.0, 3.0)) - 9.0).abs() < 1e-5);
        // Before a.
        assert!((dist_sq_point_segment(a, b, Point::on_ground(-2.0, 0.0)) - 4.0).abs() < 1e-5);
        // After b.
        assert!((dist_sq_point_segment(a, b, Point::on_ground(5.0, 0.0)) - 9.0).abs() < 1e-5);
        // Zero-length segment degenerates to point distance.
        assert!((dist_sq_point_segment(a, a, Point::on_ground(0.0, 2.0)) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn box_circle_overlap_and_penetration() {
        let b = AxisAlignedBox::flat(-1.0, 1.0, -1.0, 1.0);
        assert!(box_overlaps_circle_2d(b.xmin, b.xmax, b.zmin, b.zmax, Point::on_ground(1.4, 0.0), 0.5));
        assert!(!box_overlaps_circle_2d(b.xmin, b.xmax, b.zmin, b.zmax, Point::on_ground(2.0, 0.0), 0.5));
        let pen = box_circle_penetration_2d(&b, Point::on_ground(1.25, 0.0), 0.5);
        assert!((pen - 0.25).abs() < 1e-5);
        assert_eq!(box_circle_penetration_2d(&b, Point::on_ground(3.0, 0.0), 0.5), 0.0);
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod clock {
    use crate::SimClock;

    #[test]
    fn sim_time_is_frame_times_dt() {
        let mut c = SimClock::new(0.05);
        assert_eq!(c.frame(), 0);
        assert_eq!(c.sim_time(), 0.0);
        for _ in 0..10 {
            c.advance_sim_frame();
        }
        assert_eq!(c.frame(), 10);
        assert!((c.sim_time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn real_time_advances_while_paused() {
        let mut c = SimClock::new(0.05);
        c.advance_real_time();
        // Paused updates never move the frame counter.
        assert_eq!(c.frame(), 0);
        assert!(c.real_elapsed() >= 0.0);
    }
}

// ── Goals ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod goal {
    use crate::geometry::{AxisAlignedBox, Point};
    use crate::goal::AgentGoal;

    #[test]
    fn seek_goal_reached_by_threshold() {
        let g = AgentGoal::seek(Point::on_ground(10.0, 0.0), 1.33);
        assert!(!g.is_reached(Point::on_ground(0.0, 0.0), 0.5, 0.5));
        assert!(g.is_reached(Point::on_ground(9.6, 0.0), 0.5, 0.5));
    }

    #[test]
    fn box_goal_reached_by_overlap() {
        let g = AgentGoal::region(AxisAlignedBox::flat(4.0, 6.0, -1.0, 1.0), 1.33);
        // Outside the region and far from its centre.
        assert!(!g.is_reached(Point::on_ground(0.0, 0.0), 0.5, 0.5));
        // Disc touches the region edge even though the centre is distant.
        assert!(g.is_reached(Point::on_ground(3.6, 0.0), 0.5, 0.1));
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod options {
    use crate::options::{parse_f32, parse_flag, parse_u32, Behaviour};

    #[test]
    fn parse_keeps_current_on_garbage() {
        assert_eq!(parse_f32("k", "2.5", 1.0), 2.5);
        assert_eq!(parse_f32("k", "not-a-number", 1.0), 1.0);
        assert_eq!(parse_u32("k", "7", 3), 7);
        assert_eq!(parse_u32("k", "-1", 3), 3);
    }

    #[test]
    fn flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag(""));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn behaviour_applies_in_insertion_order() {
        let b = Behaviour::new("test")
            .with("a", "1")
            .with("b", "2");
        let mut seen = Vec::new();
        b.apply_each(|k, v| {
            seen.push((k.to_string(), v.to_string()));
            true
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "a");
        assert_eq!(seen[1].1, "2");
    }
}

// ── RNG ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SimRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::new(42, AgentId(7));
        let mut b = AgentRng::new(42, AgentId(7));
        for _ in 0..16 {
            let x: f32 = a.gen_range(0.0..1.0);
            let y: f32 = b.gen_range(0.0..1.0);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn different_agents_different_streams() {
        let mut a = AgentRng::new(42, AgentId(0));
        let mut b = AgentRng::new(42, AgentId(1));
        let xs: Vec<u32> = (0..8).map(|_| a.gen_range(0..u32::MAX)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen_range(0..u32::MAX)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn different_run_seeds_different_streams() {
        let mut a = AgentRng::new(1, AgentId(3));
        let mut b = AgentRng::new(2, AgentId(3));
        let xs: Vec<u32> = (0..8).map(|_| a.gen_range(0..u32::MAX)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen_range(0..u32::MAX)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn engine_stream_is_not_an_agent_stream() {
        // The engine's reserved stream tag must never collide with an
        // agent id, agent 0 included.
        let mut engine = SimRng::new(42);
        let mut agent = AgentRng::new(42, AgentId(0));
        let xs: Vec<u32> = (0..8).map(|_| engine.gen_range(0..u32::MAX)).collect();
        let ys: Vec<u32> = (0..8).map(|_| agent.gen_range(0..u32::MAX)).collect();
        assert_ne!(xs, ys);
    }
}
