//! Unit and integration tests for crowd-engine.

#[cfg(test)]
mod helpers {
    use crowd_core::geometry::Vector;
    use crowd_core::{AgentGoal, AgentInitialConditions, OptionDictionary, Point};

    use crate::engine::SimulationEngine;
    use crate::modules::TEST_CASE_PLAYER;
    use crate::options::{NoopController, SimulationOptions};
    use crate::scenario::Scenario;

    pub fn ready_engine(options: SimulationOptions) -> SimulationEngine {
        let mut engine = SimulationEngine::new();
        engine.init(options, Box::new(NoopController)).unwrap();
        engine
    }

    pub fn walker(from_x: f32, to_x: f32) -> AgentInitialConditions {
        AgentInitialConditions {
            position: Point::on_ground(from_x, 0.0),
            direction: Vector::new(1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(to_x, 0.0), 1.3)],
        }
    }

    /// Engine with testCasePlayer+simpleAI loaded and `scenario` staged.
    pub fn engine_with_scenario(
        options: SimulationOptions,
        scenario: Scenario,
    ) -> SimulationEngine {
        let mut engine = ready_engine(options);
        engine
            .load_module(TEST_CASE_PLAYER, OptionDictionary::new())
            .unwrap();
        engine.stage_scenario(scenario);
        engine
    }

    /// Drive a prepared engine until `update` reports done; returns the
    /// number of simulated frames.
    pub fn run_to_completion(engine: &mut SimulationEngine) -> u64 {
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();
        while engine.update(false).unwrap() {}
        engine.frames_simulated()
    }
}

// ── Lifecycle state machine ───────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use crowd_core::CrowdError;

    use crate::lifecycle::{EngineState, LifecycleStateMachine};

    #[test]
    fn happy_path_walks_every_phase() {
        let mut sm = LifecycleStateMachine::new();
        for state in [
            EngineState::Initializing,
            EngineState::Ready,
            EngineState::LoadingSimulation,
            EngineState::SimulationLoaded,
            EngineState::PreprocessingSimulation,
            EngineState::SimulationReadyForUpdate,
            EngineState::UpdatingSimulation,
            EngineState::SimulationReadyForUpdate,
            EngineState::UpdatingSimulation,
            EngineState::SimulationNoMoreUpdatesAllowed,
            EngineState::PostprocessingSimulation,
            EngineState::SimulationFinished,
            EngineState::UnloadingSimulation,
            EngineState::Ready,
            EngineState::CleaningUp,
            EngineState::Finished,
        ] {
            sm.transition(state).unwrap();
        }
    }

    #[test]
    fn illegal_edge_is_rejected_and_state_unchanged() {
        let mut sm = LifecycleStateMachine::new();
        sm.transition(EngineState::Initializing).unwrap();
        sm.transition(EngineState::Ready).unwrap();

        let err = sm.transition(EngineState::UpdatingSimulation).unwrap_err();
        assert!(matches!(err, CrowdError::InvalidLifecycleTransition { .. }));
        assert_eq!(sm.current(), EngineState::Ready);
    }

    #[test]
    fn update_before_preprocess_is_guarded() {
        // Engine-level version of the same guard: the simulation is loaded
        // but never preprocessed, so update must fail and change nothing.
        let mut engine = super::helpers::engine_with_scenario(
            crate::options::SimulationOptions::default(),
            crate::scenario::Scenario::default().with_agent(super::helpers::walker(0.0, 5.0)),
        );
        engine.initialize_simulation().unwrap();
        assert_eq!(engine.state(), EngineState::SimulationLoaded);

        let err = engine.update(false).unwrap_err();
        assert!(matches!(err, CrowdError::InvalidLifecycleTransition { .. }));
        assert_eq!(engine.state(), EngineState::SimulationLoaded);
        assert_eq!(engine.frames_simulated(), 0);
    }
}

// ── Module harness ────────────────────────────────────────────────────────────

#[cfg(test)]
mod modules {
    use crowd_core::{CrowdError, OptionDictionary};

    use super::helpers::ready_engine;
    use crate::module::Module;
    use crate::options::SimulationOptions;

    struct NeedsSimple;
    impl Module for NeedsSimple {
        fn dependencies(&self) -> Vec<String> {
            vec!["simpleAI".to_string()]
        }
    }

    struct CycleA;
    impl Module for CycleA {
        fn dependencies(&self) -> Vec<String> {
            vec!["cycleB".to_string()]
        }
    }
    struct CycleB;
    impl Module for CycleB {
        fn dependencies(&self) -> Vec<String> {
            vec!["cycleA".to_string()]
        }
    }

    struct HatesSimple;
    impl Module for HatesSimple {
        fn conflicts(&self) -> Vec<String> {
            vec!["simpleAI".to_string()]
        }
    }

    #[test]
    fn dependencies_load_first_and_order_is_topological() {
        let mut engine = ready_engine(SimulationOptions::default());
        engine.register_module_factory("needsSimple", || Box::new(NeedsSimple));
        engine
            .load_module("needsSimple", OptionDictionary::new())
            .unwrap();

        let order = engine.modules_in_execution_order();
        let simple_pos = order.iter().position(|n| n == "simpleAI").unwrap();
        let needy_pos = order.iter().position(|n| n == "needsSimple").unwrap();
        assert!(simple_pos < needy_pos);

        let meta = engine.module_meta("simpleAI").unwrap();
        assert_eq!(meta.dependents, vec!["needsSimple".to_string()]);
    }

    #[test]
    fn dependency_cycles_are_detected() {
        let mut engine = ready_engine(SimulationOptions::default());
        engine.register_module_factory("cycleA", || Box::new(CycleA));
        engine.register_module_factory("cycleB", || Box::new(CycleB));
        let err = engine
            .load_module("cycleA", OptionDictionary::new())
            .unwrap_err();
        assert!(matches!(err, CrowdError::ModuleDependencyCycle { .. }));
    }

    #[test]
    fn conflicts_abort_the_load_and_keep_prior_modules() {
        let mut engine = ready_engine(SimulationOptions::default());
        engine.register_module_factory("hatesSimple", || Box::new(HatesSimple));
        engine
            .load_module("simpleAI", OptionDictionary::new())
            .unwrap();
        let err = engine
            .load_module("hatesSimple", OptionDictionary::new())
            .unwrap_err();
        assert!(matches!(err, CrowdError::ModuleConflict { .. }));
        assert!(engine.is_module_loaded("simpleAI"));
        assert!(!engine.is_module_loaded("hatesSimple"));
    }

    #[test]
    fn unknown_module_is_an_error() {
        let mut engine = ready_engine(SimulationOptions::default());
        let err = engine
            .load_module("noSuchModule", OptionDictionary::new())
            .unwrap_err();
        assert!(matches!(err, CrowdError::UnknownModule(_)));
    }

    #[test]
    fn unload_with_dependents_requires_recursive() {
        let mut engine = ready_engine(SimulationOptions::default());
        engine.register_module_factory("needsSimple", || Box::new(NeedsSimple));
        engine
            .load_module("needsSimple", OptionDictionary::new())
            .unwrap();

        assert!(engine.unload_module("simpleAI", false).is_err());
        assert!(engine.is_module_loaded("simpleAI"));

        engine.unload_module("simpleAI", true).unwrap();
        assert!(!engine.is_module_loaded("simpleAI"));
        assert!(!engine.is_module_loaded("needsSimple"));
    }

    #[test]
    fn commands_dispatch_by_name() {
        let mut engine = ready_engine(SimulationOptions::default());
        engine.add_command("stop-now", |e| {
            e.request_simulation_stop();
            Ok(())
        });
        assert!(engine.has_command("stop-now"));
        engine.run_command("stop-now").unwrap();
        assert!(engine.run_command("missing").is_err());
        engine.remove_command("stop-now");
        assert!(!engine.has_command("stop-now"));
    }
}

// ── Simulation runs ───────────────────────────────────────────────────────────

#[cfg(test)]
mod runs {
    use crowd_core::geometry::Vector;
    use crowd_core::{AgentGoal, AgentInitialConditions, AxisAlignedBox, Point};

    use super::helpers::{engine_with_scenario, run_to_completion, walker};
    use crate::lifecycle::EngineState;
    use crate::options::SimulationOptions;
    use crate::scenario::{EmitterSpec, Scenario};

    #[test]
    fn single_agent_reaches_goal_and_run_terminates() {
        let options = SimulationOptions { max_frames: 500, ..Default::default() };
        let scenario = Scenario::default().with_agent(walker(0.0, 5.0));
        let mut engine = engine_with_scenario(options, scenario);

        let frames = run_to_completion(&mut engine);
        // 5 m at 1.3 m/s and 50 ms frames, plus spin-up: well under budget.
        assert!(frames < 150, "took {frames} frames");
        let summary = engine.summaries()[0];
        assert!(!summary.enabled);
        assert!(summary.position.distance(Point::on_ground(5.0, 0.0)) < 1.0);

        engine.postprocess_simulation().unwrap();
        engine.cleanup_simulation().unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.agent_count(), 0);
    }

    #[test]
    fn paused_updates_advance_no_simulation_state() {
        let options = SimulationOptions { max_frames: 10, ..Default::default() };
        let scenario = Scenario::default().with_agent(walker(0.0, 5.0));
        let mut engine = engine_with_scenario(options, scenario);
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();

        let p0 = engine.summaries()[0].position;
        for _ in 0..5 {
            assert!(engine.update(true).unwrap());
        }
        assert_eq!(engine.frames_simulated(), 0);
        assert_eq!(engine.summaries()[0].position, p0);
        // A real update then advances.
        engine.update(false).unwrap();
        assert_eq!(engine.frames_simulated(), 1);
    }

    #[test]
    fn emitter_spawns_on_schedule_up_to_total() {
        let options = SimulationOptions { max_frames: 50, ..Default::default() };
        let scenario = Scenario::default()
            .with_agent(walker(0.0, 40.0))
            .with_emitter(EmitterSpec {
                template: walker(-8.0, 40.0),
                period_frames: 10,
                total: 3,
                trigger_region: None,
            });
        let mut engine = engine_with_scenario(options, scenario);
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();
        assert_eq!(engine.agent_count(), 1);

        while engine.update(false).unwrap() {}
        // Frames 0, 10, 20 spawn one agent each; the total caps it there.
        assert_eq!(engine.agent_count(), 4);
    }

    #[test]
    fn trigger_region_gates_emission() {
        let options = SimulationOptions { max_frames: 20, ..Default::default() };
        // The walker starts outside the trigger region and never enters it.
        let scenario = Scenario::default()
            .with_agent(walker(0.0, 5.0))
            .with_emitter(EmitterSpec {
                template: walker(-8.0, 5.0),
                period_frames: 1,
                total: 100,
                trigger_region: Some(AxisAlignedBox::flat(50.0, 60.0, 50.0, 60.0)),
            });
        let mut engine = engine_with_scenario(options, scenario);
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();
        while engine.update(false).unwrap() {}
        assert_eq!(engine.agent_count(), 1);
    }

    #[test]
    fn determinism_identical_runs_identical_trajectories() {
        let run = || {
            let options = SimulationOptions {
                max_frames: 200,
                seed: 99,
                ..Default::default()
            };
            let scenario = Scenario::default()
                .with_agent(walker(0.0, 5.0))
                .with_agent(walker(-3.0, 6.0));
            let mut engine = engine_with_scenario(options, scenario);
            engine.initialize_simulation().unwrap();
            engine.preprocess_simulation().unwrap();
            let mut trace: Vec<(f32, f32)> = Vec::new();
            while engine.update(false).unwrap() {
                for s in engine.summaries() {
                    trace.push((s.position.x, s.position.z));
                }
            }
            trace
        };
        let a = run();
        let b = run();
        // Bitwise identical: same seed, same options, same module set.
        assert_eq!(a, b);
    }

    #[test]
    fn preprocess_failure_returns_engine_to_ready() {
        // No staged scenario and no testcase option: MissingTestCase.
        let mut engine = super::helpers::ready_engine(SimulationOptions::default());
        engine
            .load_module(
                crate::modules::TEST_CASE_PLAYER,
                crowd_core::OptionDictionary::new(),
            )
            .unwrap();
        let err = engine.initialize_simulation().unwrap_err();
        assert!(matches!(err, crowd_core::CrowdError::MissingTestCase(_)));
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[test]
    fn obstacles_are_frozen_while_running() {
        let options = SimulationOptions { max_frames: 5, ..Default::default() };
        let scenario = Scenario::default()
            .with_agent(walker(-5.0, 5.0))
            .with_obstacle(AxisAlignedBox::flat(-1.0, 1.0, -1.0, 1.0));
        let mut engine = engine_with_scenario(options, scenario);
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();
        assert_eq!(engine.obstacle_count(), 1);

        let err = engine
            .add_obstacle(
                crate::engine::Obstacle::Box(AxisAlignedBox::flat(2.0, 3.0, 2.0, 3.0)),
                "test",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crowd_core::CrowdError::InvalidLifecycleTransition { .. }
        ));
    }

    #[test]
    fn goal_summary_feeds_the_mirror() {
        let options = SimulationOptions { max_frames: 2, ..Default::default() };
        let mut scenario = Scenario::default();
        scenario.agents.push(AgentInitialConditions {
            position: Point::on_ground(0.0, 0.0),
            direction: Vector::new(1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(7.0, -2.0), 1.0)],
        });
        let mut engine = engine_with_scenario(options, scenario);
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();
        assert_eq!(engine.summaries()[0].goal_target, Point::on_ground(7.0, -2.0));
    }
}

// ── Scenario CSV loading ──────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_csv {
    use std::io::Write;

    use crowd_core::CrowdError;

    use crate::scenario::Scenario;

    #[test]
    fn loads_agents_obstacles_and_emitters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corridor.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "kind,x,z,dir_x,dir_z,radius,speed,goal_x,goal_z,desired_speed,xmin,xmax,zmin,zmax,period,total"
        )
        .unwrap();
        writeln!(f, "agent,-5.0,0,1,0,0.5,0.0,5.0,0,1.33,,,,,,").unwrap();
        writeln!(f, "obstacle,,,,,,,,,,-1,1,-1,1,,").unwrap();
        writeln!(f, "emitter,-8,0,1,0,0.5,0,8,0,1.33,,,,,40,12").unwrap();
        writeln!(f, "comment,,,,,,,,,,,,,,,").unwrap();
        drop(f);

        let scenario = Scenario::from_csv(&path).unwrap();
        assert_eq!(scenario.agents.len(), 1);
        assert_eq!(scenario.obstacles.len(), 1);
        assert_eq!(scenario.emitters.len(), 1);
        assert_eq!(scenario.agents[0].goals.len(), 1);
        assert_eq!(scenario.emitters[0].period_frames, 40);
        assert_eq!(scenario.emitters[0].total, 12);
        assert!(scenario.emitters[0].trigger_region.is_none());
    }

    #[test]
    fn missing_file_is_a_missing_test_case() {
        let err = Scenario::from_csv(std::path::Path::new("/no/such/scenario.csv")).unwrap_err();
        assert!(matches!(err, CrowdError::MissingTestCase(_)));
    }
}

// ── Recorder / replay round trip ──────────────────────────────────────────────

#[cfg(test)]
mod replay {
    use crowd_core::OptionDictionary;

    use super::helpers::{ready_engine, walker};
    use crate::modules::{REC_FILE_PLAYER, SIMULATION_RECORDER, TEST_CASE_PLAYER};
    use crate::options::SimulationOptions;
    use crate::scenario::Scenario;

    #[test]
    fn recorded_run_replays_to_the_same_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let rec_path = dir.path().join("corridor.rec");
        let rec_path_str = rec_path.display().to_string();

        // ── Run and record ────────────────────────────────────────────────
        let options = SimulationOptions { max_frames: 300, seed: 7, ..Default::default() };
        let mut engine = ready_engine(options);
        engine
            .load_module(TEST_CASE_PLAYER, OptionDictionary::new())
            .unwrap();
        let mut rec_opts = OptionDictionary::new();
        rec_opts.insert("recfile".to_string(), rec_path_str.clone());
        engine.load_module(SIMULATION_RECORDER, rec_opts).unwrap();

        engine.stage_scenario(
            Scenario::default()
                .with_agent(walker(0.0, 5.0))
                .with_agent(walker(-4.0, 3.0)),
        );
        engine.initialize_simulation().unwrap();
        engine.preprocess_simulation().unwrap();

        let mut recorded: Vec<Vec<(f32, f32, bool)>> = Vec::new();
        loop {
            let more = engine.update(false).unwrap();
            recorded.push(
                engine
                    .summaries()
                    .iter()
                    .map(|s| (s.position.x, s.position.z, s.enabled))
                    .collect(),
            );
            if !more {
                break;
            }
        }
        engine.postprocess_simulation().unwrap();
        engine.cleanup_simulation().unwrap();
        assert!(rec_path.exists());

        // ── Replay ────────────────────────────────────────────────────────
        let options = SimulationOptions { max_frames: 600, seed: 7, ..Default::default() };
        let mut replay = ready_engine(options);
        let mut play_opts = OptionDictionary::new();
        play_opts.insert("recfile".to_string(), rec_path_str);
        replay.load_module(REC_FILE_PLAYER, play_opts).unwrap();
        replay.initialize_simulation().unwrap();
        replay.preprocess_simulation().unwrap();

        let mut frame = 0usize;
        loop {
            let more = replay.update(false).unwrap();
            if frame < recorded.len() {
                for (i, summary) in replay.summaries().iter().enumerate() {
                    let (x, z, enabled) = recorded[frame][i];
                    if enabled {
                        assert!(
                            (summary.position.x - x).abs() < 1e-5
                                && (summary.position.z - z).abs() < 1e-5,
                            "frame {frame} agent {i} diverged"
                        );
                    }
                }
            }
            frame += 1;
            if !more {
                break;
            }
        }
        // The replay covered every recorded frame.
        assert!(frame >= recorded.len());
    }

    #[test]
    fn missing_rec_file_fails_the_load() {
        let mut engine = ready_engine(SimulationOptions::default());
        let mut opts = OptionDictionary::new();
        opts.insert("recfile".to_string(), "/no/such/file.rec".to_string());
        engine.load_module(REC_FILE_PLAYER, opts).unwrap();
        let err = engine.initialize_simulation().unwrap_err();
        assert!(matches!(err, crowd_core::CrowdError::MissingRecFile(_)));
        assert_eq!(engine.state(), crate::lifecycle::EngineState::Ready);
    }
}
