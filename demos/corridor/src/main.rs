//! Headless corridor demo.
//!
//! Drives the engine exactly the way an embedding application would:
//! init → load modules → initialize → preprocess → update loop →
//! postprocess → cleanup → finish.
//!
//! Usage: `corridor [pprAI|rvo2dAI|simpleAI]` (default `rvo2dAI`).
//! `RUST_LOG=debug` shows the engine's lifecycle transitions.

use crowd_core::geometry::Vector;
use crowd_core::{AgentGoal, AgentInitialConditions, AxisAlignedBox, OptionDictionary, Point};
use crowd_engine::{NoopController, Scenario, SimulationEngine, SimulationOptions};
use tracing::info;

fn corridor_scenario() -> Scenario {
    let mut scenario = Scenario::default()
        // A block in the middle of the corridor.
        .with_obstacle(AxisAlignedBox::flat(-1.0, 1.0, -1.0, 1.0));

    // Two small groups walking the corridor in opposite directions.
    for i in 0..4 {
        let z = -3.0 + 2.0 * i as f32;
        scenario.agents.push(AgentInitialConditions {
            position: Point::on_ground(-12.0, z),
            direction: Vector::new(1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(12.0, z), 1.33)],
        });
        scenario.agents.push(AgentInitialConditions {
            position: Point::on_ground(12.0, -z),
            direction: Vector::new(-1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 0.0,
            goals: vec![AgentGoal::seek(Point::on_ground(-12.0, -z), 1.33)],
        });
    }
    scenario
}

fn run(ai_module: &str) -> crowd_core::CrowdResult<()> {
    let options = SimulationOptions {
        fixed_dt: 0.05,
        max_frames: 3_000,
        seed: 42,
        ..Default::default()
    };

    let mut engine = SimulationEngine::new();
    engine.init(options, Box::new(NoopController))?;
    crowd_ppr::register(&mut engine);
    crowd_orca::register(&mut engine);

    engine.load_module(ai_module, OptionDictionary::new())?;
    let mut player_opts = OptionDictionary::new();
    player_opts.insert("ai".to_string(), ai_module.to_string());
    engine.load_module("testCasePlayer", player_opts)?;

    engine.stage_scenario(corridor_scenario());
    engine.initialize_simulation()?;
    engine.preprocess_simulation()?;

    while engine.update(false)? {
        if engine.frames_simulated() % 100 == 0 {
            info!(
                frame = engine.frames_simulated(),
                alive = engine.enabled_agent_count(),
                "{}",
                engine.clock()
            );
        }
    }

    info!(
        frames = engine.frames_simulated(),
        fps = engine.clock().fps(),
        "simulation done"
    );
    engine.postprocess_simulation()?;
    engine.cleanup_simulation()?;
    engine.finish()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let ai_module = std::env::args().nth(1).unwrap_or_else(|| "rvo2dAI".to_string());
    if let Err(e) = run(&ai_module) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
