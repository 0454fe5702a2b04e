//! Scenario descriptions — the initial conditions a simulation starts from.
//!
//! A [`Scenario`] is either assembled programmatically (tests, drivers) or
//! loaded from a CSV description.  The CSV schema is one row per entity:
//!
//! ```text
//! kind,x,z,dir_x,dir_z,radius,speed,goal_x,goal_z,desired_speed,xmin,xmax,zmin,zmax,period,total
//! agent,-5.0,0,1,0,0.5,0.0,5.0,0,1.33,,,,,,
//! obstacle,,,,,,,,,,-1,1,-1,1,,
//! emitter,-8,0,1,0,0.5,0,8,0,1.33,,,,,40,12
//! ```
//!
//! Unused columns stay empty; unknown `kind` values are skipped with a
//! warning so a scenario file can carry annotations for other tools.

use std::path::Path;

use crowd_core::geometry::Vector;
use crowd_core::{
    AgentGoal, AgentInitialConditions, AxisAlignedBox, CrowdError, CrowdResult, Point,
};
use serde::Deserialize;
use tracing::warn;

// ── Scenario ──────────────────────────────────────────────────────────────────

/// Spawn schedule for one emitter, as described by a scenario.
#[derive(Clone, Debug)]
pub struct EmitterSpec {
    pub template: AgentInitialConditions,
    pub period_frames: u64,
    pub total: u32,
    pub trigger_region: Option<AxisAlignedBox>,
}

/// Everything the test-case player feeds into the engine.
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    pub agents: Vec<AgentInitialConditions>,
    pub obstacles: Vec<AxisAlignedBox>,
    pub emitters: Vec<EmitterSpec>,
}

impl Scenario {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.obstacles.is_empty() && self.emitters.is_empty()
    }

    /// Builder-style helpers for hand-written scenarios.
    pub fn with_agent(mut self, agent: AgentInitialConditions) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_obstacle(mut self, bounds: AxisAlignedBox) -> Self {
        self.obstacles.push(bounds);
        self
    }

    pub fn with_emitter(mut self, emitter: EmitterSpec) -> Self {
        self.emitters.push(emitter);
        self
    }

    // ── CSV loading ───────────────────────────────────────────────────────

    /// Load a scenario from a CSV file.  A missing file is reported as
    /// `MissingTestCase`, which sends the engine back to `ready`.
    pub fn from_csv(path: &Path) -> CrowdResult<Scenario> {
        if !path.exists() {
            return Err(CrowdError::MissingTestCase(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| CrowdError::MissingTestCase(format!("{}: {e}", path.display())))?;

        let mut scenario = Scenario::default();
        for row in reader.deserialize::<ScenarioRow>() {
            let row = row.map_err(|e| CrowdError::Config(format!("bad scenario row: {e}")))?;
            match row.kind.as_str() {
                "agent" => scenario.agents.push(row.initial_conditions()?),
                "obstacle" => scenario.obstacles.push(row.region()?),
                "emitter" => scenario.emitters.push(EmitterSpec {
                    template: row.initial_conditions()?,
                    period_frames: row.period.unwrap_or(1),
                    total: row.total.unwrap_or(0),
                    trigger_region: row.region().ok(),
                }),
                other => warn!(kind = other, "skipping unknown scenario row kind"),
            }
        }
        Ok(scenario)
    }
}

// ── CSV row ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScenarioRow {
    kind: String,
    x: Option<f32>,
    z: Option<f32>,
    dir_x: Option<f32>,
    dir_z: Option<f32>,
    radius: Option<f32>,
    speed: Option<f32>,
    goal_x: Option<f32>,
    goal_z: Option<f32>,
    desired_speed: Option<f32>,
    xmin: Option<f32>,
    xmax: Option<f32>,
    zmin: Option<f32>,
    zmax: Option<f32>,
    period: Option<u64>,
    total: Option<u32>,
}

impl ScenarioRow {
    fn initial_conditions(&self) -> CrowdResult<AgentInitialConditions> {
        let missing = |field: &str| {
            CrowdError::Config(format!("scenario {} row is missing '{field}'", self.kind))
        };
        Ok(AgentInitialConditions {
            position: Point::on_ground(self.x.ok_or_else(|| missing("x"))?, self.z.ok_or_else(|| missing("z"))?),
            direction: Vector::new(
                self.dir_x.ok_or_else(|| missing("dir_x"))?,
                0.0,
                self.dir_z.ok_or_else(|| missing("dir_z"))?,
            ),
            radius: self.radius.ok_or_else(|| missing("radius"))?,
            speed: self.speed.unwrap_or(0.0),
            goals: vec![AgentGoal::seek(
                Point::on_ground(
                    self.goal_x.ok_or_else(|| missing("goal_x"))?,
                    self.goal_z.ok_or_else(|| missing("goal_z"))?,
                ),
                self.desired_speed.unwrap_or(1.33),
            )],
        })
    }

    fn region(&self) -> CrowdResult<AxisAlignedBox> {
        let missing =
            |field: &str| CrowdError::Config(format!("scenario region is missing '{field}'"));
        Ok(AxisAlignedBox::flat(
            self.xmin.ok_or_else(|| missing("xmin"))?,
            self.xmax.ok_or_else(|| missing("xmax"))?,
            self.zmin.ok_or_else(|| missing("zmin"))?,
            self.zmax.ok_or_else(|| missing("zmax"))?,
        ))
    }
}
