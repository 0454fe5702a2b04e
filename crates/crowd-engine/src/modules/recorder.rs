//! The simulation recorder.
//!
//! Snapshots every agent every frame: position, forward, enabled flag,
//! radius, and the current goal target.  The stream is CSV-framed — the
//! format is an implementation detail; the replay contract is only that
//! for each frame number the reader yields those fields per recorded
//! agent.

use std::fs::File;
use std::path::PathBuf;

use crowd_agent::FrameInfo;
use crowd_core::{CrowdError, CrowdResult, OptionDictionary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::SimulationEngine;
use crate::module::Module;

/// One recorded agent-frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecRow {
    pub frame: u64,
    pub agent: u32,
    pub x: f32,
    pub z: f32,
    pub dir_x: f32,
    pub dir_z: f32,
    pub enabled: bool,
    pub radius: f32,
    pub goal_x: f32,
    pub goal_z: f32,
}

/// Records a rec file while the simulation runs.
///
/// Option `recfile`: output path (default `simulation.rec`).
#[derive(Default)]
pub struct SimulationRecorderModule {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows_written: u64,
}

impl Module for SimulationRecorderModule {
    fn init(
        &mut self,
        options: &OptionDictionary,
        _engine: &mut SimulationEngine,
    ) -> CrowdResult<()> {
        self.path = options
            .get("recfile")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("simulation.rec"));
        Ok(())
    }

    fn preprocess_simulation(&mut self, _engine: &mut SimulationEngine) -> CrowdResult<()> {
        let writer = csv::Writer::from_path(&self.path).map_err(|e| {
            CrowdError::Config(format!("cannot open rec file {}: {e}", self.path.display()))
        })?;
        self.writer = Some(writer);
        self.rows_written = 0;
        Ok(())
    }

    fn postprocess_frame(
        &mut self,
        engine: &mut SimulationEngine,
        frame: FrameInfo,
    ) -> CrowdResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for summary in engine.summaries() {
            let row = RecRow {
                frame: frame.frame,
                agent: summary.id.0,
                x: summary.position.x,
                z: summary.position.z,
                dir_x: summary.forward.x,
                dir_z: summary.forward.z,
                enabled: summary.enabled,
                radius: summary.radius,
                goal_x: summary.goal_target.x,
                goal_z: summary.goal_target.z,
            };
            writer
                .serialize(row)
                .map_err(|e| CrowdError::Config(format!("rec write failed: {e}")))?;
            self.rows_written += 1;
        }
        Ok(())
    }

    fn postprocess_simulation(&mut self, _engine: &mut SimulationEngine) -> CrowdResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| CrowdError::Config(format!("rec flush failed: {e}")))?;
            info!(path = %self.path.display(), rows = self.rows_written, "recording written");
        }
        Ok(())
    }
}
