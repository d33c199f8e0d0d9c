//! Control snapshot published to the status endpoint and the dashboard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotStatus {
    #[serde(rename = "waiting_for_sensors")]
    WaitingForSensors,
    #[serde(rename = "OK")]
    Ok,
}

/// Aggregated per-iteration state. `status == Ok` implies both temperatures are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    #[serde(rename = "highest_sensor_temp")]
    pub highest_board_temp: Option<f64>,
    pub mean_fan_speed: u64,
    pub gpu_temp: Option<i64>,
    pub status: SnapshotStatus,
}

impl ControlSnapshot {
    /// Snapshot before the first iteration has completed.
    pub fn initial() -> Self {
        Self {
            highest_board_temp: None,
            mean_fan_speed: 0,
            gpu_temp: None,
            status: SnapshotStatus::WaitingForSensors,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == SnapshotStatus::Ok
    }

    /// `max(highest_board_temp, gpu_temp)`; only defined once both sources are ready.
    pub fn control_signal(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let board = self.highest_board_temp?;
        let gpu = self.gpu_temp? as f64;
        Some(board.max(gpu))
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
