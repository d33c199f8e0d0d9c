//! Readiness gate: actuation is deferred until both temperature sources report.
//! Re-evaluated from scratch every iteration.

use std::fmt;

use crate::control::types::ControlSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Waiting,
    Running,
}

/// Why an iteration could not reach the speed curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    BoardSensors,
    Gpu,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitReason::BoardSensors => f.write_str("BMC temperature sensors are not ready yet"),
            WaitReason::Gpu => f.write_str("nvidia-smi is not ready yet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// Both sources present; carries the control signal (`max_temp`).
    Ready(f64),
    Waiting(Vec<WaitReason>),
}

impl Readiness {
    pub fn state(&self) -> LoopState {
        match self {
            Readiness::Ready(_) => LoopState::Running,
            Readiness::Waiting(_) => LoopState::Waiting,
        }
    }
}

pub fn evaluate(snapshot: &ControlSnapshot) -> Readiness {
    let mut reasons = Vec::new();
    if snapshot.highest_board_temp.is_none() {
        reasons.push(WaitReason::BoardSensors);
    }
    if snapshot.gpu_temp.is_none() {
        reasons.push(WaitReason::Gpu);
    }

    match snapshot.control_signal() {
        Some(max_temp) if reasons.is_empty() => Readiness::Ready(max_temp),
        _ => Readiness::Waiting(reasons),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::types::SnapshotStatus;

    fn snapshot(board: Option<f64>, gpu: Option<i64>) -> ControlSnapshot {
        let status = if board.is_some() && gpu.is_some() {
            SnapshotStatus::Ok
        } else {
            SnapshotStatus::WaitingForSensors
        };
        ControlSnapshot { highest_board_temp: board, mean_fan_speed: 0, gpu_temp: gpu, status }
    }

    #[test]
    fn test_ready_carries_max_temp() {
        let readiness = evaluate(&snapshot(Some(61.0), Some(55)));
        assert_eq!(readiness, Readiness::Ready(61.0));
        assert_eq!(readiness.state(), LoopState::Running);
    }

    #[test]
    fn test_each_missing_source_is_reported() {
        assert_eq!(
            evaluate(&snapshot(None, Some(40))),
            Readiness::Waiting(vec![WaitReason::BoardSensors])
        );
        assert_eq!(evaluate(&snapshot(Some(40.0), None)), Readiness::Waiting(vec![WaitReason::Gpu]));
        assert_eq!(
            evaluate(&snapshot(None, None)),
            Readiness::Waiting(vec![WaitReason::BoardSensors, WaitReason::Gpu])
        );
    }
}
