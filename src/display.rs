//! Presentation strategies for the control loop, selected once at startup.

use std::time::Duration;

use anyhow::Result;

pub mod colors;
pub mod line;
pub mod terminal;

pub use line::LinePresenter;
pub use terminal::TerminalPresenter;

use crate::control::curve::SpeedLevel;
use crate::control::readiness::WaitReason;
use crate::control::types::ControlSnapshot;

/// Everything a presenter may show for one RUNNING iteration.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub snapshot: ControlSnapshot,
    pub max_temp: f64,
    pub level: SpeedLevel,
    /// Temperature lines after cosmetic relabeling (Board Inlet, CPU_n, ...)
    pub temp_lines: Vec<String>,
    pub fan_lines: Vec<String>,
}

pub trait Presenter: Send {
    fn render(&mut self, view: &DashboardView) -> Result<()>;

    fn waiting(&mut self, _snapshot: &ControlSnapshot, _reasons: &[WaitReason], _delay: Duration) -> Result<()> {
        Ok(())
    }

    /// Polled between iterations; `true` stops the loop.
    fn quit_requested(&mut self) -> bool {
        false
    }
}

/// Format an optional reading the way the dashboard and log line show it.
pub fn format_optional<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "N/A".to_string(),
    }
}
