//! Headless presenter: one summary line per iteration on stdout.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;

use super::{format_optional, DashboardView, Presenter};
use crate::control::readiness::WaitReason;
use crate::control::types::ControlSnapshot;

pub struct LinePresenter<W: Write + Send = std::io::Stdout> {
    out: W,
}

impl LinePresenter {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

#[cfg(test)]
impl<W: Write + Send> LinePresenter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn summary_line(view: &DashboardView) -> String {
    format!(
        "Sensor: {} | GPU: {} | Fan: {} RPM",
        format_optional(view.snapshot.highest_board_temp, "C"),
        format_optional(view.snapshot.gpu_temp, "C"),
        view.snapshot.mean_fan_speed
    )
}

impl<W: Write + Send> Presenter for LinePresenter<W> {
    fn render(&mut self, view: &DashboardView) -> Result<()> {
        writeln!(self.out, "{}", summary_line(view))?;
        self.out.flush()?;
        Ok(())
    }

    fn waiting(&mut self, _snapshot: &ControlSnapshot, reasons: &[WaitReason], delay: Duration) -> Result<()> {
        for reason in reasons {
            writeln!(self.out, "{}, waiting {} seconds...", reason, delay.as_secs_f64())?;
        }
        self.out.flush()?;
        Ok(())
    }
}
