//! Control loop: acquire → parse → aggregate → gate → curve → actuate, forever.
//! Each step awaits the previous one; iterations never overlap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::types::ControlSettings;
use crate::control::aggregator::aggregate;
use crate::control::curve::SpeedLevel;
use crate::control::readiness::{self, LoopState, Readiness, WaitReason};
use crate::control::types::ControlSnapshot;
use crate::display::{format_optional, DashboardView, Presenter};
use crate::hardware::types::{RawTelemetryBlock, TelemetryClass};
use crate::hardware::BmcBackend;
use crate::status::publisher::SnapshotPublisher;
use crate::system::executor::ExecError;
use crate::system::parser::{self, NumericPattern};

/// Longest single sleep between quit checks.
const QUIT_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    Waiting(Vec<WaitReason>),
    Actuated { level: SpeedLevel, max_temp: f64 },
}

/// Raw inputs of one iteration.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub fan: RawTelemetryBlock,
    pub temperature: RawTelemetryBlock,
    pub gpu_temp: Option<i64>,
}

impl Telemetry {
    pub fn snapshot(&self) -> ControlSnapshot {
        aggregate(
            parser::parse_readings(self.temperature.lines(), NumericPattern::DegreesCelsius),
            parser::parse_readings(self.fan.lines(), NumericPattern::Rpm),
            self.gpu_temp,
        )
    }
}

fn is_tool_missing(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ExecError>(), Some(ExecError::ToolMissing { .. }))
}

/// Fetch everything one iteration needs.
///
/// A missing `ipmitool` is fatal. Any other failure (including a missing `nvidia-smi`)
/// becomes "no data" and leaves the gate waiting.
pub async fn acquire(backend: &dyn BmcBackend) -> Result<Telemetry> {
    let fan = fetch_or_empty(backend, TelemetryClass::Fan).await?;
    let temperature = fetch_or_empty(backend, TelemetryClass::BoardTemperature).await?;

    let gpu_temp = match backend.gpu_temperature().await {
        Ok(temp) => temp,
        Err(e) => {
            warn!("GPU temperature unavailable: {}", e);
            None
        }
    };

    Ok(Telemetry { fan, temperature, gpu_temp })
}

async fn fetch_or_empty(backend: &dyn BmcBackend, class: TelemetryClass) -> Result<RawTelemetryBlock> {
    match backend.fetch(class).await {
        Ok(block) => {
            if block.is_empty() {
                debug!("No {} data this iteration", class);
            }
            Ok(block)
        }
        Err(e) if is_tool_missing(&e) => Err(e.context(format!("cannot read {} telemetry", class))),
        Err(e) => {
            warn!("Failed to fetch {} telemetry: {}", class, e);
            Ok(RawTelemetryBlock::empty(class))
        }
    }
}

pub struct ControlLoop {
    backend: Arc<dyn BmcBackend>,
    publisher: SnapshotPublisher,
    presenter: Box<dyn Presenter>,
    update_interval: Duration,
    waiting_delay: Duration,
    state: Option<LoopState>,
    last_level: Option<SpeedLevel>,
}

impl ControlLoop {
    pub fn new(
        backend: Arc<dyn BmcBackend>,
        publisher: SnapshotPublisher,
        presenter: Box<dyn Presenter>,
        settings: &ControlSettings,
    ) -> Self {
        Self {
            backend,
            publisher,
            presenter,
            update_interval: Duration::from_secs_f64(settings.update_interval),
            waiting_delay: Duration::from_secs_f64(settings.waiting_delay),
            state: None,
            last_level: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> Option<LoopState> {
        self.state
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != Some(next) {
            match next {
                LoopState::Running => info!("All temperature sources ready, fan curve active"),
                LoopState::Waiting => info!("Waiting for temperature sources, fan control deferred"),
            }
            self.state = Some(next);
        }
    }

    /// One pass of the loop. Publishes the snapshot in every state; actuates only when ready.
    pub async fn run_iteration(&mut self) -> Result<IterationOutcome> {
        let telemetry = acquire(self.backend.as_ref()).await?;
        let snapshot = telemetry.snapshot();
        self.publisher.publish(snapshot.clone());

        info!(
            "Highest sensor temp: {} | Mean fan speed: {} RPM | GPU temp: {}",
            format_optional(snapshot.highest_board_temp, "C"),
            snapshot.mean_fan_speed,
            format_optional(snapshot.gpu_temp, "C")
        );

        let gate = readiness::evaluate(&snapshot);
        self.transition(gate.state());

        match gate {
            Readiness::Waiting(reasons) => {
                for reason in &reasons {
                    warn!("{}, waiting {:.0} seconds...", reason, self.waiting_delay.as_secs_f64());
                }
                if let Err(e) = self.presenter.waiting(&snapshot, &reasons, self.waiting_delay) {
                    debug!("Presenter failed to show waiting state: {}", e);
                }
                Ok(IterationOutcome::Waiting(reasons))
            }
            Readiness::Ready(max_temp) => {
                let level = SpeedLevel::for_temperature(max_temp);

                let view = DashboardView {
                    snapshot,
                    max_temp,
                    level,
                    temp_lines: parser::relabel_temperature_lines(telemetry.temperature.lines()),
                    fan_lines: telemetry.fan.lines().map(str::to_string).collect(),
                };
                if let Err(e) = self.presenter.render(&view) {
                    debug!("Presenter failed to render: {}", e);
                }

                self.actuate(level, max_temp).await;
                Ok(IterationOutcome::Actuated { level, max_temp })
            }
        }
    }

    async fn actuate(&mut self, level: SpeedLevel, max_temp: f64) {
        if self.last_level == Some(level) {
            debug!("Control signal {}C -> {}", max_temp, level);
        } else {
            info!("Control signal {}C -> {}", max_temp, level);
        }

        // Not retried here; the next iteration recomputes and re-sends.
        if let Err(e) = self.backend.set_speed(level).await {
            warn!("Failed to set fan speed to {}: {}", level, e);
        }
        self.last_level = Some(level);
    }

    /// Sleep up to `total`, returning early with `true` if the presenter asks to quit.
    async fn pause(&mut self, total: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.presenter.quit_requested() {
                return true;
            }
            let remaining = total.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return false;
            }
            tokio::time::sleep(remaining.min(QUIT_POLL)).await;
        }
    }

    /// Run until the presenter requests a stop or a fatal error occurs.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Control loop started (update interval {:.1}s, waiting delay {:.1}s)",
            self.update_interval.as_secs_f64(),
            self.waiting_delay.as_secs_f64()
        );

        loop {
            let delay = match self.run_iteration().await? {
                IterationOutcome::Waiting(_) => self.waiting_delay,
                IterationOutcome::Actuated { .. } => self.update_interval,
            };

            if self.pause(delay).await {
                info!("Stop requested from dashboard");
                return Ok(());
            }
        }
    }
}
