//! BmcBackend trait definition and IPMI implementation.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;
pub mod ipmi;

pub use ipmi::ipmi_backend::IpmiBackend;

use crate::control::curve::SpeedLevel;
use types::{RawTelemetryBlock, TelemetryClass};

#[async_trait]
pub trait BmcBackend: Send + Sync {
    /// Fetch the raw text listing for a BMC telemetry class (fan or board temperature).
    /// A tool that exits non-zero yields an empty block.
    async fn fetch(&self, class: TelemetryClass) -> Result<RawTelemetryBlock>;

    /// Current GPU core temperature, or None when the GPU report has no reading.
    async fn gpu_temperature(&self) -> Result<Option<i64>>;

    /// Send the vendor raw fan duty command for `level`. Fire-and-forget.
    async fn set_speed(&self, level: SpeedLevel) -> Result<()>;

    /// Run the configured on-exit command, if any.
    async fn restore_on_exit(&self) -> Result<()>;
}
