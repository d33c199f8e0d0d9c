//! IPMI backend: implements BmcBackend with ipmitool (telemetry and actuation)
//! and nvidia-smi (GPU temperature).

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::types::{ActuatorSettings, ControllerConfig, GpuSettings, IpmiSettings, SPEED_HEX_PLACEHOLDER};
use crate::control::curve::SpeedLevel;
use crate::hardware::BmcBackend;
use crate::hardware::types::{RawTelemetryBlock, TelemetryClass};
use crate::system::executor;
use crate::system::parser;

pub struct IpmiBackend {
    ipmi: IpmiSettings,
    gpu: GpuSettings,
    actuator: ActuatorSettings,
    command_timeout: Option<Duration>,
    dry_run: bool,
}

impl IpmiBackend {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            ipmi: config.ipmi.clone(),
            gpu: config.gpu.clone(),
            actuator: config.actuator.clone(),
            command_timeout: config.control.command_timeout.map(Duration::from_secs_f64),
            dry_run: config.control.dry_run,
        }
    }

    async fn send_raw(&self, bytes: &str) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Would execute: ipmitool raw {}", bytes);
            return Ok(());
        }

        let output = executor::run_ipmitool_raw(&self.ipmi, bytes, self.command_timeout).await?;
        if !output.success {
            // Exit status is not acted on; the next iteration re-sends a fresh level.
            debug!("ipmitool raw {} reported failure", bytes);
        }
        Ok(())
    }
}

/// Substitute the speed code into a raw command template.
pub fn render_speed_command(template: &str, level: SpeedLevel) -> String {
    template.replace(SPEED_HEX_PLACEHOLDER, &level.code_hex())
}

#[async_trait]
impl BmcBackend for IpmiBackend {
    async fn fetch(&self, class: TelemetryClass) -> Result<RawTelemetryBlock> {
        let text = match class.sdr_type() {
            Some(sdr_type) => {
                executor::run_ipmitool_sdr_type(&self.ipmi, sdr_type, self.command_timeout).await?
            }
            None => {
                executor::run_nvidia_smi_temperature(&self.gpu.nvidia_smi_path, self.command_timeout).await?
            }
        };

        debug!("Fetched {} block ({} lines)", class, text.lines().count());
        Ok(RawTelemetryBlock::new(class, text))
    }

    async fn gpu_temperature(&self) -> Result<Option<i64>> {
        let block = self.fetch(TelemetryClass::GpuTemperature).await?;
        Ok(parser::parse_gpu_current_temp(&block.text))
    }

    async fn set_speed(&self, level: SpeedLevel) -> Result<()> {
        let bytes = render_speed_command(&self.actuator.set_speed_bytes, level);
        self.send_raw(&bytes).await
    }

    async fn restore_on_exit(&self) -> Result<()> {
        let Some(bytes) = self.actuator.on_exit_bytes.as_deref() else {
            debug!("No on-exit command configured");
            return Ok(());
        };

        if bytes.trim().is_empty() {
            return Err(anyhow!("actuator.on_exit_bytes is empty"));
        }

        info!("Sending on-exit command: ipmitool raw {}", bytes);
        self.send_raw(bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_template() {
        let template = ActuatorSettings::default().set_speed_bytes;
        assert_eq!(render_speed_command(&template, SpeedLevel::Level0), "0x30 0x30 0x02 0xff 0x10");
        assert_eq!(render_speed_command(&template, SpeedLevel::Level5), "0x30 0x30 0x02 0xff 0x70");
    }

    #[test]
    fn test_render_custom_template() {
        let template = "0x3a 0x01 {{SPEED_HEX}} {{SPEED_HEX}}";
        assert_eq!(render_speed_command(template, SpeedLevel::Level3), "0x3a 0x01 0x40 0x40");
    }

    #[tokio::test]
    async fn test_dry_run_never_spawns_ipmitool() {
        let mut config = ControllerConfig::default();
        config.control.dry_run = true;
        config.ipmi.ipmitool_path = "definitely-not-a-real-ipmitool-binary".to_string();
        config.actuator.on_exit_bytes = Some("0x30 0x30 0x01 0x01".to_string());

        let backend = IpmiBackend::new(&config);
        assert!(backend.set_speed(SpeedLevel::Level2).await.is_ok());
        assert!(backend.restore_on_exit().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_ipmitool_surfaces_on_fetch() {
        let mut config = ControllerConfig::default();
        config.ipmi.ipmitool_path = "definitely-not-a-real-ipmitool-binary".to_string();

        let backend = IpmiBackend::new(&config);
        let err = backend.fetch(TelemetryClass::Fan).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<executor::ExecError>(),
            Some(executor::ExecError::ToolMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_restore_without_command_is_noop() {
        let backend = IpmiBackend::new(&ControllerConfig::default());
        assert!(backend.restore_on_exit().await.is_ok());
    }
}
