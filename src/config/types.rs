//! Controller configuration structs and defaults.

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the chosen speed code in raw actuator templates.
pub const SPEED_HEX_PLACEHOLDER: &str = "{{SPEED_HEX}}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub ipmi: IpmiSettings,
    pub gpu: GpuSettings,
    pub control: ControlSettings,
    pub actuator: ActuatorSettings,
    pub status: StatusSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpmiSettings {
    pub host: String,
    pub user: String,
    pub password: String,
    pub interface: String,      // "lanplus" for remote BMCs, "open" for /dev/ipmi0
    pub ipmitool_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuSettings {
    pub nvidia_smi_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub update_interval: f64,          // seconds between RUNNING iterations (0 = back-to-back)
    pub waiting_delay: f64,            // seconds slept while sensors are not ready
    pub command_timeout: Option<f64>,  // None = wait for external tools indefinitely
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorSettings {
    pub set_speed_bytes: String,       // "0x30 0x30 0x02 0xff {{SPEED_HEX}}"
    pub on_exit_bytes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    pub enabled: bool,
    pub listen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub log_file: Option<String>,
}

impl Default for IpmiSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            user: "admin".to_string(),
            password: "admin".to_string(),
            interface: "lanplus".to_string(),
            ipmitool_path: "ipmitool".to_string(),
        }
    }
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            nvidia_smi_path: "nvidia-smi".to_string(),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            update_interval: 1.0,
            waiting_delay: 5.0,
            command_timeout: None,
            dry_run: false,
        }
    }
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            set_speed_bytes: format!("0x30 0x30 0x02 0xff {}", SPEED_HEX_PLACEHOLDER),
            on_exit_bytes: None,
        }
    }
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}
