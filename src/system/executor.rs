//! External tool executor for ipmitool and nvidia-smi.
//! Non-zero exit is reported as "no data" (empty stdout), never as an error.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::types::IpmiSettings;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },

    #[error("failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {secs:.1}s")]
    TimedOut { tool: String, secs: f64 },
}

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
}

impl ToolOutput {
    /// Trimmed stdout on success, empty text otherwise.
    pub fn text_or_empty(self) -> String {
        if self.success {
            self.stdout.trim().to_string()
        } else {
            String::new()
        }
    }
}

/// Build an ipmitool Command with the connection flags from settings.
pub fn build_ipmitool_command(settings: &IpmiSettings) -> std::process::Command {
    let mut cmd = std::process::Command::new(&settings.ipmitool_path);

    if settings.interface == "open" {
        // Local BMC via /dev/ipmi0, no credentials
        cmd.args(["-I", "open"]);
    } else {
        cmd.args([
            "-I", settings.interface.as_str(),
            "-H", settings.host.as_str(),
            "-U", settings.user.as_str(),
            "-P", settings.password.as_str(),
        ]);
    }

    cmd
}

/// Spawn `cmd`, wait for it (optionally bounded) and capture stdout.
pub async fn run_command(
    cmd: std::process::Command,
    timeout: Option<Duration>,
) -> Result<ToolOutput, ExecError> {
    let tool = cmd.get_program().to_string_lossy().to_string();
    let mut cmd = tokio::process::Command::from(cmd);
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    let pending = cmd.output();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, pending).await {
            Ok(result) => result,
            Err(_) => {
                return Err(ExecError::TimedOut { tool, secs: limit.as_secs_f64() });
            }
        },
        None => pending.await,
    };

    let output = result.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ExecError::ToolMissing { tool: tool.clone() }
        } else {
            ExecError::Spawn { tool: tool.clone(), source }
        }
    })?;

    if !output.status.success() {
        debug!(
            "{} exited with {}: {}",
            tool,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
    })
}

/// Execute `ipmitool sdr type <sensor_type>` and return the trimmed listing.
pub async fn run_ipmitool_sdr_type(
    settings: &IpmiSettings,
    sensor_type: &str,
    timeout: Option<Duration>,
) -> Result<String, ExecError> {
    let mut cmd = build_ipmitool_command(settings);
    cmd.args(["sdr", "type", sensor_type]);

    trace!("Executing: ipmitool sdr type {}", sensor_type);

    Ok(run_command(cmd, timeout).await?.text_or_empty())
}

/// Execute `ipmitool raw <bytes>` for the vendor fan duty command.
pub async fn run_ipmitool_raw(
    settings: &IpmiSettings,
    bytes: &str,
    timeout: Option<Duration>,
) -> Result<ToolOutput, ExecError> {
    let mut cmd = build_ipmitool_command(settings);
    cmd.arg("raw");
    for byte in bytes.split_whitespace() {
        cmd.arg(byte);
    }

    debug!("Executing: ipmitool raw {}", bytes);

    run_command(cmd, timeout).await
}

/// Execute `nvidia-smi -q -d TEMPERATURE` and return the full report.
pub async fn run_nvidia_smi_temperature(
    nvidia_smi_path: &str,
    timeout: Option<Duration>,
) -> Result<String, ExecError> {
    let mut cmd = std::process::Command::new(nvidia_smi_path);
    cmd.args(["-q", "-d", "TEMPERATURE"]);

    trace!("Executing: nvidia-smi -q -d TEMPERATURE");

    Ok(run_command(cmd, timeout).await?.text_or_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &std::process::Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_lanplus_command_carries_credentials() {
        let settings = IpmiSettings {
            host: "10.1.1.5".to_string(),
            user: "ops".to_string(),
            password: "s3cret".to_string(),
            ..IpmiSettings::default()
        };
        let cmd = build_ipmitool_command(&settings);
        assert_eq!(cmd.get_program(), "ipmitool");
        assert_eq!(
            args_of(&cmd),
            vec!["-I", "lanplus", "-H", "10.1.1.5", "-U", "ops", "-P", "s3cret"]
        );
    }

    #[test]
    fn test_open_interface_skips_credentials() {
        let settings = IpmiSettings { interface: "open".to_string(), ..IpmiSettings::default() };
        assert_eq!(args_of(&build_ipmitool_command(&settings)), vec!["-I", "open"]);
    }

    #[test]
    fn test_failed_tool_output_is_empty_block() {
        let failed = ToolOutput { success: false, stdout: "partial garbage".to_string() };
        assert_eq!(failed.text_or_empty(), "");

        let ok = ToolOutput { success: true, stdout: "\n  FAN1 | 3000 RPM  \n".to_string() };
        assert_eq!(ok.text_or_empty(), "FAN1 | 3000 RPM");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let cmd = std::process::Command::new("false");
        let output = run_command(cmd, None).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.text_or_empty(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_captured() {
        let mut cmd = std::process::Command::new("echo");
        cmd.arg("42 degrees C");
        let output = run_command(cmd, None).await.unwrap();
        assert!(output.success);
        assert_eq!(output.text_or_empty(), "42 degrees C");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let cmd = std::process::Command::new("definitely-not-a-real-ipmitool-binary");
        match run_command(cmd, None).await {
            Err(ExecError::ToolMissing { tool }) => {
                assert_eq!(tool, "definitely-not-a-real-ipmitool-binary")
            }
            other => panic!("expected ToolMissing, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_bounds_slow_tools() {
        let mut cmd = std::process::Command::new("sleep");
        cmd.arg("5");
        match run_command(cmd, Some(Duration::from_millis(50))).await {
            Err(ExecError::TimedOut { tool, .. }) => assert_eq!(tool, "sleep"),
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }
}
