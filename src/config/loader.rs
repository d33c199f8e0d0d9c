//! Config file load, environment overrides and validation.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::config::types::{ControllerConfig, SPEED_HEX_PLACEHOLDER};

/// Environment variables recognised on top of the config file.
pub const ENV_IPMI_IP: &str = "IPMI_IP";
pub const ENV_IPMI_USER: &str = "IPMI_USER";
pub const ENV_IPMI_PASS: &str = "IPMI_PASS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Load configuration: defaults, then the optional JSON file, then the process environment.
pub async fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    let mut config = match path {
        Some(p) => {
            let content = tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("Failed to read config: {:?}", p))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config JSON: {:?}", p))?
        }
        None => ControllerConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Overlay environment-sourced values. `lookup` abstracts `std::env::var` for tests.
pub fn apply_env_overrides<F>(config: &mut ControllerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_IPMI_IP) {
        config.ipmi.host = host;
    }
    if let Some(user) = lookup(ENV_IPMI_USER) {
        config.ipmi.user = user;
    }
    if let Some(pass) = lookup(ENV_IPMI_PASS) {
        config.ipmi.password = pass;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
}

pub fn validate_config(config: &ControllerConfig) -> Result<()> {
    let control = &config.control;

    if !(control.update_interval >= 0.0) || !control.update_interval.is_finite() {
        return Err(anyhow!("control.update_interval must be >= 0 (got {})", control.update_interval));
    }
    if !(control.waiting_delay > 0.0) || !control.waiting_delay.is_finite() {
        return Err(anyhow!("control.waiting_delay must be > 0 (got {})", control.waiting_delay));
    }
    if let Some(timeout) = control.command_timeout {
        if !(timeout > 0.0) || !timeout.is_finite() {
            return Err(anyhow!("control.command_timeout must be > 0 when set (got {})", timeout));
        }
    }
    if !config.actuator.set_speed_bytes.contains(SPEED_HEX_PLACEHOLDER) {
        return Err(anyhow!(
            "actuator.set_speed_bytes must contain {} (got '{}')",
            SPEED_HEX_PLACEHOLDER,
            config.actuator.set_speed_bytes
        ));
    }
    if config.ipmi.host.trim().is_empty() {
        return Err(anyhow!("ipmi.host cannot be empty"));
    }

    Ok(())
}
