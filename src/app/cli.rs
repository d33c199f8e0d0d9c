//! Command-line argument definitions (clap).

use std::path::PathBuf;

use clap::Parser;

use crate::config::types::ControllerConfig;

/// External tool bound applied with `--tui` when none is configured.
/// Raw mode swallows SIGINT, so `q` is only read between tool calls.
pub const TUI_COMMAND_TIMEOUT_SECS: f64 = 10.0;

#[derive(Parser, Debug, Default)]
#[command(name = "ipmi-fan-curve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Temperature-driven fan curve controller for IPMI servers with an NVIDIA GPU", long_about = None)]
pub struct Args {
    // === Config & Logging ===
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short = 'c', long, value_name = "PATH", help_heading = "Config & Logging")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", help_heading = "Config & Logging")]
    pub log_level: Option<String>,

    // === Control ===
    /// Log fan speed commands instead of sending them
    #[arg(long = "dry-run", help_heading = "Control")]
    pub dry_run: bool,

    /// Read telemetry once, print the snapshot and the level that would be set, then exit
    #[arg(long, help_heading = "Control")]
    pub test: bool,

    // === Display & Status ===
    /// Full-screen terminal dashboard (press q to quit)
    #[arg(long, help_heading = "Display & Status")]
    pub tui: bool,

    /// Status endpoint bind address (default 0.0.0.0:8080)
    #[arg(long, value_name = "ADDR", help_heading = "Display & Status")]
    pub listen: Option<String>,
}

impl Args {
    /// CLI flags take precedence over the environment and the config file.
    pub fn apply_to(&self, config: &mut ControllerConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.dry_run {
            config.control.dry_run = true;
        }
        if let Some(listen) = &self.listen {
            config.status.listen = listen.clone();
        }
        if self.tui && config.control.command_timeout.is_none() {
            config.control.command_timeout = Some(TUI_COMMAND_TIMEOUT_SECS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "ipmi-fan-curve",
            "--config",
            "/etc/fan.json",
            "--log-level",
            "debug",
            "--dry-run",
            "--tui",
            "--listen",
            "127.0.0.1:9000",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/fan.json")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.dry_run);
        assert!(args.tui);
        assert!(!args.test);
        assert_eq!(args.listen.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = ControllerConfig::default();
        config.logging.level = "warn".to_string();

        let args = Args {
            log_level: Some("trace".to_string()),
            dry_run: true,
            listen: Some("127.0.0.1:9000".to_string()),
            ..Args::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.logging.level, "trace");
        assert!(config.control.dry_run);
        assert_eq!(config.status.listen, "127.0.0.1:9000");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = ControllerConfig::default();
        config.control.dry_run = true;

        Args::default().apply_to(&mut config);

        assert!(config.control.dry_run);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.status.listen, "0.0.0.0:8080");
        assert!(config.control.command_timeout.is_none());
    }

    #[test]
    fn test_tui_bounds_external_commands() {
        let mut config = ControllerConfig::default();
        Args { tui: true, ..Args::default() }.apply_to(&mut config);
        assert_eq!(config.control.command_timeout, Some(TUI_COMMAND_TIMEOUT_SECS));

        let mut config = ControllerConfig::default();
        config.control.command_timeout = Some(3.0);
        Args { tui: true, ..Args::default() }.apply_to(&mut config);
        assert_eq!(config.control.command_timeout, Some(3.0));
    }
}
