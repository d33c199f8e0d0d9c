//! Telemetry data types: telemetry classes, raw blocks and parsed readings.

use std::fmt;

/// Source of one raw telemetry block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryClass {
    Fan,
    BoardTemperature,
    GpuTemperature,
}

impl TelemetryClass {
    /// `ipmitool sdr type <...>` argument for BMC-backed classes.
    pub fn sdr_type(self) -> Option<&'static str> {
        match self {
            TelemetryClass::Fan => Some("fan"),
            TelemetryClass::BoardTemperature => Some("temperature"),
            TelemetryClass::GpuTemperature => None,
        }
    }
}

impl fmt::Display for TelemetryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TelemetryClass::Fan => "fan",
            TelemetryClass::BoardTemperature => "temperature",
            TelemetryClass::GpuTemperature => "gpu_temperature",
        };
        f.write_str(name)
    }
}

/// Multi-line text captured from one external tool run. Empty when the tool produced no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTelemetryBlock {
    pub class: TelemetryClass,
    pub text: String,
}

impl RawTelemetryBlock {
    pub fn new(class: TelemetryClass, text: impl Into<String>) -> Self {
        Self { class, text: text.into() }
    }

    pub fn empty(class: TelemetryClass) -> Self {
        Self::new(class, String::new())
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One parsed numeric value (°C or RPM) and the sensor name it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub value: f64,
    pub label: String,
}
