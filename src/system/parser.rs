//! Sensor text parser.
//! Pulls numeric readings out of free-form `ipmitool sdr type` listings and the
//! `nvidia-smi -q -d TEMPERATURE` report. Lines that do not match are skipped.

use std::sync::OnceLock;

use regex::Regex;

use crate::hardware::types::SensorReading;

/// A labelled numeric pattern: `<number> <unit>` with word boundaries on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPattern {
    /// `"<number> degrees C"`
    DegreesCelsius,
    /// `"<number> RPM"`
    Rpm,
}

impl NumericPattern {
    fn regex(self) -> Option<&'static Regex> {
        static DEGREES: OnceLock<Option<Regex>> = OnceLock::new();
        static RPM: OnceLock<Option<Regex>> = OnceLock::new();

        match self {
            NumericPattern::DegreesCelsius => DEGREES.get_or_init(|| build_unit_regex("degrees C")),
            NumericPattern::Rpm => RPM.get_or_init(|| build_unit_regex("RPM")),
        }
        .as_ref()
    }

    /// Extract the first number in `line` that is followed by this pattern's unit.
    pub fn extract(self, line: &str) -> Option<f64> {
        self.regex()?
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

fn build_unit_regex(unit: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b(\d+\.?\d*) {}\b", regex::escape(unit))).ok()
}

/// Lazily parse `lines` into readings, silently skipping lines without a match.
pub fn parse_readings<'a, I>(lines: I, pattern: NumericPattern) -> impl Iterator<Item = SensorReading> + 'a
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    lines.into_iter().filter_map(move |line| {
        pattern.extract(line).map(|value| SensorReading {
            value,
            label: sensor_label(line),
        })
    })
}

/// Sensor name column of an SDR row ("CPU Temp | 0Eh | ok | 3.1 | 45 degrees C" -> "CPU Temp").
fn sensor_label(line: &str) -> String {
    line.split('|').next().unwrap_or(line).trim().to_string()
}

/// Display-only relabeling of temperature lines: inlet/exhaust become board sensors,
/// every other `Temp` line is numbered as a CPU (`CPU_1 Temp`, `CPU_2 Temp`, ...).
/// Numbering restarts on every call.
pub fn relabel_temperature_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut cpu_count = 0;

    lines
        .into_iter()
        .map(|line| {
            if line.contains("Inlet Temp") {
                line.replace("Inlet Temp", "Board Inlet Temp")
            } else if line.contains("Exhaust Temp") {
                line.replace("Exhaust Temp", "Board Exhaust Temp")
            } else if line.contains("Temp") {
                cpu_count += 1;
                line.replace("Temp", &format!("CPU_{} Temp", cpu_count))
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Resolve `GPU Current Temp : <int> C` from an nvidia-smi temperature report.
pub fn parse_gpu_current_temp(report: &str) -> Option<i64> {
    static GPU_TEMP: OnceLock<Option<Regex>> = OnceLock::new();
    let re = GPU_TEMP
        .get_or_init(|| Regex::new(r"GPU Current Temp\s+:\s+(\d+) C").ok())
        .as_ref()?;

    re.captures(report)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
