//! Reduces parsed readings to the control-relevant scalars.

use crate::control::types::{ControlSnapshot, SnapshotStatus};
use crate::hardware::types::SensorReading;

/// Build the iteration snapshot from board temperatures, fan speeds and the GPU temperature.
///
/// - highest board temperature: maximum parsed value, `None` when nothing parsed
/// - mean fan speed: arithmetic mean truncated toward zero, `0` when nothing parsed
/// - status: `Ok` only when both temperatures are present
pub fn aggregate<T, F>(temp_readings: T, fan_readings: F, gpu_temp: Option<i64>) -> ControlSnapshot
where
    T: IntoIterator<Item = SensorReading>,
    F: IntoIterator<Item = SensorReading>,
{
    let highest_board_temp = highest_value(temp_readings);
    let mean_fan_speed = mean_truncated(fan_readings);

    let status = if highest_board_temp.is_some() && gpu_temp.is_some() {
        SnapshotStatus::Ok
    } else {
        SnapshotStatus::WaitingForSensors
    };

    ControlSnapshot {
        highest_board_temp,
        mean_fan_speed,
        gpu_temp,
        status,
    }
}

fn highest_value<I: IntoIterator<Item = SensorReading>>(readings: I) -> Option<f64> {
    readings
        .into_iter()
        .map(|r| r.value)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

fn mean_truncated<I: IntoIterator<Item = SensorReading>>(readings: I) -> u64 {
    let (sum, count) = readings
        .into_iter()
        .fold((0.0_f64, 0_u64), |(sum, count), r| (sum + r.value, count + 1));

    if count == 0 {
        return 0;
    }
    // Float-to-int `as` truncates toward zero (and saturates)
    (sum / count as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::parser::{parse_readings, NumericPattern};

    fn readings(values: &[f64]) -> Vec<SensorReading> {
        values
            .iter()
            .map(|v| SensorReading { value: *v, label: "sensor".to_string() })
            .collect()
    }

    #[test]
    fn test_highest_temperature_is_maximum() {
        let snapshot = aggregate(readings(&[31.0, 47.5, 40.0]), readings(&[]), Some(20));
        assert_eq!(snapshot.highest_board_temp, Some(47.5));
    }

    #[test]
    fn test_no_temperatures_is_null() {
        let snapshot = aggregate(readings(&[]), readings(&[2000.0]), Some(40));
        assert_eq!(snapshot.highest_board_temp, None);
        assert_eq!(snapshot.status, SnapshotStatus::WaitingForSensors);
        assert_eq!(snapshot.control_signal(), None);
    }

    #[test]
    fn test_mean_fan_speed_truncates() {
        let snapshot = aggregate(readings(&[40.0]), readings(&[3000.0, 3001.0]), Some(40));
        assert_eq!(snapshot.mean_fan_speed, 3000);

        let snapshot = aggregate(readings(&[40.0]), readings(&[1000.0, 1000.0, 1001.0]), Some(40));
        assert_eq!(snapshot.mean_fan_speed, 1000);
    }

    #[test]
    fn test_no_fans_is_zero() {
        let snapshot = aggregate(readings(&[40.0]), readings(&[]), Some(40));
        assert_eq!(snapshot.mean_fan_speed, 0);
        assert!(snapshot.is_ready());
    }

    #[test]
    fn test_missing_gpu_keeps_waiting() {
        let snapshot = aggregate(readings(&[40.0]), readings(&[3000.0]), None);
        assert_eq!(snapshot.status, SnapshotStatus::WaitingForSensors);
        assert_eq!(snapshot.highest_board_temp, Some(40.0));
        assert_eq!(snapshot.gpu_temp, None);
    }

    #[test]
    fn test_scenario_from_sensor_text() {
        let temps = ["CPU Temp: 45 degrees C", "Inlet Temp: 30 degrees C"];
        let fans = ["Fan1: 3000 RPM", "Fan2: 5000 RPM"];

        let snapshot = aggregate(
            parse_readings(temps, NumericPattern::DegreesCelsius),
            parse_readings(fans, NumericPattern::Rpm),
            Some(50),
        );

        assert_eq!(snapshot.highest_board_temp, Some(45.0));
        assert_eq!(snapshot.mean_fan_speed, 4000);
        assert_eq!(snapshot.status, SnapshotStatus::Ok);
        assert_eq!(snapshot.control_signal(), Some(50.0));
    }
}
