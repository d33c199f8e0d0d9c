//! Stepped fan speed curve: control signal (°C) to one of six duty levels.
//! No hysteresis. Each call evaluates the temperature on its own.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SpeedLevel {
    Level0,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

/// Upper bounds (inclusive) of each band; anything above the last bound is `Level5`.
const SPEED_CURVE: [(f64, SpeedLevel); 5] = [
    (38.0, SpeedLevel::Level0),
    (44.0, SpeedLevel::Level1),
    (50.0, SpeedLevel::Level2),
    (60.0, SpeedLevel::Level3),
    (70.0, SpeedLevel::Level4),
];

impl SpeedLevel {
    #[cfg(test)]
    pub const ALL: [SpeedLevel; 6] = [
        SpeedLevel::Level0,
        SpeedLevel::Level1,
        SpeedLevel::Level2,
        SpeedLevel::Level3,
        SpeedLevel::Level4,
        SpeedLevel::Level5,
    ];

    /// Pick the band for `max_temp`. NaN falls through to `Level5`.
    pub fn for_temperature(max_temp: f64) -> SpeedLevel {
        SPEED_CURVE
            .iter()
            .find(|(upper, _)| max_temp <= *upper)
            .map(|(_, level)| *level)
            .unwrap_or(SpeedLevel::Level5)
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Vendor duty byte sent to the BMC.
    pub fn code(self) -> u8 {
        match self {
            SpeedLevel::Level0 => 0x10,
            SpeedLevel::Level1 => 0x20,
            SpeedLevel::Level2 => 0x30,
            SpeedLevel::Level3 => 0x40,
            SpeedLevel::Level4 => 0x50,
            SpeedLevel::Level5 => 0x70,
        }
    }

    /// `code()` rendered the way `ipmitool raw` takes it ("0x30").
    pub fn code_hex(self) -> String {
        format!("0x{:02x}", self.code())
    }

    pub fn description(self) -> &'static str {
        match self {
            SpeedLevel::Level0 => "lowest",
            SpeedLevel::Level1 => "low",
            SpeedLevel::Level2 => "medium",
            SpeedLevel::Level3 => "medium-high",
            SpeedLevel::Level4 => "high",
            SpeedLevel::Level5 => "maximum",
        }
    }
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} ({}, {})", self.index(), self.description(), self.code_hex())
    }
}
