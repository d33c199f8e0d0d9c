//! Colour bands for dashboard values. Display only; never feeds control decisions.

use crossterm::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Band {
    pub fn color(self) -> Color {
        match self {
            Band::Green => Color::Green,
            Band::Yellow => Color::Yellow,
            Band::Orange => Color::DarkYellow,
            Band::Red => Color::Red,
        }
    }
}

/// 34–38 green, (38,50] yellow, (50,70] orange, anything else (including missing) red.
pub fn temperature_band(value: Option<f64>) -> Band {
    match value {
        Some(t) if (34.0..=38.0).contains(&t) => Band::Green,
        Some(t) if t > 38.0 && t <= 50.0 => Band::Yellow,
        Some(t) if t > 50.0 && t <= 70.0 => Band::Orange,
        _ => Band::Red,
    }
}

/// 2000–5000 green, (5000,9000] yellow, (9000,13000] orange, anything else red.
pub fn fan_band(value: Option<f64>) -> Band {
    match value {
        Some(rpm) if (2000.0..=5000.0).contains(&rpm) => Band::Green,
        Some(rpm) if rpm > 5000.0 && rpm <= 9000.0 => Band::Yellow,
        Some(rpm) if rpm > 9000.0 && rpm <= 13000.0 => Band::Orange,
        _ => Band::Red,
    }
}
