//! UV severity classification and display styling.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the readings mapped to levels 1 through 9.
/// Anything above the last bound is level 10.
const LEVEL_CEILINGS: [f64; 9] = [2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];

/// Highest severity level
pub const MAX_LEVEL: u8 = 10;

/// Map a UV reading to a severity level in `1..=10`.
///
/// Readings up to 2 are level 1, each further unit adds a level, and
/// everything above 10 is level 10.
pub fn classify_level(uv: f64) -> u8 {
    LEVEL_CEILINGS
        .iter()
        .position(|&ceiling| uv <= ceiling)
        .map_or(MAX_LEVEL, |index| index as u8 + 1)
}

/// Bar color tiers. Breaks at levels 3, 6 and 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTier {
    Green,
    Yellow,
    Orange,
    Red,
}

impl ColorTier {
    pub fn for_level(level: u8) -> Self {
        match level {
            0..=3 => Self::Green,
            4..=6 => Self::Yellow,
            7..=8 => Self::Orange,
            _ => Self::Red,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            Self::Green => "#66cc66",
            Self::Yellow => "#ffcc00",
            Self::Orange => "#ff9900",
            Self::Red => "#ff3300",
        }
    }
}

/// Warning text tiers. Breaks at levels 3, 5, 7 and 10, which do not line up
/// with the color tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl Exposure {
    pub fn for_level(level: u8) -> Self {
        match level {
            0..=3 => Self::Low,
            4..=5 => Self::Moderate,
            6..=7 => Self::High,
            8..=10 => Self::VeryHigh,
            _ => Self::Extreme,
        }
    }

    pub fn warning(&self) -> &'static str {
        match self {
            Self::Low => "Ningún peligro para la mayoría de las personas.",
            Self::Moderate => "Precaución: Usa gafas de sol y protector solar.",
            Self::High => "Alto: Usa protector solar obligatorio, busca la sombra.",
            Self::VeryHigh => "Muy alto: Evita salir al mediodía, cúbrete.",
            Self::Extreme => {
                "Extremo: No salgas, busca sombra, protector solar, y usa ropa protectora."
            }
        }
    }
}

/// Everything the display needs to render the UV bar for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UvStyle {
    pub color: &'static str,
    pub bar_width_percent: u8,
    pub warning: &'static str,
}

impl UvStyle {
    /// CSS-style width, e.g. `"70%"`
    pub fn bar_width(&self) -> String {
        format!("{}%", self.bar_width_percent)
    }
}

/// Display style for a severity level.
pub fn style_for(level: u8) -> UvStyle {
    UvStyle {
        color: ColorTier::for_level(level).hex(),
        bar_width_percent: level.saturating_mul(10),
        warning: Exposure::for_level(level).warning(),
    }
}
