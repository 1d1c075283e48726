use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Brightness below which a color reads as dark
const DARK_BRIGHTNESS: f64 = 0.2;
/// Brightness above which a color reads as light
const LIGHT_BRIGHTNESS: f64 = 0.8;
/// How far one channel must lead both others to dominate
const DOMINANCE_MARGIN: i32 = 50;
/// Red/green spread a yellow must stay under
const YELLOW_SPREAD: i32 = 20;
/// Adjacent-channel spread a gray must stay under
const GRAY_SPREAD: i32 = 30;

/// Coarse color label used in prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Dark,
    Light,
    Red,
    Green,
    Blue,
    Yellow,
    Gray,
    Colorful,
}

impl ColorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Gray => "gray",
            Self::Colorful => "colorful",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`. Leading `#` characters are stripped and the rest must be
    /// exactly six hex digits.
    pub fn from_hex(hex: &str) -> EngineResult<Self> {
        let digits = hex.trim_start_matches('#');

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EngineError::InvalidInput(format!(
                "Invalid color '{}': expected #RRGGBB",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|e| {
                EngineError::InvalidInput(format!("Invalid color '{}': {}", hex, e))
            })
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn classify(&self) -> ColorName {
        classify_rgb(self.r, self.g, self.b)
    }
}

/// Map an RGB triple onto a coarse color name.
///
/// Checks run in a fixed order and the first match wins: brightness extremes,
/// then single-channel dominance (red, green, blue), then yellow, then gray.
pub fn classify_rgb(r: u8, g: u8, b: u8) -> ColorName {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let brightness = f64::from(r.max(g).max(b)) / 255.0;

    if brightness < DARK_BRIGHTNESS {
        return ColorName::Dark;
    }
    if brightness > LIGHT_BRIGHTNESS {
        return ColorName::Light;
    }

    if r > g + DOMINANCE_MARGIN && r > b + DOMINANCE_MARGIN {
        return ColorName::Red;
    }
    if g > r + DOMINANCE_MARGIN && g > b + DOMINANCE_MARGIN {
        return ColorName::Green;
    }
    if b > r + DOMINANCE_MARGIN && b > g + DOMINANCE_MARGIN {
        return ColorName::Blue;
    }

    if r > b && g > b && (r - g).abs() < YELLOW_SPREAD {
        return ColorName::Yellow;
    }
    if (r - g).abs() < GRAY_SPREAD && (g - b).abs() < GRAY_SPREAD {
        return ColorName::Gray;
    }

    ColorName::Colorful
}
