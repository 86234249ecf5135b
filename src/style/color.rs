use crate::ScatterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque sRGB color, serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from channel intensities in `[0, 1]`.
    ///
    /// Channels are scaled by 255 and truncated, the way 8-bit lookup tables
    /// are usually produced from float colormaps.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        // The epsilon keeps exact channel values from truncating one step down.
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0 + 1e-9) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }

    /// Channel intensities in `[0, 1]`
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ScatterError;

    /// Accepts `#rrggbb` and the `#rgb` shorthand, with or without the `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScatterError::InvalidOption(format!("'{}' is not a hex color", s));
        let digits = s.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let parse = |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::new(
                parse(&digits[0..2])?,
                parse(&digits[2..4])?,
                parse(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| parse(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ScatterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}
