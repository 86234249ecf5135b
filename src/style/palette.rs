//! Color palettes used to paint markers
//!
//! Continuous scales are described by piecewise-linear control points and
//! sampled once into 256-entry lookup tables. Categories use a fixed
//! 8-color qualitative palette.

use crate::core::constants::{CONTINUOUS_PALETTE_SIZE, NAN_COLOR};
use crate::prelude::HashMap;
use crate::style::color::Rgb;
use crate::ScatterError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualitative palette for categorical columns (ColorBrewer Set2).
pub const SET2: [Rgb; 8] = [
    Rgb::new(0x66, 0xc2, 0xa5),
    Rgb::new(0xfc, 0x8d, 0x62),
    Rgb::new(0x8d, 0xa0, 0xcb),
    Rgb::new(0xe7, 0x8a, 0xc3),
    Rgb::new(0xa6, 0xd8, 0x54),
    Rgb::new(0xff, 0xd9, 0x2f),
    Rgb::new(0xe5, 0xc4, 0x94),
    Rgb::new(0xb3, 0xb3, 0xb3),
];

/// Palette slot of the category seen at position `ordinal` (0-based).
pub fn category_slot(ordinal: usize) -> usize {
    ordinal % SET2.len()
}

/// Color of the category seen at position `ordinal`.
pub fn category_color(ordinal: usize) -> Rgb {
    SET2[category_slot(ordinal)]
}

/// Continuous color scales offered for numeric color columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorScale {
    #[serde(rename = "jet")]
    Jet,
    #[serde(rename = "coolwarm")]
    Coolwarm,
    #[serde(rename = "RdYlGn")]
    RdYlGn,
    #[serde(rename = "jet_r")]
    JetReversed,
    #[serde(rename = "coolwarm_r")]
    CoolwarmReversed,
}

/// Per-channel `(position, intensity)` control points.
type Segments = &'static [(f64, f64)];

enum Gradient {
    Channels { red: Segments, green: Segments, blue: Segments },
    /// Colors evenly spaced over `[0, 1]`
    Anchors(&'static [Rgb]),
}

const JET: Gradient = Gradient::Channels {
    red: &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
    green: &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ],
    blue: &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
};

// Moreland's diverging map
const COOLWARM: Gradient = Gradient::Anchors(&[
    Rgb::new(59, 76, 192),
    Rgb::new(98, 130, 234),
    Rgb::new(141, 176, 254),
    Rgb::new(184, 208, 249),
    Rgb::new(221, 221, 221),
    Rgb::new(245, 196, 173),
    Rgb::new(244, 154, 123),
    Rgb::new(222, 96, 77),
    Rgb::new(180, 4, 38),
]);

const RD_YL_GN: Gradient = Gradient::Anchors(&[
    Rgb::new(0xa5, 0x00, 0x26),
    Rgb::new(0xd7, 0x30, 0x27),
    Rgb::new(0xf4, 0x6d, 0x43),
    Rgb::new(0xfd, 0xae, 0x61),
    Rgb::new(0xfe, 0xe0, 0x8b),
    Rgb::new(0xff, 0xff, 0xbf),
    Rgb::new(0xd9, 0xef, 0x8b),
    Rgb::new(0xa6, 0xd9, 0x6a),
    Rgb::new(0x66, 0xbd, 0x63),
    Rgb::new(0x1a, 0x98, 0x50),
    Rgb::new(0x00, 0x68, 0x37),
]);

static PALETTES: Lazy<HashMap<ColorScale, Vec<Rgb>>> = Lazy::new(|| {
    ColorScale::ALL
        .iter()
        .map(|scale| (*scale, scale.sample(CONTINUOUS_PALETTE_SIZE)))
        .collect()
});

impl ColorScale {
    pub const ALL: [ColorScale; 5] = [
        ColorScale::Jet,
        ColorScale::Coolwarm,
        ColorScale::RdYlGn,
        ColorScale::JetReversed,
        ColorScale::CoolwarmReversed,
    ];

    /// Name as shown to the user and accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jet => "jet",
            Self::Coolwarm => "coolwarm",
            Self::RdYlGn => "RdYlGn",
            Self::JetReversed => "jet_r",
            Self::CoolwarmReversed => "coolwarm_r",
        }
    }

    fn gradient(&self) -> (&'static Gradient, bool) {
        match self {
            Self::Jet => (&JET, false),
            Self::Coolwarm => (&COOLWARM, false),
            Self::RdYlGn => (&RD_YL_GN, false),
            Self::JetReversed => (&JET, true),
            Self::CoolwarmReversed => (&COOLWARM, true),
        }
    }

    /// Color at position `t` in `[0, 1]` (clamped)
    pub fn color_at(&self, t: f64) -> Rgb {
        let (gradient, reversed) = self.gradient();
        let t = t.clamp(0.0, 1.0);
        let t = if reversed { 1.0 - t } else { t };

        match gradient {
            Gradient::Channels { red, green, blue } => Rgb::from_unit(
                interpolate(red, t),
                interpolate(green, t),
                interpolate(blue, t),
            ),
            Gradient::Anchors(colors) => {
                let last = colors.len() - 1;
                let position = t * last as f64;
                let index = (position.floor() as usize).min(last - 1);
                let local = position - index as f64;
                let (r0, g0, b0) = colors[index].to_unit();
                let (r1, g1, b1) = colors[index + 1].to_unit();
                Rgb::from_unit(
                    r0 + (r1 - r0) * local,
                    g0 + (g1 - g0) * local,
                    b0 + (b1 - b0) * local,
                )
            }
        }
    }

    /// Samples `n` evenly spaced colors, first and last included
    pub fn sample(&self, n: usize) -> Vec<Rgb> {
        match n {
            0 => Vec::new(),
            1 => vec![self.color_at(0.0)],
            _ => (0..n)
                .map(|i| self.color_at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }

    /// The cached 256-entry lookup table
    pub fn palette(&self) -> &'static [Rgb] {
        PALETTES
            .get(self)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::Jet
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScale {
    type Err = ScatterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|scale| scale.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                ScatterError::InvalidOption(format!(
                    "unknown color scale '{}', expected one of: {}",
                    s,
                    Self::ALL.map(|scale| scale.name()).join(", ")
                ))
            })
    }
}

fn interpolate(segments: Segments, t: f64) -> f64 {
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if t <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (t - x0) / (x1 - x0);
        }
    }
    segments.last().map(|(_, y)| *y).unwrap_or(0.0)
}

/// Maps numbers onto a palette between `low` and `high`.
///
/// Values below `low` take the first entry, values above `high` the last.
/// Missing values take [`NAN_COLOR`].
#[derive(Debug, Clone)]
pub struct ColorMapper {
    palette: &'static [Rgb],
    low: f64,
    high: f64,
    nan_color: Rgb,
}

impl ColorMapper {
    pub fn new(scale: ColorScale, low: f64, high: f64) -> Self {
        Self {
            palette: scale.palette(),
            low,
            high,
            nan_color: NAN_COLOR.parse().unwrap_or(Rgb::new(128, 128, 128)),
        }
    }

    /// Palette index for `value`, `None` when the value is missing
    pub fn index(&self, value: f64) -> Option<usize> {
        if value.is_nan() || self.palette.is_empty() {
            return None;
        }
        let last = self.palette.len() - 1;
        if self.high <= self.low {
            return Some(0);
        }
        let t = (value - self.low) / (self.high - self.low);
        let index = (t * self.palette.len() as f64).floor();
        Some((index.max(0.0) as usize).min(last))
    }

    pub fn map(&self, value: f64) -> Rgb {
        self.index(value)
            .map(|i| self.palette[i])
            .unwrap_or(self.nan_color)
    }
}
