//! Map configuration record
//!
//! Everything the user can choose about a map lives in [`MapConfig`]. The
//! record is built once per run (from defaults, a builder, the command line or
//! a JSON file), validated against the table, and then only read.

use crate::core::constants::{
    DEFAULT_COLOR, MARKER_DEFAULT_OPACITY, MARKER_DEFAULT_SIZE, MARKER_MAX_SIZE,
    MARKER_MIN_SIZE, OUTLINE_MAX_WIDTH, OUTLINE_MIN_WIDTH,
};
use crate::data::table::Table;
use crate::style::{color::Rgb, palette::ColorScale};
use crate::tiles::source::BasemapStyle;
use crate::{Result, ScatterError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which chart family draws the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Tile-based chart over web-Mercator projected coordinates
    Tile,
    /// Mapbox-style chart over geographic coordinates with an automatic view
    Mapbox,
}

impl Default for Backend {
    fn default() -> Self {
        Self::Tile
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tile => "tile",
            Self::Mapbox => "mapbox",
        })
    }
}

impl FromStr for Backend {
    type Err = ScatterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tile" => Ok(Self::Tile),
            "mapbox" => Ok(Self::Mapbox),
            other => Err(ScatterError::InvalidOption(format!(
                "unknown backend '{}', expected 'tile' or 'mapbox'",
                other
            ))),
        }
    }
}

/// Closed numeric interval `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Clamps `value` into the range; missing values stay missing
    pub fn clip(&self, value: f64) -> f64 {
        if value.is_nan() {
            value
        } else {
            value.clamp(self.low, self.high)
        }
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(ScatterError::InvalidRange(format!(
                "{} bounds must be finite, got [{}, {}]",
                what, self.low, self.high
            )));
        }
        if self.low > self.high {
            return Err(ScatterError::InvalidRange(format!(
                "{} lower bound {} exceeds upper bound {}",
                what, self.low, self.high
            )));
        }
        Ok(())
    }
}

impl FromStr for ValueRange {
    type Err = ScatterError;

    /// Parses `LOW,HIGH`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ScatterError::InvalidRange(format!("expected LOW,HIGH, got '{}'", s));
        let (low, high) = s.split_once(',').ok_or_else(invalid)?;
        let low = low.trim().parse::<f64>().map_err(|_| invalid())?;
        let high = high.trim().parse::<f64>().map_err(|_| invalid())?;
        Ok(Self::new(low, high))
    }
}

/// Marker fill color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorOptions {
    /// Every marker gets the same color
    Unique { color: Rgb },
    /// Color follows a column. Numeric columns go through `scale`, clipped to
    /// `range` (the column's own extent when unset); text columns are binned
    /// into categories and ignore both.
    Variable {
        column: String,
        #[serde(default)]
        scale: ColorScale,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<ValueRange>,
    },
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self::Unique {
            color: DEFAULT_COLOR.parse().unwrap_or(Rgb::new(0xcb, 0x26, 0x49)),
        }
    }
}

/// Marker diameter in screen pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizeOptions {
    Unique { size: f64 },
    /// Sizes interpolated linearly between `range.low` and `range.high`
    Variable { column: String, range: ValueRange },
}

impl Default for SizeOptions {
    fn default() -> Self {
        Self::Unique {
            size: MARKER_DEFAULT_SIZE,
        }
    }
}

/// Marker outline; absent means no outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineOptions {
    /// Outline color override; the fill color is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    pub width: f64,
    pub opacity: f64,
}

/// The full set of user choices for one map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub color: ColorOptions,
    /// Fill opacity in `[0, 1]`
    pub opacity: f64,
    #[serde(default)]
    pub size: SizeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<OutlineOptions>,
    #[serde(default)]
    pub hover_columns: Vec<String>,
    pub latitude_column: String,
    pub longitude_column: String,
    #[serde(default)]
    pub basemap: BasemapStyle,
}

impl MapConfig {
    /// The initial state of the form for `table`: single color and size, no
    /// outline, every column shown on hover, and lat/lon guessed from the
    /// column names.
    pub fn for_table(table: &Table) -> Self {
        let names = table.column_names();
        Self {
            backend: Backend::default(),
            color: ColorOptions::default(),
            opacity: MARKER_DEFAULT_OPACITY,
            size: SizeOptions::default(),
            outline: None,
            hover_columns: names.iter().map(|name| name.to_string()).collect(),
            latitude_column: guess_latitude_column(&names).unwrap_or_default(),
            longitude_column: guess_longitude_column(&names).unwrap_or_default(),
            basemap: BasemapStyle::default(),
        }
    }

    /// Checks every option against its bounds and every column reference
    /// against `table`.
    pub fn validate(&self, table: &Table) -> Result<()> {
        table.numeric(&self.latitude_column)?;
        table.numeric(&self.longitude_column)?;

        if let ColorOptions::Variable { column, range, .. } = &self.color {
            let column = table.column(column)?;
            if let (true, Some(range)) = (column.is_numeric(), range) {
                range.validate("color range")?;
            }
        }

        check_unit_interval("opacity", self.opacity)?;

        match &self.size {
            SizeOptions::Unique { size } => check_marker_size(*size)?,
            SizeOptions::Variable { column, range } => {
                table.numeric(column)?;
                range.validate("size range")?;
                check_marker_size(range.low)?;
                check_marker_size(range.high)?;
            }
        }

        if let Some(outline) = &self.outline {
            if !(OUTLINE_MIN_WIDTH..=OUTLINE_MAX_WIDTH).contains(&outline.width) {
                return Err(ScatterError::InvalidRange(format!(
                    "outline width {} outside [{}, {}]",
                    outline.width, OUTLINE_MIN_WIDTH, OUTLINE_MAX_WIDTH
                )));
            }
            check_unit_interval("outline opacity", outline.opacity)?;
        }

        for column in &self.hover_columns {
            table.column(column)?;
        }

        if !self.basemap.supports(self.backend) {
            let choices: Vec<&str> = BasemapStyle::available(self.backend)
                .iter()
                .map(|style| style.token())
                .collect();
            return Err(ScatterError::InvalidOption(format!(
                "basemap '{}' is not available for the {} backend, expected one of: {}",
                self.basemap,
                self.backend,
                choices.join(", ")
            )));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn check_unit_interval(what: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScatterError::InvalidRange(format!(
            "{} {} outside [0, 1]",
            what, value
        )))
    }
}

fn check_marker_size(size: f64) -> Result<()> {
    if (MARKER_MIN_SIZE..=MARKER_MAX_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(ScatterError::InvalidRange(format!(
            "marker size {} outside [{}, {}]",
            size, MARKER_MIN_SIZE, MARKER_MAX_SIZE
        )))
    }
}

/// Last column whose name contains "lat", else the first column
pub fn guess_latitude_column(names: &[&str]) -> Option<String> {
    guess_column(names, |name| name.contains("lat"))
}

/// Last column whose name contains "lon" or "lng", else the first column
pub fn guess_longitude_column(names: &[&str]) -> Option<String> {
    guess_column(names, |name| name.contains("lon") || name.contains("lng"))
}

fn guess_column(names: &[&str], matches: impl Fn(&str) -> bool) -> Option<String> {
    names
        .iter()
        .rev()
        .find(|name| matches(&name.to_lowercase()))
        .or_else(|| names.first())
        .map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Column;

    fn sample_table() -> Table {
        Table::from_columns(vec![
            Column::text("city", vec![Some("Lyon"), Some("Nice")]),
            Column::numeric("Latitude", vec![45.76, 43.70]),
            Column::numeric("lng", vec![4.83, 7.26]),
            Column::numeric("inhabitants", vec![500_000.0, 340_000.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults_for_table() {
        let config = MapConfig::for_table(&sample_table());
        assert_eq!(config.latitude_column, "Latitude");
        assert_eq!(config.longitude_column, "lng");
        assert_eq!(config.hover_columns.len(), 4);
        assert_eq!(config.opacity, MARKER_DEFAULT_OPACITY);
        assert_eq!(config.size, SizeOptions::Unique { size: 10.0 });
        assert!(config.outline.is_none());
        assert!(config.validate(&sample_table()).is_ok());
    }

    #[test]
    fn test_guess_falls_back_to_first_column() {
        assert_eq!(guess_latitude_column(&["a", "b"]).as_deref(), Some("a"));
        assert_eq!(
            guess_longitude_column(&["lon_a", "x", "LON_B"]).as_deref(),
            Some("LON_B")
        );
        assert_eq!(guess_latitude_column(&[]), None);
    }

    #[test]
    fn test_guess_takes_last_substring_match() {
        // "population" contains "lat" and comes after "Latitude"
        assert_eq!(
            guess_latitude_column(&["Latitude", "lng", "population"]).as_deref(),
            Some("population")
        );
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let table = sample_table();
        let mut config = MapConfig::for_table(&table);
        config.hover_columns.push("altitude".into());
        assert!(matches!(
            config.validate(&table),
            Err(ScatterError::InvalidColumn { column, .. }) if column == "altitude"
        ));
    }

    #[test]
    fn test_text_coordinates_fail() {
        let table = sample_table();
        let mut config = MapConfig::for_table(&table);
        config.latitude_column = "city".into();
        assert!(matches!(
            config.validate(&table),
            Err(ScatterError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_option_bounds() {
        let table = sample_table();
        let base = MapConfig::for_table(&table);

        let mut config = base.clone();
        config.opacity = 1.5;
        assert!(matches!(config.validate(&table), Err(ScatterError::InvalidRange(_))));

        let mut config = base.clone();
        config.size = SizeOptions::Variable {
            column: "inhabitants".into(),
            range: ValueRange::new(15.0, 5.0),
        };
        assert!(matches!(config.validate(&table), Err(ScatterError::InvalidRange(_))));

        let mut config = base.clone();
        config.size = SizeOptions::Variable {
            column: "city".into(),
            range: ValueRange::new(5.0, 15.0),
        };
        assert!(matches!(config.validate(&table), Err(ScatterError::InvalidColumn { .. })));

        let mut config = base.clone();
        config.outline = Some(OutlineOptions {
            color: None,
            width: 6.0,
            opacity: 0.5,
        });
        assert!(matches!(config.validate(&table), Err(ScatterError::InvalidRange(_))));

        let mut config = base;
        config.basemap = BasemapStyle::WhiteBg;
        match config.validate(&table) {
            Err(ScatterError::InvalidOption(message)) => {
                assert!(message.contains("white-bg"));
                assert!(message.ends_with(
                    "open-street-map, carto-positron, stamen-terrain, stamen-toner, wikimedia, esri"
                ));
            }
            other => panic!("expected InvalidOption, got {:?}", other),
        }
        config.backend = Backend::Mapbox;
        assert!(config.validate(&table).is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = MapConfig::for_table(&sample_table());
        config.color = ColorOptions::Variable {
            column: "inhabitants".into(),
            scale: ColorScale::Coolwarm,
            range: Some(ValueRange::new(0.0, 1e6)),
        };
        config.outline = Some(OutlineOptions {
            color: Some(Rgb::new(255, 255, 255)),
            width: 1.0,
            opacity: 0.5,
        });

        let json = config.to_json().unwrap();
        assert!(json.contains("\"mode\": \"variable\""));
        assert!(json.contains("\"#ffffff\""));
        assert_eq!(MapConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            "5, 15".parse::<ValueRange>().unwrap(),
            ValueRange::new(5.0, 15.0)
        );
        assert!("5".parse::<ValueRange>().is_err());
        assert_eq!(ValueRange::new(0.0, 1.0).clip(3.0), 1.0);
        assert!(ValueRange::new(0.0, 1.0).clip(f64::NAN).is_nan());
    }
}
