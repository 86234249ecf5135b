//! Translation of configuration and derived fields into chart parameters
//!
//! Nothing is computed here. Every toggle of [`MapConfig`] maps onto a
//! parameter, and parameters that belong to a disabled toggle are left out
//! instead of being sent as empty values.

use crate::core::{
    config::{Backend, MapConfig, SizeOptions},
    geo::{LatLng, LatLngBounds},
};
use crate::pipeline::derive::{ColorField, DerivedColumns, DerivedFields};
use crate::style::palette::ColorScale;
use crate::tiles::source::{BasemapStyle, TileSource};
use crate::{Result, ScatterError};
use serde::Serialize;

/// Marker diameter: one value for all markers or a per-row column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SizeParam {
    Fixed(f64),
    Field(String),
}

/// Marker fill color
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorParam {
    Fixed {
        color: String,
    },
    /// Linear mapping of `field` through `scale` between `low` and `high`
    Linear {
        field: String,
        scale: ColorScale,
        low: f64,
        high: f64,
    },
}

/// One drawn marker series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_label: Option<String>,
    pub color: ColorParam,
    /// Rows drawn by this trace; every row when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<usize>>,
}

/// Color bar shown next to a continuous color mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBarParams {
    pub title: String,
    pub scale: ColorScale,
    pub low: f64,
    pub high: f64,
}

/// Hover tooltip line: label and `@{field}` reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub label: String,
    pub field: String,
}

impl Tooltip {
    /// Column name behind the `@{...}` reference
    pub fn field_name(&self) -> &str {
        self.field
            .strip_prefix("@{")
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(&self.field)
    }
}

/// Flat parameter record handed to the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureParams {
    pub backend: Backend,
    pub basemap: BasemapStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    /// Horizontal position column: projected x (tile) or longitude (mapbox)
    pub x: String,
    /// Vertical position column: projected y (tile) or latitude (mapbox)
    pub y: String,
    pub size: SizeParam,
    pub alpha: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_alpha: Option<f64>,
    pub traces: Vec<TraceParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_bar: Option<ColorBarParams>,
    pub tooltips: Vec<Tooltip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    pub bounds: LatLngBounds,
}

/// Builds the chart parameters. `columns` are the names returned by
/// [`DerivedFields::attach`].
pub fn assemble(
    config: &MapConfig,
    derived: &DerivedFields,
    columns: &DerivedColumns,
) -> Result<FigureParams> {
    let (x, y) = match config.backend {
        Backend::Tile => (
            required(&columns.x, "projected x")?,
            required(&columns.y, "projected y")?,
        ),
        Backend::Mapbox => (
            config.longitude_column.clone(),
            config.latitude_column.clone(),
        ),
    };

    let size = match &config.size {
        SizeOptions::Unique { size } => SizeParam::Fixed(*size),
        SizeOptions::Variable { .. } => {
            SizeParam::Field(required(&columns.marker_size, "marker size")?)
        }
    };

    let (line_color, line_width, line_alpha) = match (&config.outline, config.backend) {
        (Some(outline), _) => (
            outline.color.map(|color| color.to_hex()),
            Some(outline.width),
            Some(outline.opacity),
        ),
        // The tile chart strokes markers by default; a transparent line hides it.
        (None, Backend::Tile) => (None, None, Some(0.0)),
        (None, Backend::Mapbox) => (None, None, None),
    };

    let (traces, color_bar) = match &derived.color {
        ColorField::Fixed(color) => (
            vec![TraceParams {
                legend_label: None,
                color: ColorParam::Fixed {
                    color: color.to_hex(),
                },
                rows: None,
            }],
            None,
        ),
        ColorField::Continuous {
            column,
            scale,
            range,
            ..
        } => (
            vec![TraceParams {
                legend_label: None,
                color: ColorParam::Linear {
                    field: required(&columns.color, "clipped color")?,
                    scale: *scale,
                    low: range.low,
                    high: range.high,
                },
                rows: None,
            }],
            Some(ColorBarParams {
                title: column.clone(),
                scale: *scale,
                low: range.low,
                high: range.high,
            }),
        ),
        ColorField::Categorical { groups, .. } => (
            groups
                .iter()
                .map(|group| TraceParams {
                    legend_label: Some(group.label.clone()),
                    color: ColorParam::Fixed {
                        color: group.color.to_hex(),
                    },
                    rows: Some(group.rows.clone()),
                })
                .collect(),
            None,
        ),
    };

    let tooltips = columns
        .hover
        .iter()
        .map(|(label, field)| Tooltip {
            label: label.clone(),
            field: format!("@{{{}}}", field),
        })
        .collect();

    let (tile_url, attribution) = match config.backend {
        Backend::Tile => (
            config.basemap.url_template().map(str::to_string),
            Some(config.basemap.attribution().to_string()),
        ),
        Backend::Mapbox => (None, None),
    };

    let (center, zoom) = match config.backend {
        Backend::Tile => (None, None),
        Backend::Mapbox => (Some(derived.view.center), Some(derived.view.zoom)),
    };

    Ok(FigureParams {
        backend: config.backend,
        basemap: config.basemap,
        tile_url,
        attribution,
        x,
        y,
        size,
        alpha: config.opacity,
        line_color,
        line_width,
        line_alpha,
        traces,
        color_bar,
        tooltips,
        center,
        zoom,
        bounds: derived.view.bounds.clone(),
    })
}

fn required(column: &Option<String>, what: &str) -> Result<String> {
    column.clone().ok_or_else(|| ScatterError::InvalidColumn {
        column: what.to_string(),
        reason: "derived column was not computed".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ColorOptions, OutlineOptions, ValueRange};
    use crate::data::table::{Column, Table};
    use crate::pipeline::derive::compute_derived;
    use crate::style::color::Rgb;

    fn table() -> Table {
        Table::from_columns(vec![
            Column::numeric("lat", vec![10.0, 20.0, 30.0]),
            Column::numeric("lon", vec![0.0, 10.0, 20.0]),
            Column::numeric("v", vec![1.0, 2.0, 3.0]),
            Column::text("kind", vec![Some("a"), Some("b"), Some("a")]),
        ])
        .unwrap()
    }

    fn params(config: &MapConfig) -> FigureParams {
        let table = table();
        config.validate(&table).unwrap();
        let derived = compute_derived(&table, config).unwrap();
        let (_, columns) = derived.attach(&table).unwrap();
        assemble(config, &derived, &columns).unwrap()
    }

    #[test]
    fn test_unique_options_tile() {
        let config = MapConfig::for_table(&table());
        let params = params(&config);

        assert_eq!(params.x, "x");
        assert_eq!(params.y, "y");
        assert_eq!(params.size, SizeParam::Fixed(10.0));
        assert_eq!(params.line_alpha, Some(0.0));
        assert!(params.line_color.is_none());
        assert!(params.line_width.is_none());
        assert!(params.center.is_none());
        assert!(params.tile_url.is_some());
        assert_eq!(params.traces.len(), 1);
        assert_eq!(
            params.traces[0].color,
            ColorParam::Fixed {
                color: "#cb2649".into()
            }
        );
        assert_eq!(params.tooltips[0].field, "@{_lat}");
        assert_eq!(params.tooltips[0].field_name(), "_lat");
    }

    #[test]
    fn test_disabled_toggles_are_omitted() {
        let mut config = MapConfig::for_table(&table());
        config.backend = Backend::Mapbox;
        let json = serde_json::to_value(params(&config)).unwrap();
        let object = json.as_object().unwrap();

        for key in ["line_color", "line_width", "line_alpha", "color_bar", "tile_url"] {
            assert!(!object.contains_key(key), "{} should be omitted", key);
        }
        assert_eq!(object["x"], "lon");
        assert_eq!(object["y"], "lat");
        assert!(object.contains_key("zoom"));
        assert!(object.contains_key("center"));
    }

    #[test]
    fn test_outline_without_color_override() {
        let mut config = MapConfig::for_table(&table());
        config.outline = Some(OutlineOptions {
            color: None,
            width: 2.0,
            opacity: 0.7,
        });
        let uncolored = params(&config);
        assert!(uncolored.line_color.is_none());
        assert_eq!(uncolored.line_width, Some(2.0));
        assert_eq!(uncolored.line_alpha, Some(0.7));

        config.outline = Some(OutlineOptions {
            color: Some(Rgb::new(255, 255, 255)),
            width: 2.0,
            opacity: 0.7,
        });
        assert_eq!(params(&config).line_color.as_deref(), Some("#ffffff"));
    }

    #[test]
    fn test_variable_color_and_size() {
        let mut config = MapConfig::for_table(&table());
        config.color = ColorOptions::Variable {
            column: "v".into(),
            scale: ColorScale::RdYlGn,
            range: Some(ValueRange::new(1.5, 2.5)),
        };
        config.size = SizeOptions::Variable {
            column: "v".into(),
            range: ValueRange::new(5.0, 15.0),
        };
        let params = params(&config);

        assert_eq!(params.size, SizeParam::Field("marker_size".into()));
        assert_eq!(
            params.traces[0].color,
            ColorParam::Linear {
                field: "_v_clipped".into(),
                scale: ColorScale::RdYlGn,
                low: 1.5,
                high: 2.5,
            }
        );
        let bar = params.color_bar.unwrap();
        assert_eq!(bar.title, "v");
        assert_eq!((bar.low, bar.high), (1.5, 2.5));
    }

    #[test]
    fn test_categorical_traces() {
        let mut config = MapConfig::for_table(&table());
        config.color = ColorOptions::Variable {
            column: "kind".into(),
            scale: ColorScale::Jet,
            range: None,
        };
        let params = params(&config);

        assert_eq!(params.traces.len(), 2);
        assert_eq!(params.traces[0].legend_label.as_deref(), Some("a"));
        assert_eq!(params.traces[0].rows, Some(vec![0, 2]));
        assert_eq!(params.traces[1].rows, Some(vec![1]));
        assert!(params.color_bar.is_none());
    }
}
