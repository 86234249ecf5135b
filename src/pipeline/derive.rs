//! Derived-field computation
//!
//! Everything the chart needs that is not in the uploaded table: projected
//! coordinates, marker sizes, clipped or binned colors, hover strings and the
//! initial view. All functions here are pure.

use crate::core::{
    config::{Backend, ColorOptions, MapConfig, SizeOptions, ValueRange},
    constants::MAX_DISPLAYED_CATEGORIES,
    geo::{LatLng, Point},
    viewport::MapView,
};
use crate::data::table::{finite_range, Column, ColumnData, Table};
use crate::prelude::HashMap;
use crate::style::{
    color::Rgb,
    palette::{category_color, category_slot, ColorScale},
};
use crate::{Result, ScatterError};

/// Rows sharing one category value
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub label: String,
    /// Slot in the qualitative palette
    pub slot: usize,
    pub color: Rgb,
    /// Row indices, ascending
    pub rows: Vec<usize>,
}

/// How markers get their fill color
#[derive(Debug, Clone, PartialEq)]
pub enum ColorField {
    Fixed(Rgb),
    Continuous {
        column: String,
        /// Column values clipped to `range`
        values: Vec<f64>,
        scale: ColorScale,
        range: ValueRange,
    },
    Categorical {
        column: String,
        groups: Vec<CategoryGroup>,
        /// Distinct values left out because of the category cap
        dropped: usize,
    },
}

/// Values computed fresh for every run
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub coordinates: Vec<LatLng>,
    /// Web-Mercator coordinates, tile back-end only
    pub projected: Option<Vec<Point>>,
    /// Normalized marker sizes, variable size only
    pub marker_sizes: Option<Vec<f64>>,
    pub color: ColorField,
    /// `(source column, display strings)` per hover column
    pub hover: Vec<(String, Vec<String>)>,
    pub view: MapView,
}

/// Names under which derived values were added to the table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedColumns {
    pub x: Option<String>,
    pub y: Option<String>,
    pub marker_size: Option<String>,
    pub color: Option<String>,
    /// `(label, field)` per hover column
    pub hover: Vec<(String, String)>,
}

/// Computes every derived field for `table` under `config`.
///
/// `config` must already be validated against `table`.
pub fn compute_derived(table: &Table, config: &MapConfig) -> Result<DerivedFields> {
    let coordinates = validate_coordinates(
        table.column(&config.latitude_column)?,
        table.column(&config.longitude_column)?,
    )?;
    let view = MapView::fit(&coordinates)?;
    log::debug!(
        "{} points centered on ({:.5}, {:.5}), zoom {:.2}",
        coordinates.len(),
        view.center.lat,
        view.center.lng,
        view.zoom
    );

    let projected = match config.backend {
        Backend::Tile => Some(project(&coordinates)),
        Backend::Mapbox => None,
    };

    let marker_sizes = match &config.size {
        SizeOptions::Unique { .. } => None,
        SizeOptions::Variable { column, range } => {
            Some(normalize_sizes(table.numeric(column)?, *range))
        }
    };

    let color = color_field(table, &config.color)?;

    let hover = config
        .hover_columns
        .iter()
        .map(|name| {
            let column = table.column(name)?;
            let strings = (0..table.row_count()).map(|row| column.display(row)).collect();
            Ok((name.clone(), strings))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DerivedFields {
        coordinates,
        projected,
        marker_sizes,
        color,
        hover,
        view,
    })
}

/// Pairs latitude and longitude per row, rejecting non-numeric columns,
/// missing values and anything outside `(-90, 90)` x `[-180, 180]`.
pub fn validate_coordinates(latitude: &Column, longitude: &Column) -> Result<Vec<LatLng>> {
    let lats = latitude.as_numeric()?;
    let lngs = longitude.as_numeric()?;
    if lats.is_empty() {
        return Err(ScatterError::InvalidRange("the table has no rows".into()));
    }

    lats.iter()
        .zip(lngs)
        .enumerate()
        .map(|(row, (&lat, &lng))| {
            let point = LatLng::new(lat, lng);
            if !(lat > -90.0 && lat < 90.0) {
                return Err(out_of_range(latitude.name(), row, lat, "(-90, 90)"));
            }
            if !point.is_projectable() {
                return Err(out_of_range(longitude.name(), row, lng, "[-180, 180]"));
            }
            Ok(point)
        })
        .collect()
}

fn out_of_range(column: &str, row: usize, value: f64, interval: &str) -> ScatterError {
    ScatterError::InvalidRange(format!(
        "column '{}' row {}: {} is not a coordinate in {}",
        column,
        row + 1,
        value,
        interval
    ))
}

/// Web-Mercator projection of every point
pub fn project(coordinates: &[LatLng]) -> Vec<Point> {
    coordinates.iter().map(LatLng::to_mercator).collect()
}

/// Maps `values` linearly onto `[range.low, range.high]`, the smallest finite
/// value going to `low` and the largest to `high`.
///
/// A constant column, an all-missing column and missing cells all get `low`.
pub fn normalize_sizes(values: &[f64], range: ValueRange) -> Vec<f64> {
    let (min, max) = match finite_range(values) {
        Some((min, max)) if max > min => (min, max),
        _ => return vec![range.low; values.len()],
    };

    let span = range.high - range.low;
    values
        .iter()
        .map(|&value| {
            if value.is_finite() {
                (value - min) / (max - min) * span + range.low
            } else {
                range.low
            }
        })
        .collect()
}

/// Clamps every value into `range`; missing values stay missing
pub fn clip_values(values: &[f64], range: ValueRange) -> Vec<f64> {
    values.iter().map(|&value| range.clip(value)).collect()
}

/// Groups rows by category in order of first appearance.
///
/// Group `i` takes palette slot `i mod 8`. Only the first `cap` distinct
/// values are kept; the second element counts the ones dropped. Missing cells
/// belong to no group.
pub fn assign_categories(values: &[Option<String>], cap: usize) -> (Vec<CategoryGroup>, usize) {
    let mut index: HashMap<&str, Option<usize>> = HashMap::default();
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut dropped = 0;

    for (row, value) in values.iter().enumerate() {
        let Some(label) = value.as_deref() else {
            continue;
        };
        let slot = *index.entry(label).or_insert_with(|| {
            if groups.len() < cap {
                let ordinal = groups.len();
                groups.push(CategoryGroup {
                    label: label.to_string(),
                    slot: category_slot(ordinal),
                    color: category_color(ordinal),
                    rows: Vec::new(),
                });
                Some(ordinal)
            } else {
                dropped += 1;
                None
            }
        });
        if let Some(group) = slot {
            groups[group].rows.push(row);
        }
    }

    (groups, dropped)
}

fn color_field(table: &Table, options: &ColorOptions) -> Result<ColorField> {
    let (name, scale, range) = match options {
        ColorOptions::Unique { color } => return Ok(ColorField::Fixed(*color)),
        ColorOptions::Variable {
            column,
            scale,
            range,
        } => (column, *scale, *range),
    };

    let column = table.column(name)?;
    match column.data() {
        ColumnData::Numeric(values) => {
            let range = range
                .or_else(|| finite_range(values).map(|(lo, hi)| ValueRange::new(lo, hi)))
                .ok_or_else(|| {
                    ScatterError::InvalidRange(format!("color column '{}' has no values", name))
                })?;
            Ok(ColorField::Continuous {
                column: name.clone(),
                values: clip_values(values, range),
                scale,
                range,
            })
        }
        ColumnData::Text(values) => {
            let (groups, dropped) = assign_categories(values, MAX_DISPLAYED_CATEGORIES);
            if dropped > 0 {
                log::warn!(
                    "column '{}' has {} categories, only the first {} are displayed",
                    name,
                    groups.len() + dropped,
                    groups.len()
                );
            }
            Ok(ColorField::Categorical {
                column: name.clone(),
                groups,
                dropped,
            })
        }
    }
}

impl DerivedFields {
    /// Copies `table` and appends the derived columns under non-colliding names.
    /// Original columns are left untouched.
    pub fn attach(&self, table: &Table) -> Result<(Table, DerivedColumns)> {
        let mut source = table.clone();
        let mut columns = DerivedColumns::default();

        if let Some(points) = &self.projected {
            let x = source.unique_name("x");
            source.add_column(Column::numeric(x.clone(), points.iter().map(|p| p.x).collect()))?;
            let y = source.unique_name("y");
            source.add_column(Column::numeric(y.clone(), points.iter().map(|p| p.y).collect()))?;
            columns.x = Some(x);
            columns.y = Some(y);
        }

        if let Some(sizes) = &self.marker_sizes {
            let name = source.unique_name("marker_size");
            source.add_column(Column::numeric(name.clone(), sizes.clone()))?;
            columns.marker_size = Some(name);
        }

        if let ColorField::Continuous { column, values, .. } = &self.color {
            let name = source.unique_name(&format!("_{}_clipped", column));
            source.add_column(Column::numeric(name.clone(), values.clone()))?;
            columns.color = Some(name);
        }

        for (label, strings) in &self.hover {
            let name = source.unique_name(&format!("_{}", label));
            source.add_column(Column::text(
                name.clone(),
                strings.iter().map(|s| Some(s.as_str())).collect(),
            ))?;
            columns.hover.push((label.clone(), name));
        }

        Ok((source, columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(low: f64, high: f64) -> ValueRange {
        ValueRange::new(low, high)
    }

    #[test]
    fn test_normalize_sizes_endpoints() {
        assert_eq!(normalize_sizes(&[1.0, 2.0, 3.0], range(5.0, 15.0)), vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_normalize_sizes_is_monotonic_affine() {
        let values = [3.5, -2.0, 10.0, 0.0, 7.25];
        let sizes = normalize_sizes(&values, range(2.0, 40.0));
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] < values[j] {
                    assert!(sizes[i] < sizes[j]);
                }
            }
        }
        assert_eq!(sizes[1], 2.0);
        assert_eq!(sizes[2], 40.0);
        // affine: equal steps in value give equal steps in size
        let slope = (sizes[2] - sizes[1]) / (values[2] - values[1]);
        for (value, size) in values.iter().zip(&sizes) {
            assert!((size - (2.0 + (value - values[1]) * slope)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_constant_column() {
        let sizes = normalize_sizes(&[4.0, 4.0, 4.0], range(5.0, 15.0));
        assert_eq!(sizes, vec![5.0, 5.0, 5.0]);
        assert!(sizes.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_normalize_missing_values() {
        let sizes = normalize_sizes(&[f64::NAN, 0.0, 10.0], range(1.0, 3.0));
        assert_eq!(sizes, vec![1.0, 1.0, 3.0]);
        assert_eq!(normalize_sizes(&[f64::NAN], range(1.0, 3.0)), vec![1.0]);
    }

    #[test]
    fn test_clip_values() {
        let clipped = clip_values(&[-5.0, 0.5, 2.0, f64::NAN], range(0.0, 1.0));
        assert_eq!(&clipped[..3], &[0.0, 0.5, 1.0]);
        assert!(clipped[3].is_nan());
    }

    #[test]
    fn test_categories_cycle_and_cap() {
        let values: Vec<Option<String>> = (0..12).map(|i| Some(format!("c{}", i))).collect();
        let (groups, dropped) = assign_categories(&values, 10);
        let slots: Vec<usize> = groups.iter().map(|g| g.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
        assert_eq!(dropped, 2);
        assert_eq!(groups[8].color, groups[0].color);
    }

    #[test]
    fn test_categories_are_deterministic() {
        let values: Vec<Option<String>> = ["b", "a", "b", "c", "a"]
            .iter()
            .map(|s| Some(s.to_string()))
            .chain([None])
            .collect();
        let (groups, dropped) = assign_categories(&values, 10);
        assert_eq!(dropped, 0);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].label, "b");
        assert_eq!(groups[0].rows, vec![0, 2]);
        assert_eq!(groups[1].label, "a");
        assert_eq!(groups[1].rows, vec![1, 4]);
        assert_eq!(groups[2].rows, vec![3]);
        assert_eq!(assign_categories(&values, 10).0, groups);
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let lat = Column::numeric("lat", vec![10.0, 95.0]);
        let lon = Column::numeric("lon", vec![0.0, 0.0]);
        let err = validate_coordinates(&lat, &lon).unwrap_err();
        assert!(matches!(err, ScatterError::InvalidRange(ref msg) if msg.contains("row 2")));

        let lat = Column::numeric("lat", vec![-90.0]);
        let lon = Column::numeric("lon", vec![0.0]);
        assert!(validate_coordinates(&lat, &lon).is_err());

        let lat = Column::numeric("lat", vec![0.0]);
        let lon = Column::numeric("lon", vec![f64::NAN]);
        assert!(validate_coordinates(&lat, &lon).is_err());
    }

    #[test]
    fn test_coordinates_must_be_numeric() {
        let lat = Column::text("lat", vec![Some("north")]);
        let lon = Column::numeric("lon", vec![0.0]);
        assert!(matches!(
            validate_coordinates(&lat, &lon),
            Err(ScatterError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_attach_avoids_collisions() {
        let table = Table::from_columns(vec![
            Column::numeric("lat", vec![1.0]),
            Column::numeric("lon", vec![2.0]),
            Column::numeric("x", vec![42.0]),
        ])
        .unwrap();
        let mut config = MapConfig::for_table(&table);
        config.hover_columns = vec!["x".into()];

        let derived = compute_derived(&table, &config).unwrap();
        let (source, columns) = derived.attach(&table).unwrap();

        assert_eq!(columns.x.as_deref(), Some("x_1"));
        assert_eq!(columns.y.as_deref(), Some("y"));
        assert_eq!(source.numeric("x").unwrap(), &[42.0]);
        assert_eq!(columns.hover, vec![("x".to_string(), "_x".to_string())]);
        assert_eq!(source.column("_x").unwrap().display(0), "42");
    }
}
