//! Map configuration builder for fluent API configuration
//!
//! Starts from the defaults [`MapConfig::for_table`] derives for a table and
//! lets callers override individual options.

use crate::{
    core::config::{
        Backend, ColorOptions, MapConfig, OutlineOptions, SizeOptions, ValueRange,
    },
    core::constants::OUTLINE_DEFAULT_OPACITY,
    data::table::Table,
    style::{color::Rgb, palette::ColorScale},
    tiles::source::BasemapStyle,
    Result,
};

/// Builder for creating validated [`MapConfig`] values
pub struct MapConfigBuilder<'a> {
    table: &'a Table,
    config: MapConfig,
}

impl<'a> MapConfigBuilder<'a> {
    /// Create a new builder with the defaults for `table`
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            config: MapConfig::for_table(table),
        }
    }

    /// Continue from an existing configuration, e.g. one loaded from JSON
    pub fn from_config(table: &'a Table, config: MapConfig) -> Self {
        Self { table, config }
    }

    /// Choose the chart back-end
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Paint every marker with one color
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.config.color = ColorOptions::Unique { color };
        self
    }

    /// Color markers by a column
    pub fn with_color_column(
        mut self,
        column: impl Into<String>,
        scale: ColorScale,
        range: Option<ValueRange>,
    ) -> Self {
        self.config.color = ColorOptions::Variable {
            column: column.into(),
            scale,
            range,
        };
        self
    }

    /// Set the fill opacity
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.config.opacity = opacity;
        self
    }

    /// Give every marker the same diameter
    pub fn with_size(mut self, size: f64) -> Self {
        self.config.size = SizeOptions::Unique { size };
        self
    }

    /// Size markers by a numeric column
    pub fn with_size_column(mut self, column: impl Into<String>, range: ValueRange) -> Self {
        self.config.size = SizeOptions::Variable {
            column: column.into(),
            range,
        };
        self
    }

    /// Draw an outline around markers
    pub fn with_outline(mut self, width: f64, color: Option<Rgb>) -> Self {
        let opacity = self
            .config
            .outline
            .as_ref()
            .map(|outline| outline.opacity)
            .unwrap_or(OUTLINE_DEFAULT_OPACITY);
        self.config.outline = Some(OutlineOptions {
            color,
            width,
            opacity,
        });
        self
    }

    /// Set the outline opacity, enabling a zero-width outline if none was set
    pub fn with_outline_opacity(mut self, opacity: f64) -> Self {
        match self.config.outline.as_mut() {
            Some(outline) => outline.opacity = opacity,
            None => {
                self.config.outline = Some(OutlineOptions {
                    color: None,
                    width: 0.0,
                    opacity,
                })
            }
        }
        self
    }

    /// Remove the outline
    pub fn without_outline(mut self) -> Self {
        self.config.outline = None;
        self
    }

    /// Columns listed in the hover tooltip
    pub fn with_hover_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.hover_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Override the guessed latitude column
    pub fn with_latitude_column(mut self, column: impl Into<String>) -> Self {
        self.config.latitude_column = column.into();
        self
    }

    /// Override the guessed longitude column
    pub fn with_longitude_column(mut self, column: impl Into<String>) -> Self {
        self.config.longitude_column = column.into();
        self
    }

    /// Choose the background map
    pub fn with_basemap(mut self, basemap: BasemapStyle) -> Self {
        self.config.basemap = basemap;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<MapConfig> {
        self.config.validate(self.table)?;
        Ok(self.config)
    }
}
