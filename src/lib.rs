//! # scattermap
//!
//! Turns a tabular dataset with latitude/longitude columns into an
//! interactive scatter map over a web basemap.
//!
//! A [`Table`] is loaded from CSV or a spreadsheet, a [`MapConfig`] describes
//! how markers are colored, sized, outlined and labelled, and
//! [`pipeline::compute`] derives the figure, which [`render::html`] exports
//! as a standalone page.

pub mod core {
    pub mod builder;
    pub mod config;
    pub mod constants;
    pub mod geo;
    pub mod viewport;
}

pub mod data {
    pub mod formats;
    pub mod table;
}

pub mod style {
    pub mod color;
    pub mod palette;
}

pub mod pipeline;
pub mod prelude;
pub mod render;
pub mod tiles;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapConfigBuilder,
    config::{Backend, ColorOptions, MapConfig, OutlineOptions, SizeOptions, ValueRange},
    geo::{LatLng, LatLngBounds, Point},
    viewport::MapView,
};

pub use crate::data::{
    formats::{load_bytes, load_path, DataFormat},
    table::{Cell, Column, ColumnData, Table},
};

pub use pipeline::{compute, Figure};

pub use render::html::{export_html, write_html};

pub use style::{color::Rgb, palette::ColorScale};

pub use tiles::source::{BasemapStyle, TileSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ScatterError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ScatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not parse file: {0}")]
    FileParse(String),

    #[error("Invalid column '{column}': {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl From<csv::Error> for ScatterError {
    fn from(err: csv::Error) -> Self {
        ScatterError::FileParse(err.to_string())
    }
}

/// Error type alias for convenience
pub type Error = ScatterError;
