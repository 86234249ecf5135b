//! Prelude module for common scattermap types
//!
//! `use scattermap::prelude::*;` brings in the table, configuration and
//! pipeline types needed to build and export a map.

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

pub use crate::pipeline::{compute, Figure};

pub use crate::render::html::{export_html, write_html};

pub use crate::style::{color::Rgb, palette::ColorScale};

pub use crate::tiles::source::{BasemapStyle, TileSource};

pub use crate::{Result, ScatterError};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
