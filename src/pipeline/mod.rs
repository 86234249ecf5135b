//! The table-to-figure pipeline
//!
//! [`compute`] is stateless: the same table and configuration always give
//! the same figure.

pub mod assembler;
pub mod derive;

use crate::core::{config::MapConfig, viewport::MapView};
use crate::data::table::Table;
use crate::Result;
use assembler::FigureParams;

/// A fully assembled map: chart parameters plus the table they reference
#[derive(Debug, Clone)]
pub struct Figure {
    pub params: FigureParams,
    /// Uploaded columns followed by the derived ones
    pub source: Table,
    pub view: MapView,
}

/// Validates `config` against `table`, derives every computed field and
/// assembles the chart parameters.
pub fn compute(table: &Table, config: &MapConfig) -> Result<Figure> {
    config.validate(table)?;
    let derived = derive::compute_derived(table, config)?;
    let (source, columns) = derived.attach(table)?;
    let params = assembler::assemble(config, &derived, &columns)?;
    log::debug!(
        "assembled {} trace(s) for the {} backend",
        params.traces.len(),
        config.backend
    );

    Ok(Figure {
        params,
        source,
        view: derived.view,
    })
}

impl Figure {
    /// Chart parameters as pretty-printed JSON
    pub fn params_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.params)?)
    }
}
