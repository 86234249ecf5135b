//! In-memory row/column table
//!
//! Columns are typed once when the table is built: a column is numeric when
//! every non-empty cell reads as a number, text otherwise.

use crate::{Result, ScatterError};

/// A single cell as read from the input file
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classifies a raw text cell
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }
}

/// Column values with their inferred type
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Missing cells are `NaN`
    Numeric(Vec<f64>),
    /// Missing cells are `None`
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// Infers the column type from its cells
    pub fn infer(cells: Vec<Cell>) -> Self {
        let numeric = cells
            .iter()
            .all(|cell| matches!(cell, Cell::Empty) || cell.as_number().is_some());

        if numeric {
            ColumnData::Numeric(
                cells
                    .iter()
                    .map(|cell| cell.as_number().unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            ColumnData::Text(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        Cell::Empty => None,
                        Cell::Number(value) => Some(format_number(value)),
                        Cell::Text(text) => Some(text),
                    })
                    .collect(),
            )
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.data.is_numeric()
    }

    /// Numeric values, or [`ScatterError::InvalidColumn`] for a text column
    pub fn as_numeric(&self) -> Result<&[f64]> {
        match &self.data {
            ColumnData::Numeric(values) => Ok(values),
            ColumnData::Text(_) => Err(ScatterError::InvalidColumn {
                column: self.name.clone(),
                reason: "expected numeric values".into(),
            }),
        }
    }


    /// Display string of one cell; missing cells are empty
    pub fn display(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Numeric(values) => values
                .get(row)
                .filter(|value| !value.is_nan())
                .map(|value| format_number(*value))
                .unwrap_or_default(),
            ColumnData::Text(values) => values
                .get(row)
                .and_then(|value| value.clone())
                .unwrap_or_default(),
        }
    }
}

/// Smallest and largest finite value of a slice
pub fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Integral values print without a fractional part
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Ordered set of equally long, uniquely named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table, checking lengths and names
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    /// Builds a table from a header row and rows of cells, inferring column types.
    ///
    /// Rows must have exactly one cell per header.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<Cell>>) -> Result<Self> {
        let width = headers.len();
        let mut cells: Vec<Vec<Cell>> = (0..width)
            .map(|_| Vec::with_capacity(records.len()))
            .collect();

        for (index, record) in records.into_iter().enumerate() {
            if record.len() != width {
                return Err(ScatterError::FileParse(format!(
                    "row {} has {} fields, expected {}",
                    index + 1,
                    record.len(),
                    width
                )));
            }
            for (column, cell) in cells.iter_mut().zip(record) {
                column.push(cell);
            }
        }

        let mut table = Self::new();
        for (name, column_cells) in dedupe_headers(headers).into_iter().zip(cells) {
            table.add_column(Column::new(name, ColumnData::infer(column_cells)))?;
        }
        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Looks a column up by name, failing with [`ScatterError::InvalidColumn`]
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ScatterError::InvalidColumn {
                column: name.to_string(),
                reason: "no such column".into(),
            })
    }

    /// Numeric values of a column
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        self.column(name)?.as_numeric()
    }

    /// Appends a column. Existing columns are never replaced.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(ScatterError::InvalidColumn {
                column: column.name,
                reason: "a column with this name already exists".into(),
            });
        }
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(ScatterError::InvalidColumn {
                reason: format!("has {} rows, table has {}", column.len(), self.rows),
                column: column.name,
            });
        }
        self.rows = column.len();
        self.columns.push(column);
        Ok(())
    }

    /// `base`, or `base` with a numeric suffix when taken
    pub fn unique_name(&self, base: &str) -> String {
        if !self.has_column(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}_{}", base, i))
            .find(|candidate| !self.has_column(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Fills blank headers and disambiguates repeated ones with `.1`, `.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for (index, header) in headers.into_iter().enumerate() {
        let header = header.trim();
        let base = if header.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.push(name);
    }
    seen
}
