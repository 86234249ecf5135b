//! scattermap - render a table of coordinates as an interactive scatter map

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use scattermap::{
    constants::{DEFAULT_EXPORT_FILE_NAME, DEFAULT_OUTLINE_COLOR, MARKER_DEFAULT_SIZE_RANGE},
    Backend, BasemapStyle, ColorScale, MapConfig, MapConfigBuilder, Rgb, Table, ValueRange,
};
use std::fs;
use std::path::PathBuf;

/// Render a CSV or Excel table of coordinates as a standalone HTML scatter map
#[derive(Parser)]
#[command(name = "scattermap", version, about)]
struct Cli {
    /// Input table (.csv, .txt, .xlsx, .xls, .ods)
    input: PathBuf,

    /// Output HTML file
    #[arg(short, long, default_value = DEFAULT_EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Chart back-end (tile, mapbox)
    #[arg(long)]
    backend: Option<Backend>,

    /// Single marker color (#rrggbb)
    #[arg(long, conflicts_with = "color_column")]
    color: Option<Rgb>,

    /// Color markers by this column
    #[arg(long)]
    color_column: Option<String>,

    /// Color scale for numeric color columns (jet, coolwarm, RdYlGn, jet_r, coolwarm_r)
    #[arg(long, default_value_t = ColorScale::Jet, requires = "color_column")]
    color_scale: ColorScale,

    /// Color window LOW,HIGH; defaults to the column's range
    #[arg(long, allow_hyphen_values = true, requires = "color_column")]
    color_range: Option<ValueRange>,

    /// Fill opacity in [0, 1]
    #[arg(long)]
    opacity: Option<f64>,

    /// Single marker diameter
    #[arg(long, conflicts_with = "size_column")]
    size: Option<f64>,

    /// Size markers by this numeric column
    #[arg(long)]
    size_column: Option<String>,

    /// Diameter range LO,HI for --size-column
    #[arg(long, allow_hyphen_values = true, requires = "size_column")]
    size_range: Option<ValueRange>,

    /// Draw marker outlines
    #[arg(long)]
    outline: bool,

    /// Outline color; markers keep their fill color when omitted
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_OUTLINE_COLOR)]
    outline_color: Option<Rgb>,

    /// Outline width
    #[arg(long)]
    outline_width: Option<f64>,

    /// Outline opacity in [0, 1]
    #[arg(long)]
    outline_opacity: Option<f64>,

    /// Column shown in the hover tooltip; repeat for several. Defaults to all columns
    #[arg(long = "hover")]
    hover: Vec<String>,

    /// Latitude column; guessed from the headers when omitted
    #[arg(long)]
    lat: Option<String>,

    /// Longitude column; guessed from the headers when omitted
    #[arg(long)]
    lon: Option<String>,

    /// Background map style
    #[arg(long)]
    basemap: Option<BasemapStyle>,

    /// Page title
    #[arg(long, default_value = "Scatter map")]
    title: String,

    /// Start from a configuration saved with --save-config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective configuration as JSON
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Print the figure parameters as JSON
    #[arg(long)]
    print_params: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let table = scattermap::load_path(&cli.input)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    info!(
        "{} rows, columns: {}",
        table.row_count(),
        table.column_names().join(", ")
    );

    let config = build_config(&cli, &table)?;

    if let Some(path) = &cli.save_config {
        fs::write(path, config.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("saved configuration to {}", path.display());
    }

    let figure = scattermap::compute(&table, &config).context("Failed to build the map")?;

    if cli.print_params {
        println!("{}", figure.params_json()?);
    }

    scattermap::write_html(&figure, &cli.title, &cli.output)
        .with_context(|| format!("Failed to export {}", cli.output.display()))?;
    println!("Map written to {}", cli.output.display());

    Ok(())
}

/// Command line flags applied on top of the saved configuration, or of the
/// defaults for the table when none is given
fn build_config(cli: &Cli, table: &Table) -> Result<MapConfig> {
    let mut builder = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = MapConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            MapConfigBuilder::from_config(table, config)
        }
        None => MapConfigBuilder::new(table),
    };

    if let Some(backend) = cli.backend {
        builder = builder.with_backend(backend);
    }
    if let Some(basemap) = cli.basemap {
        builder = builder.with_basemap(basemap);
    }
    if let Some(lat) = &cli.lat {
        builder = builder.with_latitude_column(lat);
    }
    if let Some(lon) = &cli.lon {
        builder = builder.with_longitude_column(lon);
    }

    if let Some(color) = cli.color {
        builder = builder.with_color(color);
    }
    if let Some(column) = &cli.color_column {
        builder = builder.with_color_column(column, cli.color_scale, cli.color_range);
    }
    if let Some(opacity) = cli.opacity {
        builder = builder.with_opacity(opacity);
    }

    if let Some(size) = cli.size {
        builder = builder.with_size(size);
    }
    if let Some(column) = &cli.size_column {
        let (low, high) = MARKER_DEFAULT_SIZE_RANGE;
        let range = cli.size_range.unwrap_or(ValueRange::new(low, high));
        builder = builder.with_size_column(column, range);
    }

    if cli.outline || cli.outline_width.is_some() || cli.outline_color.is_some() {
        builder = builder.with_outline(cli.outline_width.unwrap_or_default(), cli.outline_color);
    }
    if let Some(opacity) = cli.outline_opacity {
        builder = builder.with_outline_opacity(opacity);
    }

    if !cli.hover.is_empty() {
        builder = builder.with_hover_columns(cli.hover.iter().cloned());
    }

    builder.build().context("Invalid map options")
}
