//! Core constants shared by the pipeline, the configuration defaults and the exporter.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Web Mercator sphere radius in meters (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Fill color used when a single color is requested and none was given.
pub const DEFAULT_COLOR: &str = "#CB2649";

/// Outline color suggested when the outline override is switched on.
pub const DEFAULT_OUTLINE_COLOR: &str = "#FFFFFF";

/// Marker diameter bounds in screen pixels.
pub const MARKER_MIN_SIZE: f64 = 1.0;
pub const MARKER_MAX_SIZE: f64 = 50.0;

/// Single marker size used until the user picks one.
pub const MARKER_DEFAULT_SIZE: f64 = 10.0;

/// Default `[low, high]` interval for variable marker sizes.
pub const MARKER_DEFAULT_SIZE_RANGE: (f64, f64) = (5.0, 15.0);

/// Default fill opacity.
pub const MARKER_DEFAULT_OPACITY: f64 = 0.5;

/// Outline width bounds in screen pixels.
pub const OUTLINE_MIN_WIDTH: f64 = 0.0;
pub const OUTLINE_MAX_WIDTH: f64 = 5.0;

/// Default outline opacity.
pub const OUTLINE_DEFAULT_OPACITY: f64 = 0.5;

/// Categories beyond this count are left out of the figure and its legend.
pub const MAX_DISPLAYED_CATEGORIES: usize = 10;

/// Number of entries sampled from a continuous color scale.
pub const CONTINUOUS_PALETTE_SIZE: usize = 256;

/// Color given to missing values by the continuous color mapper.
pub const NAN_COLOR: &str = "#808080";

/// Auto-zoom bounds.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 20.0;

/// Margin applied to the coordinate spread before estimating the zoom.
pub const ZOOM_MARGIN: f64 = 1.2;

/// Extra latitude factor compensating the map aspect ratio.
pub const LATITUDE_ASPECT_FACTOR: f64 = 2.0;

/// File name offered for the standalone HTML snapshot.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "personalized_map.html";
