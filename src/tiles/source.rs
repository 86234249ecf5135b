use crate::core::config::Backend;
use crate::ScatterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait representing anything that can serve background tiles.
pub trait TileSource: Send + Sync {
    /// XYZ URL template with `{z}`, `{x}` and `{y}` placeholders.
    fn url_template(&self) -> Option<&'static str>;

    /// Attribution shown in the map corner.
    fn attribution(&self) -> &'static str;
}

/// Named background styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasemapStyle {
    OpenStreetMap,
    CartoPositron,
    CartoDarkmatter,
    StamenTerrain,
    StamenToner,
    StamenWatercolor,
    Wikimedia,
    Esri,
    WhiteBg,
}

const OSM_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const CARTO_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors &copy; CARTO";
const STAMEN_ATTRIBUTION: &str =
    "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors";

impl BasemapStyle {
    pub const ALL: [BasemapStyle; 9] = [
        BasemapStyle::OpenStreetMap,
        BasemapStyle::CartoPositron,
        BasemapStyle::CartoDarkmatter,
        BasemapStyle::StamenTerrain,
        BasemapStyle::StamenToner,
        BasemapStyle::StamenWatercolor,
        BasemapStyle::Wikimedia,
        BasemapStyle::Esri,
        BasemapStyle::WhiteBg,
    ];

    /// Style token, as used by the mapbox-style chart and on the command line
    pub fn token(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "open-street-map",
            Self::CartoPositron => "carto-positron",
            Self::CartoDarkmatter => "carto-darkmatter",
            Self::StamenTerrain => "stamen-terrain",
            Self::StamenToner => "stamen-toner",
            Self::StamenWatercolor => "stamen-watercolor",
            Self::Wikimedia => "wikimedia",
            Self::Esri => "esri",
            Self::WhiteBg => "white-bg",
        }
    }

    /// Whether the given back-end can draw this style
    pub fn supports(&self, backend: Backend) -> bool {
        match backend {
            Backend::Tile => matches!(
                self,
                Self::OpenStreetMap
                    | Self::CartoPositron
                    | Self::StamenTerrain
                    | Self::StamenToner
                    | Self::Wikimedia
                    | Self::Esri
            ),
            Backend::Mapbox => !matches!(self, Self::Wikimedia | Self::Esri),
        }
    }

    /// Styles available for a back-end, in menu order
    pub fn available(backend: Backend) -> Vec<BasemapStyle> {
        Self::ALL
            .iter()
            .copied()
            .filter(|style| style.supports(backend))
            .collect()
    }
}

impl TileSource for BasemapStyle {
    fn url_template(&self) -> Option<&'static str> {
        match self {
            Self::OpenStreetMap => Some("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
            Self::CartoPositron => {
                Some("https://basemaps.cartocdn.com/light_all/{z}/{x}/{y}@2x.png")
            }
            Self::CartoDarkmatter => {
                Some("https://basemaps.cartocdn.com/dark_all/{z}/{x}/{y}@2x.png")
            }
            Self::StamenTerrain => {
                Some("https://tiles.stadiamaps.com/tiles/stamen_terrain/{z}/{x}/{y}.png")
            }
            Self::StamenToner => {
                Some("https://tiles.stadiamaps.com/tiles/stamen_toner/{z}/{x}/{y}.png")
            }
            Self::StamenWatercolor => {
                Some("https://tiles.stadiamaps.com/tiles/stamen_watercolor/{z}/{x}/{y}.jpg")
            }
            Self::Wikimedia => Some("https://maps.wikimedia.org/osm-intl/{z}/{x}/{y}@2x.png"),
            // Esri serves rows before columns
            Self::Esri => Some(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            ),
            Self::WhiteBg => None,
        }
    }

    fn attribution(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => OSM_ATTRIBUTION,
            Self::CartoPositron | Self::CartoDarkmatter => CARTO_ATTRIBUTION,
            Self::StamenTerrain | Self::StamenToner | Self::StamenWatercolor => STAMEN_ATTRIBUTION,
            Self::Wikimedia => "Wikimedia maps | &copy; OpenStreetMap contributors",
            Self::Esri => "Tiles &copy; Esri",
            Self::WhiteBg => "",
        }
    }
}

impl Default for BasemapStyle {
    fn default() -> Self {
        Self::OpenStreetMap
    }
}

impl fmt::Display for BasemapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for BasemapStyle {
    type Err = ScatterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|style| style.token() == s.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| {
                ScatterError::InvalidOption(format!(
                    "unknown basemap '{}', expected one of: {}",
                    s,
                    Self::ALL.map(|style| style.token()).join(", ")
                ))
            })
    }
}
