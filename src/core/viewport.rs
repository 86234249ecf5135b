use crate::core::{
    constants::{LATITUDE_ASPECT_FACTOR, MAX_ZOOM, MIN_ZOOM, ZOOM_MARGIN},
    geo::{LatLng, LatLngBounds},
};
use crate::{Result, ScatterError};
use serde::{Deserialize, Serialize};

/// Width in degrees of one tile at zoom 19, the reference for zoom estimation.
const DEGREES_PER_TILE_AT_Z19: f64 = 360.0 / 524_288.0;

/// Initial view of the map: where it is centered, how far it is zoomed in,
/// and the box that holds every plotted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Arithmetic mean of all coordinates
    pub center: LatLng,
    /// Estimated zoom level, clamped to `[MIN_ZOOM, MAX_ZOOM]`
    pub zoom: f64,
    /// Bounding box of all coordinates
    pub bounds: LatLngBounds,
}

impl MapView {
    /// Fits a view around the given points.
    ///
    /// Fails with [`ScatterError::InvalidRange`] when there is nothing to fit.
    pub fn fit(points: &[LatLng]) -> Result<Self> {
        let bounds = LatLngBounds::from_points(points)
            .ok_or_else(|| ScatterError::InvalidRange("no coordinates to display".into()))?;

        let count = points.len() as f64;
        let center = LatLng::new(
            points.iter().map(|p| p.lat).sum::<f64>() / count,
            points.iter().map(|p| p.lng).sum::<f64>() / count,
        );

        let span = bounds.span();
        let zoom_lat = zoom_for_span(span.lat * ZOOM_MARGIN * LATITUDE_ASPECT_FACTOR);
        let zoom_lng = zoom_for_span(span.lng * ZOOM_MARGIN);
        let zoom = zoom_lat.min(zoom_lng).clamp(MIN_ZOOM, MAX_ZOOM);

        Ok(Self {
            center,
            zoom,
            bounds,
        })
    }
}

/// Tile zoom at which `delta` degrees fills the view. A zero spread maps to
/// the maximum zoom rather than infinity.
pub fn zoom_for_span(delta: f64) -> f64 {
    if !(delta > 0.0) {
        return MAX_ZOOM;
    }
    20.0 - (delta / DEGREES_PER_TILE_AT_Z19).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_mean() {
        let view = MapView::fit(&[
            LatLng::new(10.0, 0.0),
            LatLng::new(20.0, 10.0),
            LatLng::new(60.0, 20.0),
        ])
        .unwrap();
        assert!((view.center.lat - 30.0).abs() < 1e-12);
        assert!((view.center.lng - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_zoom_is_clamped() {
        let view = MapView::fit(&[LatLng::new(45.0, 3.0)]).unwrap();
        assert_eq!(view.zoom, MAX_ZOOM);
        assert_eq!(view.center, LatLng::new(45.0, 3.0));
    }

    #[test]
    fn test_identical_points_zoom_is_clamped() {
        let points = vec![LatLng::new(45.0, 45.0); 3];
        let view = MapView::fit(&points).unwrap();
        assert!(view.zoom.is_finite());
        assert!(view.zoom <= MAX_ZOOM);
    }

    #[test]
    fn test_global_spread_zoom_has_floor() {
        let view = MapView::fit(&[LatLng::new(-89.0, -180.0), LatLng::new(89.0, 180.0)]).unwrap();
        assert!(view.zoom >= MIN_ZOOM);
        assert!(view.zoom < 1.0);
    }

    #[test]
    fn test_smaller_axis_zoom_wins() {
        // Same latitude, 10 degrees of longitude: only the longitude spread counts.
        let view = MapView::fit(&[LatLng::new(0.0, 0.0), LatLng::new(0.0, 10.0)]).unwrap();
        let expected = zoom_for_span(10.0 * ZOOM_MARGIN);
        assert!((view.zoom - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_decreases_with_spread() {
        assert!(zoom_for_span(1.0) > zoom_for_span(10.0));
        assert!((zoom_for_span(DEGREES_PER_TILE_AT_Z19) - 20.0).abs() < 1e-12);
        assert_eq!(zoom_for_span(0.0), MAX_ZOOM);
    }

    #[test]
    fn test_empty_points_fail() {
        assert!(matches!(
            MapView::fit(&[]),
            Err(ScatterError::InvalidRange(_))
        ));
    }
}
