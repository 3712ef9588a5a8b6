//! Two-pass compositing of north-up tiles onto one georeferenced canvas.
//!
//! The bounds pass sizes the canvas so every tile fits. The paste pass then
//! drops tiles in capture order; where tiles overlap the later one wins, so
//! seams between neighbouring photos stay visible.

use crate::camera::CameraModel;
use crate::canvas::{Canvas, GeoReference};
use crate::error::MosaicError;
use crate::geo::{EarthModel, GeoBounds, GeoPoint};
use crate::photo::Photo;
use log::debug;

/// Settings shared by the bounds and paste passes.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicConfig {
    pub earth: EarthModel,
    pub camera: CameraModel,
    /// Canvas resolution. When `None` it is derived from the camera model at
    /// the mean altitude of the accepted images.
    pub pixels_per_meter: Option<f64>,
    /// Factor in `(0, 1]` applied to the photos and the canvas resolution.
    pub output_scale: f64,
    /// Fill color for canvas pixels no image covers.
    pub background: [u8; 4],
    /// Upper bound on `width * height` of the canvas.
    pub max_canvas_pixels: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        MosaicConfig {
            earth: EarthModel::default(),
            camera: CameraModel::default(),
            pixels_per_meter: None,
            output_scale: 1.0,
            background: [255, 255, 255, 255],
            max_canvas_pixels: 400_000_000,
        }
    }
}

impl MosaicConfig {
    pub fn validate(&self) -> Result<(), MosaicError> {
        let mpd = self.earth.meters_per_degree_latitude;
        if !mpd.is_finite() || mpd <= 0.0 {
            return Err(MosaicError::InvalidConfig(format!(
                "meters per degree latitude must be positive, got {mpd}"
            )));
        }
        if let Some(ppm) = self.pixels_per_meter {
            if !ppm.is_finite() || ppm <= 0.0 {
                return Err(MosaicError::InvalidConfig(format!(
                    "pixels per meter must be positive, got {ppm}"
                )));
            }
        }
        if !(self.output_scale > 0.0 && self.output_scale <= 1.0) {
            return Err(MosaicError::InvalidConfig(format!(
                "output scale must be in (0, 1], got {}",
                self.output_scale
            )));
        }
        if self.max_canvas_pixels == 0 {
            return Err(MosaicError::InvalidConfig(
                "max canvas pixels must be non-zero".to_string(),
            ));
        }
        self.camera.validate().map_err(MosaicError::InvalidConfig)
    }

    /// Canvas resolution for a flight whose images were taken at `mean_altitude`.
    pub fn canvas_pixels_per_meter(&self, mean_altitude: f64) -> f64 {
        let native = self
            .pixels_per_meter
            .unwrap_or_else(|| self.camera.pixels_per_meter(mean_altitude));
        native * self.output_scale
    }
}

/// What the bounds pass needs to know about one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileExtent {
    /// Ground point the tile's center shows.
    pub center: GeoPoint,
    /// Size in pixels of the north-up (already rotated) tile.
    pub width: usize,
    pub height: usize,
}

impl TileExtent {
    /// Ground box covered by the tile at `pixels_per_meter`, with longitude
    /// degrees measured at latitude `scale_lat`.
    pub fn bounds(&self, pixels_per_meter: f64, earth: &EarthModel, scale_lat: f64) -> GeoBounds {
        let half_w_m = self.width as f64 / 2.0 / pixels_per_meter;
        let half_h_m = self.height as f64 / 2.0 / pixels_per_meter;
        let dlat = earth.meters_to_latitude_degrees(half_h_m);
        let dlon = earth.meters_to_longitude_degrees(half_w_m, scale_lat);
        GeoBounds {
            min_lat: self.center.lat - dlat,
            max_lat: self.center.lat + dlat,
            min_lon: self.center.lon - dlon,
            max_lon: self.center.lon + dlon,
        }
    }
}

/// Union of every tile's ground box.
///
/// Longitude extents use the same mid-latitude scale as [`plan_canvas`], so
/// every tile fits the planned canvas exactly.
pub fn compute_bounds(
    tiles: &[TileExtent],
    pixels_per_meter: f64,
    earth: &EarthModel,
) -> Result<GeoBounds, MosaicError> {
    let union_at = |scale_lat: Option<f64>| {
        tiles
            .iter()
            .map(|t| t.bounds(pixels_per_meter, earth, scale_lat.unwrap_or(t.center.lat)))
            .reduce(|acc, b| acc.union(&b))
    };
    // The latitude extent does not depend on the longitude scale.
    let mid_lat = union_at(None).ok_or(MosaicError::EmptyInput)?.mid_lat();
    let bounds = union_at(Some(mid_lat)).ok_or(MosaicError::EmptyInput)?;
    if !bounds.is_proper() {
        return Err(MosaicError::DegenerateBounds {
            min_lat: bounds.min_lat,
            max_lat: bounds.max_lat,
            min_lon: bounds.min_lon,
            max_lon: bounds.max_lon,
        });
    }
    Ok(bounds)
}

/// Chooses the canvas size and pixel mapping that covers `bounds`.
pub fn plan_canvas(
    bounds: &GeoBounds,
    pixels_per_meter: f64,
    config: &MosaicConfig,
) -> Result<GeoReference, MosaicError> {
    let earth = &config.earth;
    let pixels_per_degree_lat = pixels_per_meter * earth.meters_per_degree_latitude;
    let pixels_per_degree_lon = pixels_per_meter * earth.meters_per_degree_longitude(bounds.mid_lat());

    // Trim float noise so an exact fit does not gain a column or row.
    let width_f = (bounds.lon_span() * pixels_per_degree_lon - 1e-6).ceil();
    let height_f = (bounds.lat_span() * pixels_per_degree_lat - 1e-6).ceil();
    let degenerate = || MosaicError::DegenerateBounds {
        min_lat: bounds.min_lat,
        max_lat: bounds.max_lat,
        min_lon: bounds.min_lon,
        max_lon: bounds.max_lon,
    };
    if !width_f.is_finite() || !height_f.is_finite() || width_f < 1.0 || height_f < 1.0 {
        return Err(degenerate());
    }

    if width_f * height_f > config.max_canvas_pixels as f64 {
        return Err(MosaicError::CanvasTooLarge {
            width: width_f,
            height: height_f,
            max_pixels: config.max_canvas_pixels,
        });
    }
    // Both sides are now at most `max_canvas_pixels`.
    let (width, height) = (width_f as usize, height_f as usize);

    Ok(GeoReference {
        origin_lat: bounds.max_lat,
        origin_lon: bounds.min_lon,
        pixels_per_degree_lat,
        pixels_per_degree_lon,
        width,
        height,
    })
}

/// Owns the canvas while tiles are pasted onto it.
pub struct MosaicCompositor {
    canvas: Canvas,
    pasted: usize,
}

impl MosaicCompositor {
    /// Runs the bounds pass over `tiles` and allocates the canvas.
    pub fn new(
        tiles: &[TileExtent],
        pixels_per_meter: f64,
        config: &MosaicConfig,
    ) -> Result<Self, MosaicError> {
        config.validate()?;
        let bounds = compute_bounds(tiles, pixels_per_meter, &config.earth)?;
        let reference = plan_canvas(&bounds, pixels_per_meter, config)?;
        debug!(
            "bounds lat [{:.7}, {:.7}] lon [{:.7}, {:.7}] -> canvas {}x{} ({:.3} px/m)",
            bounds.min_lat,
            bounds.max_lat,
            bounds.min_lon,
            bounds.max_lon,
            reference.width,
            reference.height,
            pixels_per_meter
        );
        Ok(MosaicCompositor {
            canvas: Canvas::new(reference, config.background),
            pasted: 0,
        })
    }

    pub fn geo_reference(&self) -> &GeoReference {
        self.canvas.geo_reference()
    }

    /// Pastes a north-up tile centered on `center`. Returns the canvas pixel
    /// position of the center.
    pub fn paste(&mut self, tile: &Photo, center: GeoPoint) -> (f64, f64) {
        let (x, y) = self.canvas.geo_reference().geo_to_pixel(center);
        self.canvas.paste_centered(tile, x, y);
        self.pasted += 1;
        (x, y)
    }

    pub fn pasted_count(&self) -> usize {
        self.pasted
    }

    pub fn finish(self) -> Canvas {
        self.canvas
    }
}

/// Composites already rotated tiles, in the given order, at `pixels_per_meter`.
pub fn compose(
    tiles: &[(Photo, GeoPoint)],
    pixels_per_meter: f64,
    config: &MosaicConfig,
) -> Result<Canvas, MosaicError> {
    let extents: Vec<TileExtent> = tiles
        .iter()
        .map(|(photo, center)| TileExtent {
            center: *center,
            width: photo.width,
            height: photo.height,
        })
        .collect();
    let mut compositor = MosaicCompositor::new(&extents, pixels_per_meter, config)?;
    for (photo, center) in tiles {
        compositor.paste(photo, *center);
    }
    Ok(compositor.finish())
}
