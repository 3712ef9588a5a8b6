use crate::geo::GeoPoint;
use crate::photo::Photo;
use serde::{Deserialize, Serialize};

/// Fixed mapping between canvas pixels and geographic coordinates.
///
/// Pixel `(0, 0)` (its top-left corner) sits at `(origin_lat, origin_lon)`.
/// Columns grow eastward, rows grow southward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub pixels_per_degree_lat: f64,
    pub pixels_per_degree_lon: f64,
    pub width: usize,
    pub height: usize,
}

impl GeoReference {
    /// Continuous pixel position `(x, y)` of `point`.
    ///
    /// # Examples
    /// ```
    /// # use geomosaic::canvas::GeoReference;
    /// # use geomosaic::geo::GeoPoint;
    /// let r = GeoReference {
    ///     origin_lat: 10.0,
    ///     origin_lon: 20.0,
    ///     pixels_per_degree_lat: 100.0,
    ///     pixels_per_degree_lon: 50.0,
    ///     width: 100,
    ///     height: 100,
    /// };
    /// assert_eq!(r.geo_to_pixel(GeoPoint::new(9.5, 21.0)), (50.0, 50.0));
    /// assert_eq!(r.pixel_to_geo(50.0, 50.0), GeoPoint::new(9.5, 21.0));
    /// ```
    pub fn geo_to_pixel(&self, point: GeoPoint) -> (f64, f64) {
        let x = (point.lon - self.origin_lon) * self.pixels_per_degree_lon;
        let y = (self.origin_lat - point.lat) * self.pixels_per_degree_lat;
        (x, y)
    }

    /// Geographic coordinate of the continuous pixel position `(x, y)`.
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint {
            lat: self.origin_lat - y / self.pixels_per_degree_lat,
            lon: self.origin_lon + x / self.pixels_per_degree_lon,
        }
    }

    /// Renders the six lines of an ESRI world file (`.pgw`) for the canvas.
    ///
    /// World files reference the *center* of the top-left pixel.
    pub fn to_world_file(&self) -> String {
        let deg_x = 1.0 / self.pixels_per_degree_lon;
        let deg_y = 1.0 / self.pixels_per_degree_lat;
        let center = self.pixel_to_geo(0.5, 0.5);
        format!(
            "{:.12}\n0.0\n0.0\n{:.12}\n{:.12}\n{:.12}\n",
            deg_x, -deg_y, center.lon, center.lat
        )
    }
}

/// The raster every image is composited onto, together with its georeference.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    photo: Photo,
    reference: GeoReference,
}

impl Canvas {
    /// Allocates a canvas of `reference.width` × `reference.height` filled with `background`.
    pub fn new(reference: GeoReference, background: [u8; 4]) -> Canvas {
        Canvas {
            photo: Photo::filled(reference.width, reference.height, background),
            reference,
        }
    }

    pub fn geo_reference(&self) -> &GeoReference {
        &self.reference
    }

    pub fn photo(&self) -> &Photo {
        &self.photo
    }

    /// Gives up the georeference and returns the pixels.
    pub fn into_photo(self) -> Photo {
        self.photo
    }

    pub fn width(&self) -> usize {
        self.photo.width
    }

    pub fn height(&self) -> usize {
        self.photo.height
    }

    /// Pastes `image` so that its center lands on the canvas position `(x, y)`.
    ///
    /// Opaque source pixels replace what is underneath, fully transparent ones
    /// are skipped and partially transparent ones are composited "over" the
    /// canvas. Parts falling outside the canvas are clipped.
    pub fn paste_centered(&mut self, image: &Photo, x: f64, y: f64) {
        let left = (x - image.width as f64 / 2.0).round() as i64;
        let top = (y - image.height as f64 / 2.0).round() as i64;
        self.paste_at(image, left, top);
    }

    /// Pastes `image` with its top-left corner at `(left, top)`.
    pub fn paste_at(&mut self, image: &Photo, left: i64, top: i64) {
        let canvas_w = self.photo.width as i64;
        let canvas_h = self.photo.height as i64;

        let x_start = left.max(0);
        let y_start = top.max(0);
        let x_end = (left + image.width as i64).min(canvas_w);
        let y_end = (top + image.height as i64).min(canvas_h);

        for cy in y_start..y_end {
            let sy = (cy - top) as usize;
            for cx in x_start..x_end {
                let sx = (cx - left) as usize;
                let src_index = (sy * image.width + sx) * 4;
                let src = &image.img_data[src_index..src_index + 4];
                let alpha = src[3];
                if alpha == 0 {
                    continue;
                }

                let dst_index = (cy as usize * self.photo.width + cx as usize) * 4;
                let dst = &mut self.photo.img_data[dst_index..dst_index + 4];
                if alpha == 255 {
                    dst.copy_from_slice(src);
                } else {
                    composite_over(dst, src);
                }
            }
        }
    }
}

/// Straight-alpha "source over destination".
fn composite_over(dst: &mut [u8], src: &[u8]) {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
