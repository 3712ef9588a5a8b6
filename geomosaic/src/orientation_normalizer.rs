//! Turns each photo so that the drone's heading points to the top of the canvas.
//!
//! A photo taken with heading `yaw` (clockwise from north) has its top edge
//! facing `yaw`. Rotating the pixels clockwise by `yaw` on screen (i.e. by
//! `-yaw` in the counter-clockwise math convention) puts north at the top.

use crate::affine_transform::AffineTransform;
use crate::photo::Photo;

/// Size in pixels of the box that fully encloses a `width` × `height` photo
/// rotated by `yaw` degrees.
pub fn rotated_size(width: usize, height: usize, yaw: f64) -> (usize, usize) {
    let t = AffineTransform::rotation_about((0.0, 0.0), yaw, (0.0, 0.0));
    let (w, h) = t.bounding_size(width as f64, height as f64);
    // Trim float noise so exact quarter turns do not grow by a pixel.
    let fit = |v: f64| (v - 1e-6).ceil().max(1.0) as usize;
    (fit(w), fit(h))
}

/// Returns a north-up copy of `photo` taken at heading `yaw` degrees.
///
/// The output is the whole rotated bounding box; corners not covered by the
/// source are fully transparent. Resampling is bilinear. An empty photo comes
/// back unchanged.
pub fn rotate(photo: &Photo, yaw: f64) -> Photo {
    if photo.is_empty() {
        return photo.clone();
    }

    let (out_w, out_h) = rotated_size(photo.width, photo.height, yaw);
    let src_center = (photo.width as f64 / 2.0, photo.height as f64 / 2.0);
    let dst_center = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    // Walk the output and pull each pixel from the source.
    let to_source = AffineTransform::rotation_about(dst_center, -yaw, src_center);

    let mut out = Photo::filled(out_w, out_h, [0, 0, 0, 0]);
    for y in 0..out_h {
        for x in 0..out_w {
            let (sx, sy) = to_source.transform(x as f64 + 0.5, y as f64 + 0.5);
            let [r, g, b, a] = photo.sample_bilinear(sx, sy);
            if a <= 0.0 {
                continue;
            }
            let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
            out.set_rgba(x, y, [q(r), q(g), q(b), q(a)]);
        }
    }
    out
}
