use nalgebra::{Matrix2, Vector2};

/// Represents a 2D affine transformation in pixel space. It includes:
/// - A reference origin (`origin`) in the input space.
/// - A 2×2 linear part (`linear`).
/// - A translation (`translate`) giving where `origin` lands in the output space.
///
/// A point `p` is transformed into `linear * (p - origin) + translate`.
///
/// Pixel coordinates follow raster convention: x grows to the right and y grows
/// downward, so a positive angle in [`AffineTransform::rotation_about`] turns
/// content clockwise on screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineTransform {
    pub origin: Vector2<f64>,
    pub translate: Vector2<f64>,
    pub linear: Matrix2<f64>,
}

impl AffineTransform {
    /// The transform that leaves every point where it is.
    pub fn identity() -> AffineTransform {
        AffineTransform {
            origin: Vector2::zeros(),
            translate: Vector2::zeros(),
            linear: Matrix2::identity(),
        }
    }

    /// Rotates by `angle_deg` (clockwise on screen) around `from_center`, then
    /// moves that center to `to_center`.
    ///
    /// # Examples
    /// ```
    /// # use geomosaic::affine_transform::AffineTransform;
    /// // Quarter turn around (1, 1): the point above the center ends up to its right.
    /// let t = AffineTransform::rotation_about((1.0, 1.0), 90.0, (1.0, 1.0));
    /// let (x, y) = t.transform(1.0, 0.0);
    /// assert!((x - 2.0).abs() < 1e-12 && (y - 1.0).abs() < 1e-12);
    /// ```
    pub fn rotation_about(
        from_center: (f64, f64),
        angle_deg: f64,
        to_center: (f64, f64),
    ) -> AffineTransform {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        AffineTransform {
            origin: Vector2::new(from_center.0, from_center.1),
            translate: Vector2::new(to_center.0, to_center.1),
            linear: Matrix2::new(cos, -sin, sin, cos),
        }
    }

    /// Transform a point (x, y) according to this affine transform
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.linear * (Vector2::new(x, y) - self.origin) + self.translate;
        (p.x, p.y)
    }

    /// The transform mapping output points back to input points, or `None` if
    /// the linear part is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let inv = self.linear.try_inverse()?;
        Some(AffineTransform {
            origin: self.translate,
            translate: self.origin,
            linear: inv,
        })
    }

    /// Axis-aligned size of a `width` × `height` rectangle after the linear part
    /// is applied.
    pub fn bounding_size(&self, width: f64, height: f64) -> (f64, f64) {
        let m = self.linear.abs();
        let size = m * Vector2::new(width, height);
        (size.x, size.y)
    }
}
