/// Pinhole camera geometry used to work out how much ground a nadir image covers.
///
/// Defaults describe a 35mm-format sensor behind a 20mm lens producing
/// 4000×3000 pixel frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    /// Sensor width in millimeters.
    pub sensor_width_mm: f64,
    /// Sensor height in millimeters.
    pub sensor_height_mm: f64,
    /// Lens focal length in millimeters.
    pub focal_length_mm: f64,
    /// Width in pixels of a full-resolution frame.
    pub image_width_px: usize,
    /// Height in pixels of a full-resolution frame.
    pub image_height_px: usize,
}

impl Default for CameraModel {
    fn default() -> Self {
        CameraModel {
            sensor_width_mm: 36.0,
            sensor_height_mm: 26.0,
            focal_length_mm: 20.0,
            image_width_px: 4000,
            image_height_px: 3000,
        }
    }
}

/// Ground area covered by one image, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundExtent {
    pub width_m: f64,
    pub height_m: f64,
}

/// Full angle of view (degrees) across a sensor side of `side_mm`.
///
/// # Examples
/// ```
/// # use geomosaic::camera::angle_of_view;
/// // A side twice the focal length sees 90 degrees.
/// assert!((angle_of_view(40.0, 20.0) - 90.0).abs() < 1e-9);
/// ```
pub fn angle_of_view(side_mm: f64, focal_length_mm: f64) -> f64 {
    (2.0 * (side_mm / (2.0 * focal_length_mm)).atan()).to_degrees()
}

impl CameraModel {
    pub fn horizontal_angle_of_view(&self) -> f64 {
        angle_of_view(self.sensor_width_mm, self.focal_length_mm)
    }

    pub fn vertical_angle_of_view(&self) -> f64 {
        angle_of_view(self.sensor_height_mm, self.focal_length_mm)
    }

    /// Ground width and height seen from `altitude` meters, looking straight down.
    pub fn ground_extent(&self, altitude: f64) -> GroundExtent {
        let half_h = (self.horizontal_angle_of_view() / 2.0).to_radians();
        let half_v = (self.vertical_angle_of_view() / 2.0).to_radians();
        GroundExtent {
            width_m: 2.0 * altitude * half_h.tan(),
            height_m: 2.0 * altitude * half_v.tan(),
        }
    }

    /// Image pixels per meter of ground at `altitude`.
    pub fn pixels_per_meter(&self, altitude: f64) -> f64 {
        self.image_width_px as f64 / self.ground_extent(altitude).width_m
    }

    /// Checks that every dimension is finite and positive.
    pub fn validate(&self) -> Result<(), String> {
        let dims = [
            ("sensor_width_mm", self.sensor_width_mm),
            ("sensor_height_mm", self.sensor_height_mm),
            ("focal_length_mm", self.focal_length_mm),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("camera {name} must be positive, got {value}"));
            }
        }
        if self.image_width_px == 0 || self.image_height_px == 0 {
            return Err("camera image dimensions must be non-zero".to_string());
        }
        Ok(())
    }
}
