use crate::error::PoseError;
use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Drone telemetry recorded when a photo was taken.
///
/// Angles are in degrees:
/// - `pitch`: positive when the nose is up.
/// - `roll`: positive when the right wing is up. A positive roll moves the
///   imaged ground point east of the drone.
/// - `yaw`: compass heading, clockwise from true north.
///
/// `altitude` is meters above the ground being photographed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "long", alias = "lon")]
    pub longitude: f64,
    pub altitude: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Pose {
    /// Builds a pose and checks it with [`Pose::validate`].
    ///
    /// # Examples
    /// ```
    /// # use geomosaic::pose::Pose;
    /// assert!(Pose::new(37.0, -122.0, 50.0, 0.0, 0.0, 0.0).is_ok());
    /// assert!(Pose::new(37.0, -122.0, 0.0, 0.0, 0.0, 0.0).is_err());
    /// ```
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        pitch: f64,
        roll: f64,
        yaw: f64,
    ) -> Result<Pose, PoseError> {
        let pose = Pose {
            latitude,
            longitude,
            altitude,
            pitch,
            roll,
            yaw,
        };
        pose.validate()?;
        Ok(pose)
    }

    /// All fields must be finite and the altitude strictly positive.
    ///
    /// Large pitch or roll angles are accepted; the projection simply becomes
    /// less meaningful as they approach 90 degrees.
    pub fn validate(&self) -> Result<(), PoseError> {
        let fields = [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("altitude", self.altitude),
            ("pitch", self.pitch),
            ("roll", self.roll),
            ("yaw", self.yaw),
        ];
        if let Some((field, value)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PoseError::NonFinite { field, value });
        }
        if self.altitude <= 0.0 {
            return Err(PoseError::NonPositiveAltitude(self.altitude));
        }
        Ok(())
    }

    /// Where the drone itself was.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// One entry of the capture sequence: an image identifier and its pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneImage {
    #[serde(alias = "filename")]
    pub id: String,
    #[serde(flatten)]
    pub pose: Pose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_fields() {
        let err = Pose::new(f64::NAN, 0.0, 10.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, PoseError::NonFinite { field: "latitude", .. }));

        let err = Pose::new(0.0, 0.0, 10.0, 0.0, f64::INFINITY, 0.0).unwrap_err();
        assert!(matches!(err, PoseError::NonFinite { field: "roll", .. }));
    }

    #[test]
    fn rejects_non_positive_altitude() {
        assert_eq!(
            Pose::new(0.0, 0.0, -5.0, 0.0, 0.0, 0.0),
            Err(PoseError::NonPositiveAltitude(-5.0))
        );
    }

    #[test]
    fn accepts_steep_angles() {
        assert!(Pose::new(0.0, 0.0, 10.0, 89.9, -89.9, 359.0).is_ok());
    }
}
