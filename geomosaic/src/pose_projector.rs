//! Small-angle, flat-earth projection of a drone pose onto the ground.
//!
//! The camera is assumed to look straight down when pitch and roll are zero.
//! A tilted camera sees a ground point displaced by `altitude * tan(angle)`:
//! pitch moves it north/south, roll moves it east/west. Yaw only changes which
//! way the frame is turned, not where its center lands.
//!
//! The model is only meaningful for angles well below 90 degrees. Nothing is
//! clamped: near-vertical angles produce very large (or infinite) offsets.

use crate::camera::GroundExtent;
use crate::geo::{EarthModel, GeoPoint};
use crate::pose::Pose;
use serde::Serialize;

/// Center and corners of the ground area an image shows.
///
/// Corners follow the image: top-left, top-right, bottom-right, bottom-left,
/// where "top" is the direction the drone was heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoFootprint {
    pub center: GeoPoint,
    pub corners: [GeoPoint; 4],
}

/// Ground offset in meters `(east, north)` produced by the pose's tilt.
pub fn tilt_offset_meters(pose: &Pose) -> (f64, f64) {
    let north = pose.altitude * pose.pitch.to_radians().tan();
    let east = pose.altitude * pose.roll.to_radians().tan();
    (east, north)
}

/// Geographic coordinate of the image center.
///
/// # Examples
/// ```
/// # use geomosaic::geo::{EarthModel, GeoPoint};
/// # use geomosaic::pose::Pose;
/// # use geomosaic::pose_projector::project;
/// let pose = Pose::new(37.0, -122.0, 50.0, 0.0, 0.0, 0.0).unwrap();
/// assert_eq!(project(&pose, &EarthModel::default()), GeoPoint::new(37.0, -122.0));
/// ```
pub fn project(pose: &Pose, earth: &EarthModel) -> GeoPoint {
    let (east, north) = tilt_offset_meters(pose);
    GeoPoint {
        lat: pose.latitude + earth.meters_to_latitude_degrees(north),
        lon: pose.longitude + earth.meters_to_longitude_degrees(east, pose.latitude),
    }
}

/// Projects the pose and lays the image's ground extent around the center,
/// turned to the drone's heading.
pub fn project_footprint(pose: &Pose, extent: GroundExtent, earth: &EarthModel) -> GeoFootprint {
    let center = project(pose, earth);
    let half_w = extent.width_m / 2.0;
    let half_h = extent.height_m / 2.0;
    let (sin, cos) = pose.yaw.to_radians().sin_cos();

    // (right, forward) in the camera frame, heading-rotated into (east, north).
    let corner = |right: f64, forward: f64| {
        let east = right * cos + forward * sin;
        let north = -right * sin + forward * cos;
        earth.offset(center, east, north)
    };

    GeoFootprint {
        center,
        corners: [
            corner(-half_w, half_h),
            corner(half_w, half_h),
            corner(half_w, -half_h),
            corner(-half_w, -half_h),
        ],
    }
}
