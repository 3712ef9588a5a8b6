//! # GeoMosaic Library
//!
//! The `geomosaic` library assembles individually posed aerial photographs into a
//! single north-up, georeferenced mosaic. Each photo carries the drone's
//! telemetry (latitude, longitude, altitude, pitch, roll, yaw); the library works
//! out which ground point each photo's center shows, turns every photo to face
//! north and pastes them onto one shared canvas in capture order.
//!
//! ## Overview of Modules
//!
//! - **`pose`**: The `Pose` telemetry record, its validation rules and the
//!   `DroneImage` (identifier + pose) capture record.
//!
//! - **`geo`**: `GeoPoint`, `GeoBounds` and the `EarthModel` flat-earth
//!   meters-to-degrees conversion.
//!
//! - **`camera`**: `CameraModel` angle-of-view geometry used to find how much
//!   ground one photo covers and the native pixels-per-meter.
//!
//! - **`pose_projector`**: Small-angle projection of a pose to the ground point
//!   its image center shows, plus the four footprint corners.
//!
//! - **`orientation_normalizer`**: Rotates a photo's pixels by its heading so
//!   the result is north-up, keeping the full rotated bounding box.
//!
//! - **`affine_transform`**: 2D rotation/translation in pixel space used by the
//!   normalizer.
//!
//! - **`photo`**: A basic RGBA `Photo` raster with bilinear sampling and
//!   proportional downscaling.
//!
//! - **`canvas`**: The shared output raster and its `GeoReference`
//!   (pixel ↔ latitude/longitude mapping, world file rendering).
//!
//! - **`mosaic`**: The compositor: bounds pass, canvas planning and the
//!   capture-order paste pass, configured through `MosaicConfig`.
//!
//! - **`pipeline`**: `MosaicProcessor`, which drives a whole capture sequence
//!   through projection, rotation and compositing, skipping bad records.
//!
//! - **`manifest`**: JSON loading of the capture sequence.
//!
//! - **`error`**: `PoseError` and `MosaicError`.

pub mod error;
pub mod geo;
pub mod camera;
pub mod pose;
pub mod pose_projector;
pub mod photo;
pub mod affine_transform;
pub mod orientation_normalizer;
pub mod canvas;
pub mod mosaic;
pub mod pipeline;
pub mod manifest;

pub use canvas::{Canvas, GeoReference};
pub use error::{MosaicError, PoseError};
pub use geo::{EarthModel, GeoPoint};
pub use mosaic::MosaicConfig;
pub use pipeline::{MosaicProcessor, MosaicResult, PhotoSource};
pub use pose::{DroneImage, Pose};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
