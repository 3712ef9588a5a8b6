//! Reads the capture sequence from JSON.
//!
//! The manifest is an array of objects in capture order:
//!
//! ```json
//! [
//!   {"filename": "IMG_0001.JPG", "lat": 37.1, "long": -122.1,
//!    "altitude": 50.0, "yaw": 12.0, "pitch": 1.5, "roll": -0.5}
//! ]
//! ```
//!
//! `latitude`, `longitude`/`lon` and `id` are accepted as field names too.
//! Poses are not validated here so one bad record can be skipped later
//! without rejecting the whole file.

use crate::error::MosaicError;
use crate::pose::DroneImage;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Parses a manifest from any reader.
pub fn load_manifest<R: Read>(reader: R) -> Result<Vec<DroneImage>, MosaicError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Parses a manifest file.
pub fn load_manifest_file(path: &Path) -> Result<Vec<DroneImage>, MosaicError> {
    let file = File::open(path)?;
    load_manifest(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_field_names_in_order() {
        let json = r#"[
            {"filename": "a.jpg", "lat": 37.0, "long": -122.0, "altitude": 50.0,
             "yaw": 10.0, "pitch": 1.0, "roll": -2.0},
            {"filename": "b.jpg", "lat": 37.1, "long": -122.1, "altitude": 51.0,
             "yaw": 20.0, "pitch": 0.0, "roll": 0.0}
        ]"#;
        let images = load_manifest(json.as_bytes()).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, "a.jpg");
        assert_eq!(images[0].pose.longitude, -122.0);
        assert_eq!(images[0].pose.roll, -2.0);
        assert_eq!(images[1].id, "b.jpg");
    }

    #[test]
    fn parses_long_field_names() {
        let json = r#"[{"id": "x", "latitude": 1.0, "longitude": 2.0, "altitude": 3.0,
                        "yaw": 0.0, "pitch": 0.0, "roll": 0.0}]"#;
        let images = load_manifest(json.as_bytes()).unwrap();
        assert_eq!(images[0].pose.latitude, 1.0);
        assert_eq!(images[0].pose.longitude, 2.0);
    }

    #[test]
    fn keeps_invalid_poses_for_later() {
        let json = r#"[{"filename": "x", "lat": 1.0, "long": 2.0, "altitude": -3.0,
                        "yaw": 0.0, "pitch": 0.0, "roll": 0.0}]"#;
        let images = load_manifest(json.as_bytes()).unwrap();
        assert!(images[0].pose.validate().is_err());
    }

    #[test]
    fn missing_field_is_a_manifest_error() {
        let json = r#"[{"filename": "x", "lat": 1.0}]"#;
        assert!(matches!(load_manifest(json.as_bytes()), Err(MosaicError::Manifest(_))));
    }
}
