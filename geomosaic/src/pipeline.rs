use crate::canvas::Canvas;
use crate::error::MosaicError;
use crate::mosaic::{MosaicCompositor, MosaicConfig, TileExtent};
use crate::orientation_normalizer;
use crate::photo::Photo;
use crate::pose::{DroneImage, Pose};
use crate::pose_projector::{self, GeoFootprint};
use log::{info, warn};
use serde::Serialize;
use std::ops::Range;

/// Supplies decoded pixels for an image identifier.
///
/// Any `Fn(&str) -> Result<Photo, String>` closure is a source.
pub trait PhotoSource {
    fn load(&self, id: &str) -> Result<Photo, String>;

    /// Width and height of the image. The default decodes it and throws the
    /// pixels away; sources that can read a header should override this.
    fn dimensions(&self, id: &str) -> Result<(usize, usize), String> {
        self.load(id).map(|photo| (photo.width, photo.height))
    }
}

impl<F> PhotoSource for F
where
    F: Fn(&str) -> Result<Photo, String>,
{
    fn load(&self, id: &str) -> Result<Photo, String> {
        self(id)
    }
}

/// A record whose pose passed validation, with its ground footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedImage {
    pub index: usize,
    pub id: String,
    pub pose: Pose,
    pub footprint: GeoFootprint,
}

impl ProjectedImage {
    /// Ground distance in meters between the drone and the image center.
    pub fn tilt_offset(&self) -> f64 {
        let (east, north) = pose_projector::tilt_offset_meters(&self.pose);
        east.hypot(north)
    }
}

/// Where one image ended up on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub index: usize,
    pub id: String,
    pub footprint: GeoFootprint,
    /// Canvas pixel position of the image center.
    pub pixel_x: f64,
    pub pixel_y: f64,
    /// Clockwise rotation applied to the pixels, in degrees.
    pub rotation: f64,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct MosaicResult {
    pub canvas: Canvas,
    /// Pasted images, in capture order.
    pub placements: Vec<Placement>,
    /// Images left out of the mosaic, each with its index, id and reason,
    /// ordered by capture index.
    pub skipped: Vec<MosaicError>,
}

/// Runs the whole flow for a capture sequence:
/// 1. Validates and projects every pose; invalid or unplaceable ones are skipped.
/// 2. Sizes the canvas from each photo's dimensions (bounds pass). While the
///    canvas would break the pixel limit, the image whose center lies farthest
///    from its drone is dropped.
/// 3. Loads, optionally downscales, turns north-up and pastes one photo at a
///    time in capture order (paste pass).
pub struct MosaicProcessor {
    config: MosaicConfig,
}

impl MosaicProcessor {
    pub fn new(config: MosaicConfig) -> Result<Self, MosaicError> {
        config.validate()?;
        Ok(MosaicProcessor { config })
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Validates and projects each record, keeping capture order.
    pub fn project_all(&self, records: &[DroneImage]) -> (Vec<ProjectedImage>, Vec<MosaicError>) {
        self.project_from(records, 0)
    }

    /// Like [`project_all`](Self::project_all) for records whose capture index
    /// starts at `first_index`.
    fn project_from(
        &self,
        records: &[DroneImage],
        first_index: usize,
    ) -> (Vec<ProjectedImage>, Vec<MosaicError>) {
        let mut projected = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        for (offset, record) in records.iter().enumerate() {
            let index = first_index + offset;
            if let Err(source) = record.pose.validate() {
                let err = MosaicError::InvalidPose {
                    index,
                    id: record.id.clone(),
                    source,
                };
                warn!("skipping {err}");
                skipped.push(err);
                continue;
            }
            let extent = self.config.camera.ground_extent(record.pose.altitude);
            projected.push(ProjectedImage {
                index,
                id: record.id.clone(),
                pose: record.pose,
                footprint: pose_projector::project_footprint(&record.pose, extent, &self.config.earth),
            });
        }
        (projected, skipped)
    }

    /// Rejects images whose center does not land on the map.
    fn check_placeable(image: &ProjectedImage) -> Result<(), MosaicError> {
        let center = image.footprint.center;
        if center.lat.is_finite() && center.lon.is_finite() && center.lat.abs() < 90.0 {
            return Ok(());
        }
        Err(MosaicError::Unplaceable {
            index: image.index,
            id: image.id.clone(),
            reason: format!(
                "projected center ({}, {}) is off the map (pitch {}, roll {})",
                center.lat, center.lon, image.pose.pitch, image.pose.roll
            ),
        })
    }

    fn scaled_width(&self, width: usize) -> usize {
        ((width as f64 * self.config.output_scale).round() as usize).max(1)
    }

    /// Size of the north-up tile `prepare_tile` will produce for a photo of
    /// `width` × `height` pixels.
    fn tile_size(&self, image: &ProjectedImage, width: usize, height: usize) -> (usize, usize) {
        let (width, height) = if self.config.output_scale < 1.0 {
            let new_width = self.scaled_width(width);
            (new_width, Photo::proportional_height(width, height, new_width))
        } else {
            (width, height)
        };
        orientation_normalizer::rotated_size(width, height, image.pose.yaw)
    }

    fn load_error(image: &ProjectedImage, message: String) -> MosaicError {
        MosaicError::ImageLoad {
            index: image.index,
            id: image.id.clone(),
            message,
        }
    }

    /// Bounds-pass extent of one image, from its dimensions only.
    fn extent_of<S>(&self, image: &ProjectedImage, source: &S) -> Result<TileExtent, MosaicError>
    where
        S: PhotoSource + ?Sized,
    {
        let (width, height) = source
            .dimensions(&image.id)
            .map_err(|message| Self::load_error(image, message))?;
        if width == 0 || height == 0 {
            return Err(Self::load_error(image, "image has no pixels".to_string()));
        }
        let (width, height) = self.tile_size(image, width, height);
        Ok(TileExtent {
            center: image.footprint.center,
            width,
            height,
        })
    }

    /// Loads one projected image and returns it north-up at the working scale.
    fn prepare_tile<S>(&self, image: &ProjectedImage, source: &S) -> Result<Photo, MosaicError>
    where
        S: PhotoSource + ?Sized,
    {
        let photo = source
            .load(&image.id)
            .map_err(|message| Self::load_error(image, message))?;
        if photo.is_empty() {
            return Err(Self::load_error(image, "image has no pixels".to_string()));
        }
        let photo = if self.config.output_scale < 1.0 {
            photo
                .get_scaled_proportional(self.scaled_width(photo.width))
                .ok_or_else(|| Self::load_error(image, "could not downscale image".to_string()))?
        } else {
            photo
        };
        Ok(orientation_normalizer::rotate(&photo, image.pose.yaw))
    }

    /// Allocates the canvas for `planned`, dropping the most tilted images
    /// until it fits within `max_canvas_pixels`. Returns the compositor and
    /// its resolution.
    fn plan(
        &self,
        planned: &mut Vec<(ProjectedImage, TileExtent)>,
        skipped: &mut Vec<MosaicError>,
    ) -> Result<(MosaicCompositor, f64), MosaicError> {
        loop {
            let mean_altitude = planned.iter().map(|(image, _)| image.pose.altitude).sum::<f64>()
                / planned.len() as f64;
            let pixels_per_meter = self.config.canvas_pixels_per_meter(mean_altitude);
            let extents: Vec<TileExtent> = planned.iter().map(|(_, extent)| *extent).collect();

            match MosaicCompositor::new(&extents, pixels_per_meter, &self.config) {
                Ok(compositor) => return Ok((compositor, pixels_per_meter)),
                Err(MosaicError::CanvasTooLarge { width, height, .. }) if planned.len() > 1 => {
                    let worst = planned
                        .iter()
                        .enumerate()
                        .max_by(|(_, a), (_, b)| a.0.tilt_offset().total_cmp(&b.0.tilt_offset()))
                        .map(|(i, _)| i)
                        .unwrap_or(planned.len() - 1);
                    let (image, _) = planned.remove(worst);
                    let err = MosaicError::Unplaceable {
                        index: image.index,
                        id: image.id.clone(),
                        reason: format!(
                            "center lies {:.0} m from the drone and stretches the canvas to {}x{} pixels (limit {})",
                            image.tilt_offset(),
                            width,
                            height,
                            self.config.max_canvas_pixels
                        ),
                    };
                    warn!("skipping {err}");
                    skipped.push(err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Builds the mosaic for `records`, pulling pixels from `source`.
    ///
    /// Records with invalid poses, unplaceable centers or unloadable images are
    /// reported in [`MosaicResult::skipped`] and the rest are still composited.
    /// Fails with [`MosaicError::EmptyInput`] when nothing is left to composite.
    pub fn run<S>(&self, records: &[DroneImage], source: &S) -> Result<MosaicResult, MosaicError>
    where
        S: PhotoSource + ?Sized,
    {
        self.run_range(records, 0..records.len(), source)
    }

    /// Builds the mosaic for the records in `range` only. Reported indices
    /// still refer to positions in the full `records` sequence.
    pub fn run_range<S>(
        &self,
        records: &[DroneImage],
        range: Range<usize>,
        source: &S,
    ) -> Result<MosaicResult, MosaicError>
    where
        S: PhotoSource + ?Sized,
    {
        let selected = records.get(range.clone()).ok_or_else(|| {
            MosaicError::InvalidConfig(format!(
                "image range {range:?} is outside the {} record(s)",
                records.len()
            ))
        })?;
        let (projected, mut skipped) = self.project_from(selected, range.start);

        let mut planned = Vec::with_capacity(projected.len());
        for image in projected {
            match Self::check_placeable(&image).and_then(|()| self.extent_of(&image, source)) {
                Ok(extent) => planned.push((image, extent)),
                Err(err) => {
                    warn!("skipping {err}");
                    skipped.push(err);
                }
            }
        }
        if planned.is_empty() {
            return Err(MosaicError::EmptyInput);
        }

        let (mut compositor, pixels_per_meter) = self.plan(&mut planned, &mut skipped)?;
        let reference = compositor.geo_reference();
        info!(
            "canvas {}x{} at {:.4} px/m, {} image(s), {} skipped",
            reference.width,
            reference.height,
            pixels_per_meter,
            planned.len(),
            skipped.len()
        );

        let mut placements = Vec::with_capacity(planned.len());
        for (image, extent) in planned {
            let tile = match self.prepare_tile(&image, source) {
                Ok(tile) => tile,
                Err(err) => {
                    warn!("skipping {err}");
                    skipped.push(err);
                    continue;
                }
            };
            if (tile.width, tile.height) != (extent.width, extent.height) {
                warn!(
                    "image {} is {}x{} after rotation, expected {}x{}",
                    image.id, tile.width, tile.height, extent.width, extent.height
                );
            }
            let (pixel_x, pixel_y) = compositor.paste(&tile, image.footprint.center);
            info!(
                "placed image {} at ({:.0}, {:.0}), rotated {:.2} degrees",
                image.id, pixel_x, pixel_y, image.pose.yaw
            );
            placements.push(Placement {
                index: image.index,
                id: image.id,
                footprint: image.footprint,
                pixel_x,
                pixel_y,
                rotation: image.pose.yaw,
            });
        }
        if placements.is_empty() {
            return Err(MosaicError::EmptyInput);
        }

        skipped.sort_by_key(|err| err.image_index());
        Ok(MosaicResult {
            canvas: compositor.finish(),
            placements,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn record(id: &str, lat: f64, lon: f64, altitude: f64) -> DroneImage {
        DroneImage {
            id: id.to_string(),
            pose: Pose {
                latitude: lat,
                longitude: lon,
                altitude,
                pitch: 0.0,
                roll: 0.0,
                yaw: 0.0,
            },
        }
    }

    fn solid(_: &str) -> Result<Photo, String> {
        Ok(Photo::filled(8, 6, [50, 60, 70, 255]))
    }

    fn processor() -> MosaicProcessor {
        MosaicProcessor::new(MosaicConfig {
            pixels_per_meter: Some(1.0),
            ..MosaicConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn invalid_pose_is_skipped_not_fatal() {
        let records = vec![
            record("a.jpg", 0.0, 0.0, 50.0),
            record("bad.jpg", 0.0, 0.0, -1.0),
            record("c.jpg", 0.0001, 0.0001, 50.0),
        ];
        let result = processor().run(&records, &solid).unwrap();
        assert_eq!(result.placements.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].image_index(), Some(1));
        assert!(result.skipped[0].to_string().contains("bad.jpg"));
    }

    #[test]
    fn load_failure_is_reported_with_context() {
        let records = vec![record("a.jpg", 0.0, 0.0, 50.0), record("missing.jpg", 0.0, 0.0, 50.0)];
        let source = |id: &str| {
            if id == "missing.jpg" {
                Err("no such file".to_string())
            } else {
                solid(id)
            }
        };
        let result = processor().run(&records, &source).unwrap();
        assert_eq!(result.placements.len(), 1);
        match &result.skipped[0] {
            MosaicError::ImageLoad { index, id, message } => {
                assert_eq!(*index, 1);
                assert_eq!(id, "missing.jpg");
                assert_eq!(message, "no such file");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn nothing_valid_is_empty_input() {
        let records = vec![record("bad.jpg", 0.0, 0.0, 0.0)];
        let err = processor().run(&records, &solid).unwrap_err();
        assert!(matches!(err, MosaicError::EmptyInput));
        assert!(matches!(processor().run(&[], &solid), Err(MosaicError::EmptyInput)));
    }

    #[test]
    fn output_scale_shrinks_tiles_and_canvas() {
        let records = vec![record("a.jpg", 0.0, 0.0, 50.0)];
        let full = processor().run(&records, &solid).unwrap();
        let half = MosaicProcessor::new(MosaicConfig {
            pixels_per_meter: Some(1.0),
            output_scale: 0.5,
            ..MosaicConfig::default()
        })
        .unwrap()
        .run(&records, &solid)
        .unwrap();
        assert_eq!((full.canvas.width(), full.canvas.height()), (8, 6));
        assert_eq!((half.canvas.width(), half.canvas.height()), (4, 3));
    }

    fn tilted(id: &str, pitch: f64) -> DroneImage {
        let mut image = record(id, 37.0, -122.0, 100.0);
        image.pose.pitch = pitch;
        image
    }

    #[test]
    fn near_vertical_pose_is_skipped_not_fatal() {
        let frame = |_: &str| -> Result<Photo, String> { Ok(Photo::filled(400, 300, [10, 20, 30, 255])) };
        let processor = MosaicProcessor::new(MosaicConfig::default()).unwrap();
        for pitch in [89.9, 90.0] {
            let records = vec![tilted("level.jpg", 0.0), tilted("steep.jpg", pitch)];
            let result = processor.run(&records, &frame).unwrap();
            assert_eq!(result.placements.len(), 1, "pitch {pitch}");
            assert_eq!(result.placements[0].id, "level.jpg");
            assert_eq!(result.skipped.len(), 1, "pitch {pitch}");
            match &result.skipped[0] {
                MosaicError::Unplaceable { index, id, .. } => {
                    assert_eq!((*index, id.as_str()), (1, "steep.jpg"));
                }
                other => panic!("unexpected error {other:?}"),
            }
            let reference = result.canvas.geo_reference();
            assert!(reference.width * reference.height <= processor.config().max_canvas_pixels);
        }
    }

    #[test]
    fn single_oversized_image_is_still_an_error() {
        let processor = MosaicProcessor::new(MosaicConfig {
            pixels_per_meter: Some(1.0),
            max_canvas_pixels: 10,
            ..MosaicConfig::default()
        })
        .unwrap();
        let records = vec![record("a.jpg", 0.0, 0.0, 50.0)];
        assert!(matches!(
            processor.run(&records, &solid),
            Err(MosaicError::CanvasTooLarge { .. })
        ));
    }

    struct RecordingSource {
        calls: RefCell<Vec<String>>,
    }

    impl PhotoSource for RecordingSource {
        fn load(&self, id: &str) -> Result<Photo, String> {
            self.calls.borrow_mut().push(format!("load {id}"));
            solid(id)
        }

        fn dimensions(&self, id: &str) -> Result<(usize, usize), String> {
            self.calls.borrow_mut().push(format!("size {id}"));
            Ok((8, 6))
        }
    }

    #[test]
    fn pixels_are_loaded_once_during_the_paste_pass() {
        let source = RecordingSource {
            calls: RefCell::new(Vec::new()),
        };
        let records = vec![record("a.jpg", 0.0, 0.0, 50.0), record("b.jpg", 0.0001, 0.0001, 50.0)];
        let result = processor().run(&records, &source).unwrap();
        assert_eq!(result.placements.len(), 2);
        assert_eq!(
            source.calls.into_inner(),
            vec!["size a.jpg", "size b.jpg", "load a.jpg", "load b.jpg"]
        );
    }

    #[test]
    fn paste_pass_load_failure_keeps_other_images() {
        struct FlakySource;
        impl PhotoSource for FlakySource {
            fn load(&self, id: &str) -> Result<Photo, String> {
                if id == "a.jpg" {
                    Err("truncated file".to_string())
                } else {
                    solid(id)
                }
            }

            fn dimensions(&self, _: &str) -> Result<(usize, usize), String> {
                Ok((8, 6))
            }
        }
        let records = vec![
            record("a.jpg", 0.0, 0.0, 50.0),
            record("b.jpg", 0.0, 0.0, -5.0),
            record("c.jpg", 0.0001, 0.0001, 50.0),
        ];
        let result = processor().run(&records, &FlakySource).unwrap();
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].id, "c.jpg");
        let indices: Vec<_> = result.skipped.iter().map(|e| e.image_index()).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[test]
    fn run_range_keeps_capture_indices() {
        let records = vec![
            record("a.jpg", 0.0, 0.0, 50.0),
            record("b.jpg", 0.0001, 0.0, 50.0),
            record("c.jpg", 0.0002, 0.0, 50.0),
        ];
        let result = processor().run_range(&records, 1..3, &solid).unwrap();
        let indices: Vec<_> = result.placements.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2]);

        assert!(matches!(
            processor().run_range(&records, 2..5, &solid),
            Err(MosaicError::InvalidConfig(_))
        ));
        assert!(matches!(
            processor().run_range(&records, 1..1, &solid),
            Err(MosaicError::EmptyInput)
        ));
    }
}
