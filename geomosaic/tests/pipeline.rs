use geomosaic::geo::{EarthModel, GeoBounds};
use geomosaic::mosaic::{compute_bounds, TileExtent};
use geomosaic::orientation_normalizer::rotated_size;
use geomosaic::photo::Photo;
use geomosaic::pose_projector::project;
use geomosaic::{DroneImage, MosaicConfig, MosaicError, MosaicProcessor, Pose};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TILE_W: usize = 40;
const TILE_H: usize = 30;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn image(id: &str, lat: f64, lon: f64, pitch: f64, roll: f64, yaw: f64) -> DroneImage {
    DroneImage {
        id: id.to_string(),
        pose: Pose::new(lat, lon, 50.0, pitch, roll, yaw).unwrap(),
    }
}

/// A slowly turning pass over the same patch of ground.
fn flight() -> Vec<DroneImage> {
    vec![
        image("IMG_0001.JPG", 37.0000, -122.0000, 1.0, 0.0, 0.0),
        image("IMG_0002.JPG", 37.0004, -121.9997, 2.0, 1.0, 30.0),
        image("IMG_0003.JPG", 37.0002, -121.9993, 1.0, 2.0, 60.0),
    ]
}

/// Noise photo whose content depends only on the identifier.
fn noise_photo(id: &str) -> Result<Photo, String> {
    let seed = id.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let mut rng = StdRng::seed_from_u64(seed);
    let mut photo = Photo::filled(TILE_W, TILE_H, [0, 0, 0, 255]);
    for y in 0..TILE_H {
        for x in 0..TILE_W {
            photo.set_rgba(x, y, [rng.gen(), rng.gen(), rng.gen(), 255]);
        }
    }
    Ok(photo)
}

fn config() -> MosaicConfig {
    MosaicConfig {
        pixels_per_meter: Some(1.0),
        ..MosaicConfig::default()
    }
}

fn bounds_of(images: &[&DroneImage], earth: &EarthModel) -> GeoBounds {
    let tiles: Vec<TileExtent> = images
        .iter()
        .map(|img| {
            let (width, height) = rotated_size(TILE_W, TILE_H, img.pose.yaw);
            TileExtent {
                center: project(&img.pose, earth),
                width,
                height,
            }
        })
        .collect();
    compute_bounds(&tiles, 1.0, earth).unwrap()
}

#[test]
fn three_images_strictly_contain_every_pair() {
    let earth = EarthModel::default();
    let images = flight();
    let all: Vec<&DroneImage> = images.iter().collect();
    let full = bounds_of(&all, &earth);

    for skip in 0..images.len() {
        let pair: Vec<&DroneImage> = images
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, img)| img)
            .collect();
        let sub = bounds_of(&pair, &earth);
        assert!(full.contains(&sub), "leaving out #{skip}");
        assert_ne!(full, sub, "leaving out #{skip}");
    }
}

#[test]
fn running_twice_gives_identical_canvases() {
    init_logging();
    let processor = MosaicProcessor::new(config()).unwrap();
    let first = processor.run(&flight(), &noise_photo).unwrap();
    let second = processor.run(&flight(), &noise_photo).unwrap();
    assert_eq!(first.canvas, second.canvas);
    assert_eq!(first.placements, second.placements);
    assert!(first.skipped.is_empty());
}

#[test]
fn placements_map_back_to_projected_centers() {
    init_logging();
    let processor = MosaicProcessor::new(config()).unwrap();
    let result = processor.run(&flight(), &noise_photo).unwrap();
    let reference = result.canvas.geo_reference();

    assert_eq!(result.placements.len(), 3);
    for (placement, record) in result.placements.iter().zip(flight()) {
        assert_eq!(placement.id, record.id);
        let center = reference.pixel_to_geo(placement.pixel_x, placement.pixel_y);
        let expected = project(&record.pose, &EarthModel::default());
        assert!((center.lat - expected.lat).abs() < 1e-9);
        assert!((center.lon - expected.lon).abs() < 1e-9);
        assert!(placement.pixel_x >= 0.0 && placement.pixel_x <= reference.width as f64);
        assert!(placement.pixel_y >= 0.0 && placement.pixel_y <= reference.height as f64);
    }
}

#[test]
fn east_heading_puts_image_top_on_the_right() {
    init_logging();
    let source = |_: &str| -> Result<Photo, String> {
        let mut photo = Photo::filled(TILE_W, TILE_H, [0, 0, 0, 255]);
        for x in 0..TILE_W {
            for y in 0..3 {
                photo.set_rgba(x, y, [255, 0, 0, 255]);
            }
        }
        Ok(photo)
    };
    let records = vec![image("east.jpg", 10.0, 10.0, 0.0, 0.0, 90.0)];
    let result = MosaicProcessor::new(config()).unwrap().run(&records, &source).unwrap();
    let canvas = result.canvas.photo();

    // Rotated to north-up the tile is 30 wide and 40 tall.
    assert_eq!((canvas.width, canvas.height), (TILE_H, TILE_W));
    let mid = canvas.height / 2;
    assert_eq!(canvas.get_rgba(canvas.width - 1, mid), Some([255, 0, 0, 255]));
    assert_eq!(canvas.get_rgba(0, mid), Some([0, 0, 0, 255]));
}

#[test]
fn nose_up_image_is_placed_further_north() {
    init_logging();
    let records = vec![
        image("level.jpg", 0.0, 0.0, 0.0, 0.0, 0.0),
        image("nose_up.jpg", 0.0, 0.0, 10.0, 0.0, 0.0),
    ];
    let result = MosaicProcessor::new(config()).unwrap().run(&records, &noise_photo).unwrap();
    let level = &result.placements[0];
    let nose_up = &result.placements[1];
    // alt 50 m * tan(10°) ≈ 8.8 m north, one pixel per meter.
    let shift = level.pixel_y - nose_up.pixel_y;
    assert!((shift - 50.0 * 10f64.to_radians().tan()).abs() < 1e-3);
    assert!((level.pixel_x - nose_up.pixel_x).abs() < 1e-9);
}

#[test]
fn empty_flight_reports_empty_input() {
    let err = MosaicProcessor::new(config()).unwrap().run(&[], &noise_photo).unwrap_err();
    assert!(matches!(err, MosaicError::EmptyInput));
    assert_eq!(err.to_string(), "empty input: no images to composite");
}

#[test]
fn world_file_matches_geo_reference() {
    let result = MosaicProcessor::new(config()).unwrap().run(&flight(), &noise_photo).unwrap();
    let reference = result.canvas.geo_reference();
    let lines: Vec<f64> = reference
        .to_world_file()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    let top_left = reference.pixel_to_geo(0.5, 0.5);
    assert!((lines[0] - 1.0 / reference.pixels_per_degree_lon).abs() < 1e-12);
    assert!((lines[4] - top_left.lon).abs() < 1e-9);
    assert!((lines[5] - top_left.lat).abs() < 1e-9);
}
