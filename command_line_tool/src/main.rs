use anyhow::{bail, Context};
use clap::Parser;
use geomosaic::camera::CameraModel;
use geomosaic::geo::EarthModel;
use geomosaic::manifest::load_manifest_file;
use geomosaic::photo::Photo;
use geomosaic::{MosaicConfig, MosaicProcessor, PhotoSource};
use image::open;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "Builds a north-up georeferenced mosaic from posed drone photos.")]
struct Args {
    /// JSON manifest listing each photo (filename, lat, long, altitude, yaw, pitch, roll) in capture order
    #[arg()]
    manifest: PathBuf,

    /// Directory the manifest filenames are relative to (defaults to the manifest's directory)
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Output PNG filename
    #[arg(long, default_value = "mosaic.png")]
    output: PathBuf,

    /// Optionally write the canvas georeference (origin and scale) as JSON
    #[arg(long)]
    georef_json: Option<PathBuf>,

    /// Write an ESRI world file (.pgw) next to the output image
    #[arg(long)]
    world_file: bool,

    /// Canvas resolution; derived from the camera model and mean altitude when omitted
    #[arg(long)]
    pixels_per_meter: Option<f64>,

    /// Shrink photos and canvas by this factor, in (0, 1]
    #[arg(long, default_value_t = 1.0)]
    output_scale: f64,

    /// Sensor width in millimeters
    #[arg(long, default_value_t = 36.0)]
    sensor_width_mm: f64,

    /// Sensor height in millimeters
    #[arg(long, default_value_t = 26.0)]
    sensor_height_mm: f64,

    /// Lens focal length in millimeters
    #[arg(long, default_value_t = 20.0)]
    focal_length_mm: f64,

    /// Full-resolution frame width in pixels
    #[arg(long, default_value_t = 4000)]
    image_width: usize,

    /// Full-resolution frame height in pixels
    #[arg(long, default_value_t = 3000)]
    image_height: usize,

    /// Meters spanned by one degree of latitude
    #[arg(long, default_value_t = geomosaic::geo::METERS_PER_DEGREE_LATITUDE)]
    meters_per_degree: f64,

    /// Background color as RRGGBBAA hex
    #[arg(long, default_value = "ffffffff", value_parser = parse_rgba)]
    background: [u8; 4],

    /// Refuse to allocate a canvas with more pixels than this
    #[arg(long, default_value_t = 400_000_000)]
    max_canvas_pixels: usize,

    /// Fail instead of producing a partial mosaic when any photo is skipped
    #[arg(long)]
    strict: bool,
}

fn parse_rgba(value: &str) -> Result<[u8; 4], String> {
    let hex = value.trim_start_matches('#');
    if hex.len() != 8 || !hex.is_ascii() {
        return Err(format!("expected 8 hex digits (RRGGBBAA), got '{value}'"));
    }
    let mut rgba = [0u8; 4];
    for (i, channel) in rgba.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| format!("invalid color '{value}': {e}"))?;
    }
    Ok(rgba)
}

impl Args {
    fn mosaic_config(&self) -> MosaicConfig {
        MosaicConfig {
            earth: EarthModel {
                meters_per_degree_latitude: self.meters_per_degree,
            },
            camera: CameraModel {
                sensor_width_mm: self.sensor_width_mm,
                sensor_height_mm: self.sensor_height_mm,
                focal_length_mm: self.focal_length_mm,
                image_width_px: self.image_width,
                image_height_px: self.image_height,
            },
            pixels_per_meter: self.pixels_per_meter,
            output_scale: self.output_scale,
            background: self.background,
            max_canvas_pixels: self.max_canvas_pixels,
        }
    }

    fn images_dir(&self) -> PathBuf {
        match &self.images_dir {
            Some(dir) => dir.clone(),
            None => self
                .manifest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let records = load_manifest_file(&args.manifest)
        .with_context(|| format!("reading manifest {}", args.manifest.display()))?;
    info!("Loaded {} image record(s) from {}", records.len(), args.manifest.display());

    let processor = MosaicProcessor::new(args.mosaic_config())?;
    let source = ImageDirectory {
        dir: args.images_dir(),
    };
    let result = processor.run(&records, &source)?;

    for skipped in &result.skipped {
        warn!("{skipped}");
    }
    if args.strict && !result.skipped.is_empty() {
        bail!("{} image(s) were skipped and --strict is set", result.skipped.len());
    }

    let reference = *result.canvas.geo_reference();
    save_photo(result.canvas.into_photo(), &args.output)?;

    if let Some(path) = &args.georef_json {
        let json = serde_json::to_string_pretty(&reference)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Georeference written to {}", path.display());
    }

    if args.world_file {
        let path = args.output.with_extension("pgw");
        fs::write(&path, reference.to_world_file())
            .with_context(|| format!("writing {}", path.display()))?;
        info!("World file written to {}", path.display());
    }

    info!(
        "Done: {} placed, {} skipped.",
        result.placements.len(),
        result.skipped.len()
    );
    Ok(())
}

/// Photos stored as files under one directory, named by their identifier.
struct ImageDirectory {
    dir: PathBuf,
}

impl PhotoSource for ImageDirectory {
    fn load(&self, id: &str) -> Result<Photo, String> {
        read_photo(&self.dir.join(id))
    }

    fn dimensions(&self, id: &str) -> Result<(usize, usize), String> {
        let path = self.dir.join(id);
        let (width, height) =
            image::image_dimensions(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        Ok((width as usize, height as usize))
    }
}

pub fn save_photo(photo: Photo, filename: &Path) -> anyhow::Result<()> {
    info!("Writing image {}", filename.display());
    let img = image::RgbaImage::from_raw(photo.width as u32, photo.height as u32, photo.img_data)
        .context("canvas buffer does not match its dimensions")?;
    img.save(filename)
        .with_context(|| format!("saving {}", filename.display()))?;
    Ok(())
}

pub fn read_photo(filename: &Path) -> Result<Photo, String> {
    info!("Reading image file: {}", filename.display());
    let img = open(filename).map_err(|e| format!("{}: {e}", filename.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Photo::from_rgba(width as usize, height as usize, rgba.into_raw())
        .ok_or_else(|| format!("{}: unexpected pixel buffer size", filename.display()))
}
