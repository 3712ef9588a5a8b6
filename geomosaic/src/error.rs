use thiserror::Error;

/// Reasons a single [`Pose`](crate::pose::Pose) is rejected before projection.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PoseError {
    /// One of the numeric fields is NaN or infinite.
    #[error("pose field `{field}` is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },
    /// Altitude must be strictly above ground.
    #[error("altitude must be positive, got {0} m")]
    NonPositiveAltitude(f64),
}

/// Errors produced while assembling a mosaic.
///
/// Per-image variants carry the capture index and identifier so the caller can
/// decide whether to skip the record or abort the run.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// A record's pose failed validation.
    #[error("image #{index} ({id}): invalid pose: {source}")]
    InvalidPose {
        index: usize,
        id: String,
        #[source]
        source: PoseError,
    },
    /// The image source could not produce pixels for a record.
    #[error("image #{index} ({id}): failed to load: {message}")]
    ImageLoad {
        index: usize,
        id: String,
        message: String,
    },
    /// The image's ground position cannot be mapped onto a usable canvas.
    #[error("image #{index} ({id}): cannot be placed: {reason}")]
    Unplaceable {
        index: usize,
        id: String,
        reason: String,
    },
    /// Nothing left to composite.
    #[error("empty input: no images to composite")]
    EmptyInput,
    /// The geographic bounds collapse to a line/point or are not finite.
    #[error(
        "degenerate bounding box: lat [{min_lat}, {max_lat}], lon [{min_lon}, {max_lon}]"
    )]
    DegenerateBounds {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
    /// The canvas would exceed the configured pixel budget. Sizes are kept as
    /// floats since they may not fit a `usize`.
    #[error("canvas of {width}x{height} pixels exceeds the limit of {max_pixels} pixels")]
    CanvasTooLarge {
        width: f64,
        height: f64,
        max_pixels: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MosaicError {
    /// Capture index of the offending image, for per-image variants.
    pub fn image_index(&self) -> Option<usize> {
        match self {
            MosaicError::InvalidPose { index, .. }
            | MosaicError::ImageLoad { index, .. }
            | MosaicError::Unplaceable { index, .. } => Some(*index),
            _ => None,
        }
    }
}
