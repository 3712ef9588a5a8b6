use serde::{Deserialize, Serialize};

/// Ground distance covered by one degree of latitude, in meters.
pub const METERS_PER_DEGREE_LATITUDE: f64 = 111_320.0;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Flat-earth conversion between ground meters and angular degrees.
///
/// A degree of latitude is the same length everywhere; a degree of longitude
/// shrinks with the cosine of the latitude it is measured at.
///
/// # Examples
/// ```
/// # use geomosaic::geo::EarthModel;
/// let earth = EarthModel::default();
/// assert_eq!(earth.meters_per_degree_longitude(0.0), 111_320.0);
/// assert!(earth.meters_per_degree_longitude(60.0) < 55_661.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthModel {
    pub meters_per_degree_latitude: f64,
}

impl Default for EarthModel {
    fn default() -> Self {
        EarthModel {
            meters_per_degree_latitude: METERS_PER_DEGREE_LATITUDE,
        }
    }
}

impl EarthModel {
    /// Meters spanned by one degree of longitude at `latitude` (degrees).
    pub fn meters_per_degree_longitude(&self, latitude: f64) -> f64 {
        self.meters_per_degree_latitude * latitude.to_radians().cos()
    }

    /// Converts a north-south ground distance into a latitude delta.
    pub fn meters_to_latitude_degrees(&self, meters: f64) -> f64 {
        meters / self.meters_per_degree_latitude
    }

    /// Converts an east-west ground distance at `latitude` into a longitude delta.
    pub fn meters_to_longitude_degrees(&self, meters: f64, latitude: f64) -> f64 {
        meters / self.meters_per_degree_longitude(latitude)
    }

    /// Moves `origin` by `east` and `north` meters.
    pub fn offset(&self, origin: GeoPoint, east: f64, north: f64) -> GeoPoint {
        GeoPoint {
            lat: origin.lat + self.meters_to_latitude_degrees(north),
            lon: origin.lon + self.meters_to_longitude_degrees(east, origin.lat),
        }
    }
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// A box containing only `point`.
    pub fn from_point(point: GeoPoint) -> Self {
        GeoBounds {
            min_lat: point.lat,
            max_lat: point.lat,
            min_lon: point.lon,
            max_lon: point.lon,
        }
    }

    /// Grows the box so it contains `other`.
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// `true` if `other` lies entirely inside (or on the edge of) this box.
    pub fn contains(&self, other: &GeoBounds) -> bool {
        self.min_lat <= other.min_lat
            && self.max_lat >= other.max_lat
            && self.min_lon <= other.min_lon
            && self.max_lon >= other.max_lon
    }

    /// `true` when both spans are finite and strictly positive.
    pub fn is_proper(&self) -> bool {
        let (lat, lon) = (self.lat_span(), self.lon_span());
        lat.is_finite() && lon.is_finite() && lat > 0.0 && lon > 0.0
    }
}
