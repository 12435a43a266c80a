//! Great-circle distance between two coordinates.
//!
//! The one source of truth for distance: candidate ranking and the
//! profile detail view both go through [`distance_m`]. Storage only uses
//! [`BoundingBox`] as a coarse prefilter.

use serde::{Deserialize, Serialize};

use amora_shared::errors::{AppError, AppResult, ErrorCode};

pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Builds a point, rejecting out-of-range or non-finite coordinates.
    pub fn checked(latitude: f64, longitude: f64) -> AppResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::invalid_field(
                ErrorCode::InvalidCoordinates,
                "latitude",
                "latitude must be between -90 and 90",
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid_field(
                ErrorCode::InvalidCoordinates,
                "longitude",
                "longitude must be between -180 and 180",
            ));
        }
        Ok(Self { latitude, longitude })
    }

    /// Coordinates that must arrive as a pair or not at all.
    pub fn from_optional(latitude: Option<f64>, longitude: Option<f64>) -> AppResult<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::checked(lat, lon).map(Some),
            (None, None) => Ok(None),
            (None, Some(_)) | (Some(_), None) => Err(AppError::invalid_field(
                ErrorCode::InvalidCoordinates,
                if latitude.is_none() { "latitude" } else { "longitude" },
                "latitude and longitude must be supplied together",
            )),
        }
    }
}

/// Haversine distance in meters. Inputs are assumed valid.
pub fn distance_m(a: Point, b: Point) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

pub fn km_to_m(km: i32) -> f64 {
    f64::from(km) * 1000.0
}

/// Lat/lon rectangle that contains every point within a radius of a center.
/// Always a superset of the circle; callers still apply [`distance_m`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: Point, radius_m: f64) -> Self {
        let angular_rad = radius_m / EARTH_RADIUS_M;
        let angular = angular_rad.to_degrees();
        let min_lat = center.latitude - angular;
        let max_lat = center.latitude + angular;

        // Near a pole the circle covers every longitude.
        if min_lat <= -90.0 || max_lat >= 90.0 {
            return Self {
                min_lat: min_lat.max(-90.0),
                max_lat: max_lat.min(90.0),
                min_lon: -180.0,
                max_lon: 180.0,
            };
        }

        // Widest east-west reach of the circle, which lies poleward of the center.
        // A ratio of 1 or more means the circle touches a pole.
        let ratio = angular_rad.sin() / center.latitude.to_radians().cos();
        if ratio >= 1.0 {
            return Self { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
        }
        let lon_delta = ratio.asin().to_degrees();
        let (min_lon, max_lon) = (center.longitude - lon_delta, center.longitude + lon_delta);

        // Wrapping across the antimeridian is not expressible as one range.
        if min_lon < -180.0 || max_lon > 180.0 {
            return Self { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
        }

        Self { min_lat, max_lat, min_lon, max_lon }
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.latitude)
            && (self.min_lon..=self.max_lon).contains(&p.longitude)
    }
}
