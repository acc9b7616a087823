//! Geodesic calculator module
//!
//! Provides validated geographic coordinates plus the two measures the rest
//! of the system needs: great-circle distance between fixes (haversine) and
//! an approximate bearing for deriving headings from consecutive positions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors produced when constructing coordinates from untrusted input.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CoordError {
    /// Latitude outside [-90, 90] degrees
    #[error("Invalid latitude: {0} (must be between -90.0 and 90.0)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] degrees
    #[error("Invalid longitude: {0} (must be between -180.0 and 180.0)")]
    InvalidLongitude(f64),

    /// NaN or infinite component
    #[error("Coordinate component is not finite")]
    NotFinite,
}

/// A geographic fix in decimal degrees.
///
/// Fields are public because engine arithmetic produces points directly;
/// values arriving from outside the crate should go through [`GeoPoint::new`]
/// so range errors surface at the boundary instead of deep in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a validated point.
    ///
    /// # Arguments
    ///
    /// * `lat` - Latitude in degrees (-90.0 to 90.0)
    /// * `lon` - Longitude in degrees (-180.0 to 180.0)
    ///
    /// # Returns
    ///
    /// A `Result` containing the point or an error if inputs are invalid.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordError::NotFinite);
        }
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }
}

/// Computes the great-circle distance between two points in kilometers.
///
/// Uses the haversine formula with a mean Earth radius of 6371 km. The
/// `atan2` form is numerically stable for both very short hops (consecutive
/// telemetry samples seconds apart) and antipodal-ish pairs.
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Computes an approximate bearing from one point toward another.
///
/// Planar approximation: `atan2(dlon, dlat)` in degree space, normalized to
/// [0, 360) with 0 = north, 90 = east. Accurate enough for the sub-kilometer
/// steps the simulator takes; not a great-circle initial bearing.
#[inline]
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let dlat = to.lat - from.lat;
    let dlon = to.lon - from.lon;

    let mut bearing = dlon.atan2(dlat).to_degrees();
    if bearing < 0.0 {
        bearing += 360.0;
    }
    // atan2(0, 0) yields 0.0, so identical points report due north
    bearing % 360.0
}
