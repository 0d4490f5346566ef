//! Coordinates and great-circle distance.

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MI: f64 = 3958.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in degrees.
///
/// Latitude is within [-90, 90] and longitude within [-180, 180]. Use
/// [`GeoPoint::new`] for untrusted input; deserialized values should be
/// passed through [`GeoPoint::validate`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        Self {
            latitude,
            longitude,
        }
        .validate()
    }

    /// Check the latitude/longitude invariant.
    pub fn validate(self) -> Result<Self> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(self)
        } else {
            Err(QueryError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Distance from the query origin, in both units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distance {
    pub distance_mi: f64,
    pub distance_km: f64,
}

/// Great-circle distance between two points using the haversine formula.
pub fn haversine(a: &GeoPoint, b: &GeoPoint) -> Distance {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lng = b.longitude.to_radians() - a.longitude.to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Distance {
        distance_mi: c * EARTH_RADIUS_MI,
        distance_km: c * EARTH_RADIUS_KM,
    }
}
