//! Spherical geometry for radius filters.
//!
//! All km <-> angle conversions go through this module so the Earth radius
//! constant lives in exactly one place.

use crate::model::Location;

/// Mean Earth radius used to express search radii as central angles.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Slack applied at the cap boundary so that a point exactly `radius_km`
/// away is not lost to float rounding (about 6 micrometres on the surface).
pub const BOUNDARY_TOLERANCE_RAD: f64 = 1e-12;

pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

pub fn radians_to_km(rad: f64) -> f64 {
    rad * EARTH_RADIUS_KM
}

/// Great-circle central angle between two points, haversine form.
pub fn central_angle(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * a.sqrt().min(1.0).asin()
}

/// A spherical cap: every point within `radius_rad` of the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCap {
    pub lat: f64,
    pub lng: f64,
    pub radius_rad: f64,
}

impl GeoCap {
    pub fn from_km(lat: f64, lng: f64, radius_km: f64) -> Self {
        Self {
            lat,
            lng,
            radius_rad: km_to_radians(radius_km),
        }
    }

    pub fn contains(&self, loc: &Location) -> bool {
        central_angle(self.lat, self.lng, loc.lat, loc.lng)
            <= self.radius_rad + BOUNDARY_TOLERANCE_RAD
    }
}
