//! Great-circle station separation.
//!
//! - [`great_circle_distance_m`] computes the separation of two stations
//!   in meters on a spherical Earth (mean radius).
//!
//! Notes
//! -----
//! - The original processing chain used a WGS84 geodesic; the spherical
//!   approximation differs by well under 0.5 %, far below the wavelength
//!   granularity of the separation threshold it feeds.

/// Mean Earth radius \[m\].
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two coordinates, in meters.
///
/// Parameters
/// ----------
/// - `lat1`, `lon1`, `lat2`, `lon2`: coordinates in decimal degrees.
///
/// Returns
/// -------
/// Distance along the great circle in meters (haversine formula).
pub fn great_circle_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}
