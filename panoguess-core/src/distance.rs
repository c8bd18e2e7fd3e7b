//! Great-circle distance between two WGS84 coordinates.
//!
//! Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. Inputs are degrees; outputs are kilometres.

use geo::Point;

/// Mean Earth radius used for every derived distance, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Return the haversine distance in kilometres between two coordinates.
///
/// Arguments follow the `(latitude, longitude)` order used on the wire.
///
/// # Examples
/// ```
/// use panoguess_core::haversine_km;
///
/// let km = haversine_km(0.0, 0.0, 0.0, 1.0);
/// assert!((km - 111.194_926_6).abs() < 1.0e-6);
/// ```
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    // Rounding can push the term just past 1 for antipodal points.
    let half_chord = ((d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * angle
}

/// Haversine distance between two points with `x = longitude`, `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Point;
/// use panoguess_core::distance_between;
///
/// let origin = Point::new(0.0, 0.0);
/// assert_eq!(distance_between(origin, origin), 0.0);
/// ```
#[must_use]
pub fn distance_between(from: Point<f64>, to: Point<f64>) -> f64 {
    haversine_km(from.y(), from.x(), to.y(), to.x())
}
