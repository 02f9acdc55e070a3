//! Great-circle distance between catalog coordinates.

/// Earth radius used for station distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// Haversine distance in kilometers between two points given in degrees.
///
/// Every angle is converted to radians before any trigonometry, latitudes
/// included.
///
/// # Examples
///
/// ```
/// use train_search::geo::distance_km;
///
/// // KSR Bengaluru to Bengaluru Cantonment area: a few kilometers
/// let d = distance_km(12.98, 77.59, 13.00, 77.55);
/// assert!(d > 4.0 && d < 6.0);
/// assert_eq!(distance_km(12.98, 77.59, 12.98, 77.59), 0.0);
/// ```
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
