use m1ssion_types::Coordinates;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters (Haversine).
///
/// Symmetric and zero for identical points. Invalid input is not rejected:
/// a NaN coordinate yields NaN, callers validate upstream.
pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // rounding can push h slightly above 1 for antipodal points
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

/// Inclusive radius check. NaN distances are never within range.
pub fn within_radius(a: Coordinates, b: Coordinates, radius_m: f64) -> bool {
    distance(a, b) <= radius_m
}
