//! Great-circle distance used to rank stores around a query point.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in kilometers between the query point and a store, by the
/// spherical law of cosines. The cosine term is clamped to `[-1, 1]` so that
/// identical points yield `0.0` instead of `NaN`.
pub fn great_circle_km(lat: f64, lon: f64, store_lat: f64, store_lon: f64) -> f64 {
    let (rad_lat, rad_lon) = (lat.to_radians(), lon.to_radians());
    let (rad_lat_s, rad_lon_s) = (store_lat.to_radians(), store_lon.to_radians());
    let cos_angle = rad_lat.cos() * rad_lat_s.cos() * (rad_lon_s - rad_lon).cos()
        + rad_lat.sin() * rad_lat_s.sin();
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}
