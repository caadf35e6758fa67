//! Earth-centred distances and the satellite elevation angle

use crate::types::{AsarError, AsarResult};

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis (m)
pub const WGS84_B: f64 = 6_356_752.314245;
/// WGS84 flattening
pub const WGS84_F: f64 = (WGS84_A - WGS84_B) / WGS84_A;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic coordinates (degrees, metres) to ECEF (m)
pub fn latlon_to_ecef(lat: f64, lon: f64, alt: f64) -> [f64; 3] {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();

    let n = WGS84_A / (1.0 - WGS84_E2 * lat_rad.sin().powi(2)).sqrt();

    let x = (n + alt) * lat_rad.cos() * lon_rad.cos();
    let y = (n + alt) * lat_rad.cos() * lon_rad.sin();
    let z = (n * (1.0 - WGS84_E2) + alt) * lat_rad.sin();

    [x, y, z]
}

/// Distance from the Earth centre to a point on or above the ellipsoid (m)
pub fn geodetic_distance(lat: f64, lon: f64, alt: f64) -> f64 {
    let [x, y, z] = latlon_to_ecef(lat, lon, alt);
    (x * x + y * y + z * z).sqrt()
}

fn elevation_cosine(slant_range: f64, sat_distance: f64, target_distance: f64) -> f64 {
    (slant_range * slant_range + sat_distance * sat_distance - target_distance * target_distance)
        / (2.0 * slant_range * sat_distance)
}

/// Look angle at the satellite between nadir and the target (degrees).
///
/// Inconsistent triangles (cosine outside [-1, 1]) give NaN.
pub fn elevation_angle(slant_range: f64, sat_distance: f64, target_distance: f64) -> f64 {
    elevation_cosine(slant_range, sat_distance, target_distance)
        .acos()
        .to_degrees()
}

/// [`elevation_angle`] that reports an inconsistent triangle instead of NaN
pub fn elevation_angle_checked(slant_range: f64, sat_distance: f64, target_distance: f64) -> AsarResult<f64> {
    let cosine = elevation_cosine(slant_range, sat_distance, target_distance);
    if !(-1.0..=1.0).contains(&cosine) {
        return Err(AsarError::ArithmeticDomain(format!(
            "elevation cosine {} outside [-1, 1] (slant {} m, satellite {} m, target {} m)",
            cosine, slant_range, sat_distance, target_distance
        )));
    }
    Ok(cosine.acos().to_degrees())
}
