//! Web Mercator projection — geographic to planar coordinates.
//!
//! The interpolation engine works in a flat coordinate space so that
//! per-axis exponential decay is cheap and frame-rate independent of
//! geography. This module maps (lat, lon) into that space.
//!
//! Key constants:
//! - WORLD_SIZE = 4096: side length of the projected plane in world units.
//! - MAX_LAT ≈ 85.0511°: Mercator singularity cutoff; latitudes beyond it
//!   are clamped.
//!
//! The projection is a pure function: equal input always yields equal
//! output, and it holds no state.

/// Side length of the projected square plane, in world units.
pub const WORLD_SIZE: f64 = 4096.0;

/// Latitude beyond which Mercator diverges; inputs are clamped here.
pub const MAX_LAT: f64 = 85.05112878;

/// Project geographic coordinates to planar (x, y).
///
/// x grows eastward from lon -180, y grows southward from lat `MAX_LAT`
/// (screen convention). Both span [0, WORLD_SIZE].
pub fn project(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LAT, MAX_LAT);
    let x = (lon + 180.0) / 360.0 * WORLD_SIZE;

    let lat_rad = lat.to_radians();
    let merc = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    let y = (1.0 - merc / std::f64::consts::PI) / 2.0 * WORLD_SIZE;

    (x, y)
}

/// Euclidean distance between two planar points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = project(59.9, 10.7);
        let b = project(59.9, 10.7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_origin_maps_to_center() {
        let (x, y) = project(0.0, 0.0);
        assert!((x - WORLD_SIZE / 2.0).abs() < 1e-9);
        assert!((y - WORLD_SIZE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_axes_orientation() {
        // East of Greenwich → right of center; north of equator → above center
        let (x, y) = project(59.9, 10.7);
        assert!(x > WORLD_SIZE / 2.0);
        assert!(y < WORLD_SIZE / 2.0);
    }

    #[test]
    fn test_lat_clamped_at_poles() {
        let (_, y_pole) = project(90.0, 0.0);
        let (_, y_max) = project(MAX_LAT, 0.0);
        assert_eq!(y_pole, y_max);
        assert!(y_pole.is_finite());
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(distance((1.0, 1.0), (1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_monotonic_in_longitude() {
        let (x1, _) = project(50.0, 5.0);
        let (x2, _) = project(50.0, 6.0);
        assert!(x2 > x1);
    }
}
