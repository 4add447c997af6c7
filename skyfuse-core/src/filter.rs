//! Record validity filters — bounding box membership and no-fix rejection.
//!
//! Feeds report positions for the whole planet plus sentinel junk; the
//! filter keeps only records inside the configured geographic bounds and
//! drops "no fix" reports that park at (0, 0).

use serde::{Deserialize, Serialize};

use crate::types::Track;

/// Both |lat| and |lon| under this value is treated as a no-fix sentinel,
/// not a real position in the Gulf of Guinea.
pub const NO_FIX_EPSILON: f64 = 0.1;

/// Geographic bounding box. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        GeoBounds {
            south,
            west,
            north,
            east,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Accept/reject gate applied to every normalized track before merge.
#[derive(Debug, Clone)]
pub struct TrackFilter {
    pub bounds: GeoBounds,
}

impl TrackFilter {
    pub fn new(bounds: GeoBounds) -> Self {
        TrackFilter { bounds }
    }

    /// True if the track is a plausible in-area position.
    pub fn accept(&self, track: &Track) -> bool {
        if is_no_fix(track.latitude, track.longitude) {
            return false;
        }
        self.bounds.contains(track.latitude, track.longitude)
    }
}

/// Degenerate-coordinate check: both axes within epsilon of the origin.
pub fn is_no_fix(lat: f64, lon: f64) -> bool {
    lat.abs() < NO_FIX_EPSILON && lon.abs() < NO_FIX_EPSILON
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn norway_bounds() -> GeoBounds {
        GeoBounds::new(57.6, 2.8, 71.5, 35.4)
    }

    fn track_at(lat: f64, lon: f64) -> Track {
        Track {
            id: "T1".into(),
            callsign: "TEST".into(),
            country: String::new(),
            latitude: lat,
            longitude: lon,
            heading_deg: 0.0,
            altitude_m: 1000.0,
            speed: 100.0,
            category: Category::Air,
        }
    }

    #[test]
    fn test_bounds_contains() {
        let b = norway_bounds();
        assert!(b.contains(59.9, 10.7));
        assert!(!b.contains(48.8, 2.3)); // Paris, south of box
        assert!(!b.contains(59.9, 40.0)); // east of box
    }

    #[test]
    fn test_bounds_edges_inclusive() {
        let b = norway_bounds();
        assert!(b.contains(57.6, 2.8));
        assert!(b.contains(71.5, 35.4));
    }

    #[test]
    fn test_no_fix_rejected() {
        let f = TrackFilter::new(GeoBounds::new(-90.0, -180.0, 90.0, 180.0));
        assert!(!f.accept(&track_at(0.05, 0.05)));
        assert!(!f.accept(&track_at(0.0, 0.0)));
        assert!(!f.accept(&track_at(-0.05, 0.09)));
    }

    #[test]
    fn test_near_origin_single_axis_kept() {
        // Only one axis near zero is a real position (e.g. on the meridian)
        let f = TrackFilter::new(GeoBounds::new(-90.0, -180.0, 90.0, 180.0));
        assert!(f.accept(&track_at(51.5, 0.05)));
        assert!(f.accept(&track_at(0.05, 6.6)));
    }

    #[test]
    fn test_in_area_accepted() {
        let f = TrackFilter::new(norway_bounds());
        assert!(f.accept(&track_at(59.9, 10.7)));
    }

    #[test]
    fn test_out_of_area_rejected() {
        let f = TrackFilter::new(norway_bounds());
        assert!(!f.accept(&track_at(52.5, 13.4))); // Berlin
    }
}
