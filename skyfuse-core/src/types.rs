//! Shared types, error enum, and the canonical track record for skyfuse-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by skyfuse.
#[derive(Debug, Error)]
pub enum SkyfuseError {
    #[error("authentication failed for {authority}: {reason}")]
    Auth { authority: String, reason: String },
    #[error("fetch failed for feed {feed}: {reason}")]
    Fetch { feed: String, reason: String },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SkyfuseError>;

/// Callsign sentinel for records that carry no readable name.
pub const UNKNOWN_CALLSIGN: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Broad class of a tracked object. Drives per-category interpolation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Air,
    Sea,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Air => write!(f, "air"),
            Category::Sea => write!(f, "sea"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity identity
// ---------------------------------------------------------------------------

/// Stable identity of one tracked object.
///
/// Keys are feed-qualified: each feed has its own identity scheme (ICAO24 hex
/// for aircraft, MMSI for vessels), so a raw id is only unique within its
/// feed. Qualifying by feed makes cross-feed collisions structurally
/// impossible rather than a merge-time conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub feed: String,
    pub id: String,
}

impl EntityKey {
    pub fn new(feed: &str, id: &str) -> Self {
        EntityKey {
            feed: feed.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.feed, self.id)
    }
}

// ---------------------------------------------------------------------------
// Canonical track
// ---------------------------------------------------------------------------

/// One normalized positional report, feed-agnostic.
///
/// Immutable value: a new report supersedes the previous one wholesale, it is
/// never patched in place. Unknown fields carry documented defaults
/// (`UNKNOWN_CALLSIGN`, empty country, zeroed numerics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable per-object id within the reporting feed.
    pub id: String,
    pub callsign: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees, normalized to [0, 360).
    pub heading_deg: f64,
    /// Meters above sea level. 0 for surface vessels.
    pub altitude_m: f64,
    pub speed: f64,
    pub category: Category,
}

impl Track {
    /// Normalize an arbitrary heading into [0, 360).
    pub fn normalize_heading(deg: f64) -> f64 {
        let h = deg % 360.0;
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
