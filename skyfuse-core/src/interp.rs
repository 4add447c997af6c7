//! Interpolation engine — smooth displayed positions between polls.
//!
//! Each tick moves every entity's displayed position a fixed fraction of
//! the remaining gap toward its target, per axis. Exponential decay: the
//! gap shrinks by `1 - factor` per tick, never overshoots, and after
//! 10 ticks at factor 0.05 about 40% of the gap is closed (1 - 0.95^10).
//!
//! Entities within `epsilon` of their target are treated as converged and
//! skipped. Sea-category entities with a gap above `sea_snap_threshold`
//! snap straight to the target: vessels move slowly enough that smoothing
//! a large jump buys nothing.

use crate::project::distance;
use crate::store::TrackStore;
use crate::types::Category;

/// Fraction of the remaining gap closed per tick.
pub const DEFAULT_FACTOR: f64 = 0.05;

/// Gap below which an entity counts as converged, in world units.
pub const CONVERGE_EPSILON: f64 = 1.0;

/// Sea-category gap above which smoothing is skipped and the entity snaps.
pub const SEA_SNAP_THRESHOLD: f64 = 64.0;

pub struct InterpolationEngine {
    factor: f64,
    epsilon: f64,
    sea_snap_threshold: f64,
}

impl InterpolationEngine {
    pub fn new(factor: f64, epsilon: f64, sea_snap_threshold: f64) -> Self {
        InterpolationEngine {
            // Factor outside (0, 1] would stall or overshoot
            factor: factor.clamp(f64::EPSILON, 1.0),
            epsilon,
            sea_snap_threshold,
        }
    }

    /// Advance every entity one frame. Returns true if anything moved,
    /// so the caller can skip redraw work on quiet frames.
    pub fn tick(&self, store: &mut TrackStore) -> bool {
        let mut moved = false;

        for entity in store.entities_mut() {
            let gap = distance(entity.displayed, entity.target);
            if gap < self.epsilon {
                continue;
            }

            if entity.track.category == Category::Sea && gap > self.sea_snap_threshold {
                entity.displayed = entity.target;
                moved = true;
                continue;
            }

            entity.displayed.0 += (entity.target.0 - entity.displayed.0) * self.factor;
            entity.displayed.1 += (entity.target.1 - entity.displayed.1) * self.factor;
            moved = true;
        }

        moved
    }
}

impl Default for InterpolationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FACTOR, CONVERGE_EPSILON, SEA_SNAP_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
