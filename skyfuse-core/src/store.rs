//! Authoritative entity table with merge semantics.
//!
//! Pure state machine — no locks, no I/O. The daemon wraps one `TrackStore`
//! in an async lock; everything here assumes the caller has exclusive access
//! for the duration of a call, which is what makes `snapshot` a consistent
//! point-in-time view and keeps per-id merges serialized.

use std::collections::HashMap;

use serde::Serialize;

use crate::project::project;
use crate::types::{EntityKey, Track};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Durable record for one real-world object across polls.
///
/// `displayed` is the smoothed position shown to users; `target` is the
/// latest ground-truth projection. Only the interpolation engine moves
/// `displayed`; only `merge` moves `target`.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub key: EntityKey,
    pub track: Track,
    pub displayed: (f64, f64),
    pub target: (f64, f64),
    pub first_seen: f64,
    pub last_seen: f64,
}

impl Entity {
    fn new(key: EntityKey, track: Track, now: f64) -> Self {
        let pos = project(track.latitude, track.longitude);
        Entity {
            key,
            track,
            displayed: pos,
            target: pos,
            first_seen: now,
            last_seen: now,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.last_seen
    }
}

// ---------------------------------------------------------------------------
// TrackStore
// ---------------------------------------------------------------------------

/// Fused entity table keyed by feed-qualified identity.
///
/// Entities are created on first observation and updated in place after
/// that. Updates are last-write-wins per key; intermediate tracks within a
/// batch are not queued. Eviction is opt-in via `evict_after`.
pub struct TrackStore {
    entities: HashMap<EntityKey, Entity>,
    /// Drop entities unseen for this many seconds. `None` retains forever.
    pub evict_after: Option<f64>,

    // Counters
    pub merged_total: u64,
    pub created_total: u64,
}

impl TrackStore {
    pub fn new(evict_after: Option<f64>) -> Self {
        TrackStore {
            entities: HashMap::new(),
            evict_after,
            merged_total: 0,
            created_total: 0,
        }
    }

    /// Merge one feed's poll batch. Returns the keys that were touched.
    ///
    /// New keys get `displayed = target = project(position)` so they appear
    /// in place rather than sliding in from elsewhere. Existing keys get a
    /// new latest track and target; `displayed` is left alone so the
    /// interpolation engine animates the transition.
    pub fn merge(&mut self, feed: &str, tracks: &[Track], now: f64) -> Vec<EntityKey> {
        let mut affected = Vec::with_capacity(tracks.len());

        for track in tracks {
            let key = EntityKey::new(feed, &track.id);
            self.merged_total += 1;

            match self.entities.get_mut(&key) {
                Some(entity) => {
                    entity.track = track.clone();
                    entity.target = project(track.latitude, track.longitude);
                    entity.last_seen = now;
                }
                None => {
                    self.created_total += 1;
                    self.entities
                        .insert(key.clone(), Entity::new(key.clone(), track.clone(), now));
                }
            }
            affected.push(key);
        }

        affected
    }

    /// Consistent point-in-time view of all entities.
    pub fn snapshot(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove entities older than `evict_after`. Returns count removed.
    /// No-op when eviction is not configured.
    pub fn prune_stale(&mut self, now: f64) -> usize {
        let max_age = match self.evict_after {
            Some(v) => v,
            None => return 0,
        };
        let before = self.entities.len();
        self.entities.retain(|_, e| e.age(now) <= max_age);
        before - self.entities.len()
    }

    /// Mutable access for the interpolation engine only.
    pub(crate) fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
