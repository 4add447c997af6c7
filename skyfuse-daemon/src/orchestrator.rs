//! Task wiring — one polling loop per feed, one interpolation tick loop.
//!
//! Feed cadences are independent: each adapter gets its own task and
//! interval, so a slow feed never blocks a fast one, and neither blocks
//! the interpolation tick. The only shared state is the `TrackStore`
//! behind an async RwLock; merges take the write lock briefly, the render
//! boundary reads snapshots.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use skyfuse_core::interp::InterpolationEngine;
use skyfuse_core::store::TrackStore;

use crate::feed::FeedAdapter;

pub type SharedStore = Arc<RwLock<TrackStore>>;

/// Upper bound on one poll cycle, auth exchange included. A timed-out poll
/// is treated like a failed one: logged, skipped, cadence unchanged.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the interpolation task checks for stale entities.
const PRUNE_INTERVAL: Duration = Duration::from_secs(10);

pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Owns the polling tasks and the interpolation task.
///
/// Motion is published on a watch channel as a change counter; consumers
/// redraw when it changes and stay idle on quiet frames.
pub struct Orchestrator {
    store: SharedStore,
    motion_tx: watch::Sender<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(store: SharedStore) -> (Self, watch::Receiver<u64>) {
        let (motion_tx, motion_rx) = watch::channel(0u64);
        (
            Orchestrator {
                store,
                motion_tx,
                tasks: Vec::new(),
            },
            motion_rx,
        )
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    /// Start one feed's polling loop at its own cadence. Failures and
    /// timeouts log and skip the cycle; the loop never stops on its own
    /// and never touches entities from other feeds.
    pub fn spawn_feed(&mut self, adapter: FeedAdapter, interval_sec: f64) {
        let store = self.store.clone();
        let period = Duration::from_secs_f64(interval_sec.max(0.1));

        self.tasks.push(tokio::spawn(async move {
            let feed = adapter.name().to_string();
            info!(feed = %feed, interval_sec, "feed polling started");

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match timeout(POLL_TIMEOUT, adapter.poll(now())).await {
                    Ok(tracks) if tracks.is_empty() => {
                        debug!(feed = %feed, "empty poll cycle");
                    }
                    Ok(tracks) => {
                        let mut store = store.write().await;
                        let affected = store.merge(&feed, &tracks, now());
                        info!(
                            feed = %feed,
                            merged = affected.len(),
                            entities = store.len(),
                            "merged poll batch"
                        );
                    }
                    Err(_) => {
                        warn!(feed = %feed, timeout_sec = POLL_TIMEOUT.as_secs(), "poll timed out");
                    }
                }
            }
        }));
    }

    /// Start the fixed-rate interpolation loop. Bumps the motion counter
    /// only on frames where something actually moved, and runs the stale
    /// prune on a slow sub-cadence.
    pub fn spawn_interpolator(&mut self, engine: InterpolationEngine, tick_hz: f64) {
        let store = self.store.clone();
        let motion_tx = self.motion_tx.clone();
        let period = Duration::from_secs_f64(1.0 / tick_hz.max(1.0));
        let prune_every = (PRUNE_INTERVAL.as_secs_f64() * tick_hz.max(1.0)) as u64;

        self.tasks.push(tokio::spawn(async move {
            info!(tick_hz, "interpolation loop started");

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0u64;

            loop {
                ticker.tick().await;
                ticks += 1;

                let moved = {
                    let mut store = store.write().await;
                    if ticks % prune_every.max(1) == 0 {
                        let removed = store.prune_stale(now());
                        if removed > 0 {
                            info!(removed, "pruned stale entities");
                        }
                    }
                    engine.tick(&mut store)
                };

                if moved {
                    motion_tx.send_modify(|n| *n = n.wrapping_add(1));
                }
            }
        }));
    }

    /// Stop all loops. In-flight cycles are dropped, not drained; the
    /// store stays valid for a final snapshot.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    use skyfuse_core::filter::{GeoBounds, TrackFilter};
    use skyfuse_core::project::{distance, project};
    use skyfuse_core::types::{Category, EntityKey, Result, SkyfuseError, Track};

    use crate::feed::{DataSource, RawRecord};

    /// Source that reports X1 at (59.0, 10.0) on the first fetch and at
    /// (59.1, 10.0) afterwards. `None` position means fail the fetch.
    struct ScriptedSource {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn category(&self) -> Category {
            Category::Air
        }

        async fn fetch(&self, _bearer: Option<&str>) -> Result<Vec<RawRecord>> {
            if self.fail {
                return Err(SkyfuseError::Fetch {
                    feed: "scripted".into(),
                    reason: "status 503".into(),
                });
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let lat = if n == 0 { 59.0 } else { 59.1 };
            Ok(vec![json!({"id": "X1", "lat": lat, "lon": 10.0})])
        }

        fn normalize(&self, record: &RawRecord) -> Result<Track> {
            Ok(Track {
                id: record["id"]
                    .as_str()
                    .ok_or_else(|| SkyfuseError::MalformedRecord("missing id".into()))?
                    .into(),
                callsign: "TEST".into(),
                country: String::new(),
                latitude: record["lat"].as_f64().unwrap_or(0.0),
                longitude: record["lon"].as_f64().unwrap_or(0.0),
                heading_deg: 0.0,
                altitude_m: 10000.0,
                speed: 200.0,
                category: Category::Air,
            })
        }
    }

    fn scripted_adapter(fail: bool) -> FeedAdapter {
        FeedAdapter::new(
            Box::new(ScriptedSource {
                calls: AtomicU32::new(0),
                fail,
            }),
            None,
            TrackFilter::new(GeoBounds::new(57.6, 2.8, 71.5, 35.4)),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_fusion_and_smoothing() {
        // X1 appears, then moves; displayed trails the target.
        let adapter = scripted_adapter(false);
        let mut store = TrackStore::new(None);
        let engine = InterpolationEngine::default();
        let key = EntityKey::new("scripted", "X1");

        let batch = adapter.poll(0.0).await;
        store.merge("scripted", &batch, 0.0);
        {
            let e = store.get(&key).unwrap();
            assert_eq!(e.displayed, project(59.0, 10.0));
            assert_eq!(e.displayed, e.target);
        }

        let batch = adapter.poll(1.0).await;
        store.merge("scripted", &batch, 1.0);
        let initial_gap = {
            let e = store.get(&key).unwrap();
            assert_eq!(e.displayed, project(59.0, 10.0), "displayed unchanged");
            assert_eq!(e.target, project(59.1, 10.0));
            distance(e.displayed, e.target)
        };

        for _ in 0..10 {
            engine.tick(&mut store);
        }

        let remaining = {
            let e = store.get(&key).unwrap();
            distance(e.displayed, e.target)
        };
        let closed = 1.0 - remaining / initial_gap;
        assert!((closed - 0.4013).abs() < 0.001, "closed {closed}");
    }

    #[tokio::test]
    async fn test_spawned_loops_merge_and_signal_motion() {
        let store: SharedStore = Arc::new(RwLock::new(TrackStore::new(None)));
        let (mut orch, motion_rx) = Orchestrator::new(store.clone());

        orch.spawn_feed(scripted_adapter(false), 0.02);
        orch.spawn_interpolator(InterpolationEngine::default(), 100.0);

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!store.read().await.is_empty(), "feed loop should merge");
        assert!(
            *motion_rx.borrow() > 0,
            "interpolator should signal motion after the target moved"
        );

        orch.shutdown().await;
    }

    #[tokio::test]
    async fn test_failing_feed_keeps_existing_entities() {
        let store: SharedStore = Arc::new(RwLock::new(TrackStore::new(None)));
        store.write().await.merge(
            "scripted",
            &[Track {
                id: "KEEP".into(),
                callsign: "TEST".into(),
                country: String::new(),
                latitude: 60.0,
                longitude: 10.0,
                heading_deg: 0.0,
                altitude_m: 0.0,
                speed: 0.0,
                category: Category::Air,
            }],
            0.0,
        );

        let (mut orch, _motion_rx) = Orchestrator::new(store.clone());
        orch.spawn_feed(scripted_adapter(true), 0.02);

        tokio::time::sleep(Duration::from_millis(150)).await;

        let store_guard = store.read().await;
        assert_eq!(store_guard.len(), 1, "outage must not remove entities");
        assert!(store_guard.get(&EntityKey::new("scripted", "KEEP")).is_some());
        drop(store_guard);

        orch.shutdown().await;
    }
}
