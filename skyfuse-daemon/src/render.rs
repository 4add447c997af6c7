//! Presentation boundary — snapshot table driven by the motion signal.
//!
//! This is the whole contract the engine exposes to rendering: entities
//! from `TrackStore::snapshot()`, redrawn only when the interpolation loop
//! reports motion. A real map view would consume the same two inputs.

use std::time::Duration;

use comfy_table::{Cell, Table};
use tokio::sync::watch;

use skyfuse_core::store::Entity;

use crate::orchestrator::{now, SharedStore};

/// Render the current entity set as a table.
pub fn format_snapshot(entities: &[Entity]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Feed", "Id", "Callsign", "Cat", "Lat", "Lon", "Hdg", "Alt (m)", "Speed", "X", "Y",
        "Age (s)",
    ]);

    let current = now();
    let mut sorted: Vec<&Entity> = entities.iter().collect();
    sorted.sort_by(|a, b| (&a.key.feed, &a.key.id).cmp(&(&b.key.feed, &b.key.id)));

    for e in sorted {
        table.add_row(vec![
            Cell::new(&e.key.feed),
            Cell::new(&e.key.id),
            Cell::new(&e.track.callsign),
            Cell::new(e.track.category),
            Cell::new(format!("{:.4}", e.track.latitude)),
            Cell::new(format!("{:.4}", e.track.longitude)),
            Cell::new(format!("{:.0}", e.track.heading_deg)),
            Cell::new(format!("{:.0}", e.track.altitude_m)),
            Cell::new(format!("{:.0}", e.track.speed)),
            Cell::new(format!("{:.1}", e.displayed.0)),
            Cell::new(format!("{:.1}", e.displayed.1)),
            Cell::new(format!("{:.0}", e.age(current).max(0.0))),
        ]);
    }

    table.to_string()
}

/// Consumer loop: wait for motion, then print a snapshot at most once per
/// `print_interval`. Returns when all motion senders are gone.
pub async fn run_table_loop(
    store: SharedStore,
    mut motion_rx: watch::Receiver<u64>,
    print_interval: Duration,
) {
    loop {
        if motion_rx.changed().await.is_err() {
            return;
        }
        // Coalesce motion bursts into one redraw per interval
        tokio::time::sleep(print_interval).await;
        motion_rx.mark_unchanged();

        let entities = store.read().await.snapshot();
        println!("\n{} entities tracked", entities.len());
        println!("{}", format_snapshot(&entities));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use skyfuse_core::store::TrackStore;
    use skyfuse_core::types::{Category, Track};

    #[test]
    fn test_format_snapshot() {
        let mut store = TrackStore::new(None);
        store.merge(
            "adsb",
            &[Track {
                id: "4840d6".into(),
                callsign: "KLM1023".into(),
                country: "Netherlands".into(),
                latitude: 59.9,
                longitude: 10.7,
                heading_deg: 275.0,
                altitude_m: 11000.0,
                speed: 230.0,
                category: Category::Air,
            }],
            now(),
        );

        let text = format_snapshot(&store.snapshot());
        assert!(text.contains("4840d6"));
        assert!(text.contains("KLM1023"));
        assert!(text.contains("59.9000"));
    }

    #[test]
    fn test_format_snapshot_empty() {
        let text = format_snapshot(&[]);
        assert!(text.contains("Feed"), "header still renders");
    }
}
