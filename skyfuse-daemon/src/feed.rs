//! Feed adapters — one fetch cycle from raw upstream records to clean tracks.
//!
//! A `DataSource` knows its own wire shape and nothing else; the
//! `FeedAdapter` wraps it with credential acquisition, per-record
//! normalization, and validity filtering. Every failure mode is contained
//! inside the cycle: a failed poll returns an empty batch, a bad record is
//! skipped on its own, and neither ever disturbs previously merged state.

use async_trait::async_trait;
use tracing::{debug, warn};

use skyfuse_core::filter::TrackFilter;
use skyfuse_core::types::{Category, Result, SkyfuseError, Track, UNKNOWN_CALLSIGN};

use crate::auth::{Credential, TokenCache};

/// Provider-specific positional report, opaque to the core. Consumed once
/// per fetch cycle.
pub type RawRecord = serde_json::Value;

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// One pluggable upstream. `fetch` retrieves the raw batch, `normalize`
/// maps a single record to the canonical track shape.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    fn category(&self) -> Category;
    async fn fetch(&self, bearer: Option<&str>) -> Result<Vec<RawRecord>>;
    fn normalize(&self, record: &RawRecord) -> Result<Track>;
}

// ---------------------------------------------------------------------------
// FeedAdapter
// ---------------------------------------------------------------------------

/// One feed's full fetch cycle: credential → retrieve → normalize → filter.
pub struct FeedAdapter {
    source: Box<dyn DataSource>,
    auth: Option<TokenCache>,
    filter: TrackFilter,
}

impl FeedAdapter {
    pub fn new(source: Box<dyn DataSource>, auth: Option<TokenCache>, filter: TrackFilter) -> Self {
        FeedAdapter {
            source,
            auth,
            filter,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Run one poll cycle. Infallible by contract: any auth or fetch
    /// failure degrades to an empty batch for this cycle.
    pub async fn poll(&self, now: f64) -> Vec<Track> {
        let feed = self.source.name();

        let credential = match &self.auth {
            Some(cache) => match cache.get_valid(now).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(feed, error = %e, "credential acquisition failed, skipping cycle");
                    return Vec::new();
                }
            },
            None => Credential::anonymous(),
        };

        let records = match self.source.fetch(credential.bearer()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(feed, error = %e, "fetch failed, skipping cycle");
                return Vec::new();
            }
        };

        let total = records.len();
        let mut malformed = 0usize;
        let mut filtered = 0usize;
        let mut tracks = Vec::with_capacity(total);

        for record in &records {
            match self.source.normalize(record) {
                Ok(track) if self.filter.accept(&track) => tracks.push(track),
                Ok(_) => filtered += 1,
                Err(e) => {
                    malformed += 1;
                    debug!(feed, error = %e, "skipping malformed record");
                }
            }
        }

        debug!(
            feed,
            total,
            kept = tracks.len(),
            filtered,
            malformed,
            "poll cycle complete"
        );
        tracks
    }
}

// ---------------------------------------------------------------------------
// Airborne state-vector source (OpenSky-style rows)
// ---------------------------------------------------------------------------

/// Aircraft feed whose response is `{"states": [[icao24, callsign, country,
/// _, _, lon, lat, alt_m, _, velocity, heading, ...], ...]}`.
pub struct StateVectorSource {
    client: reqwest::Client,
    url: String,
}

impl StateVectorSource {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        StateVectorSource {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl DataSource for StateVectorSource {
    fn name(&self) -> &str {
        "adsb"
    }

    fn category(&self) -> Category {
        Category::Air
    }

    async fn fetch(&self, bearer: Option<&str>) -> Result<Vec<RawRecord>> {
        let fetch_err = |reason: String| SkyfuseError::Fetch {
            feed: "adsb".into(),
            reason,
        };

        let mut request = self.client.get(&self.url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("status {}", response.status())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| fetch_err(format!("bad response body: {e}")))?;

        // "states" is null when the window is empty
        Ok(body["states"]
            .as_array()
            .map(|a| a.to_vec())
            .unwrap_or_default())
    }

    fn normalize(&self, record: &RawRecord) -> Result<Track> {
        let row = record
            .as_array()
            .ok_or_else(|| SkyfuseError::MalformedRecord("state vector is not an array".into()))?;

        let id = row
            .first()
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SkyfuseError::MalformedRecord("missing icao24".into()))?;

        let callsign = row
            .get(1)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_CALLSIGN);

        let num = |i: usize| row.get(i).and_then(|v| v.as_f64()).unwrap_or(0.0);

        Ok(Track {
            id: id.to_string(),
            callsign: callsign.to_string(),
            country: row
                .get(2)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            // Missing coordinates default to 0,0 and die in the no-fix filter
            longitude: num(5),
            latitude: num(6),
            altitude_m: num(7),
            speed: num(9),
            heading_deg: Track::normalize_heading(num(10)),
            category: Category::Air,
        })
    }
}

// ---------------------------------------------------------------------------
// Vessel position source (AIS GeoJSON-style features)
// ---------------------------------------------------------------------------

/// Vessel feed whose response is `{"features": [{"mmsi": n, "geometry":
/// {"coordinates": [lon, lat]}, "properties": {"sog": .., "cog": ..}}]}`.
pub struct VesselSource {
    client: reqwest::Client,
    url: String,
}

impl VesselSource {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        VesselSource {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl DataSource for VesselSource {
    fn name(&self) -> &str {
        "ais"
    }

    fn category(&self) -> Category {
        Category::Sea
    }

    async fn fetch(&self, bearer: Option<&str>) -> Result<Vec<RawRecord>> {
        let fetch_err = |reason: String| SkyfuseError::Fetch {
            feed: "ais".into(),
            reason,
        };

        let mut request = self.client.get(&self.url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("status {}", response.status())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| fetch_err(format!("bad response body: {e}")))?;

        Ok(body["features"]
            .as_array()
            .map(|a| a.to_vec())
            .unwrap_or_default())
    }

    fn normalize(&self, record: &RawRecord) -> Result<Track> {
        let mmsi = record["mmsi"]
            .as_u64()
            .or_else(|| record["properties"]["mmsi"].as_u64())
            .ok_or_else(|| SkyfuseError::MalformedRecord("missing mmsi".into()))?;

        let coords = record["geometry"]["coordinates"]
            .as_array()
            .ok_or_else(|| SkyfuseError::MalformedRecord("missing coordinates".into()))?;
        let longitude = coords.first().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let latitude = coords.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0);

        let props = &record["properties"];
        let heading = props["cog"]
            .as_f64()
            .or_else(|| props["heading"].as_f64())
            .unwrap_or(0.0);

        Ok(Track {
            id: mmsi.to_string(),
            callsign: props["name"]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_CALLSIGN)
                .to_string(),
            country: props["flag"].as_str().unwrap_or("").to_string(),
            latitude,
            longitude,
            heading_deg: Track::normalize_heading(heading),
            // Surface vessels sit at sea level
            altitude_m: 0.0,
            speed: props["sog"].as_f64().unwrap_or(0.0),
            category: Category::Sea,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
