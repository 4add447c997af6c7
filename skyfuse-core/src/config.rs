//! Configuration file management for skyfuse.
//!
//! Reads/writes `~/.skyfuse/config.yaml` with per-feed endpoints and
//! credentials, the geographic bounding box, the render tick rate, and the
//! optional staleness eviction window.

use std::path::PathBuf;

use crate::filter::GeoBounds;
use crate::types::SkyfuseError;

/// Full configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub adsb: FeedConfig,
    pub ais: FeedConfig,
    pub bounds: GeoBounds,
    pub render: RenderConfig,
    pub tracking: TrackingConfig,
}

/// One feed's endpoint, cadence, and (optional) authority credentials.
///
/// `client_id`/`client_secret` absent means anonymous mode: no token
/// exchange is attempted and requests go out without a bearer header.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub interval_sec: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub tick_hz: f64,
}

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Drop entities unseen for this many seconds. `null` retains forever.
    pub evict_after_sec: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            adsb: FeedConfig {
                url: "https://opensky-network.org/api/states/all".into(),
                token_url: Some(
                    "https://auth.opensky-network.org/auth/realms/opensky-network/protocol/openid-connect/token"
                        .into(),
                ),
                client_id: None,
                client_secret: None,
                interval_sec: 10.0,
                enabled: true,
            },
            ais: FeedConfig {
                url: "https://meri.digitraffic.fi/api/ais/v1/locations".into(),
                token_url: None,
                client_id: None,
                client_secret: None,
                interval_sec: 60.0,
                enabled: true,
            },
            // Norway-sized default viewing area
            bounds: GeoBounds::new(57.6, 2.8, 71.5, 35.4),
            render: RenderConfig { tick_hz: 30.0 },
            tracking: TrackingConfig {
                evict_after_sec: None,
            },
        }
    }
}

/// Get the config directory path (`~/.skyfuse/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".skyfuse")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from the given path, or the default location.
///
/// Returns default config if the file doesn't exist.
pub fn load_config(path: Option<&PathBuf>) -> Config {
    let path = path.cloned().unwrap_or_else(config_file);
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.skyfuse/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, SkyfuseError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| SkyfuseError::Config(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|e| SkyfuseError::Config(e.to_string()))?;

    Ok(path)
}

/// Parse simple YAML-like config text.
pub fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        if let Some((key, val)) = stripped.split_once(':') {
            let key = key.trim();
            let val = val.trim();

            if !is_indented {
                if val.is_empty() {
                    current_section = Some(key.to_string());
                } else {
                    current_section = None;
                }
            } else if let Some(ref section) = current_section {
                match section.as_str() {
                    "adsb" => apply_feed_key(&mut config.adsb, key, val),
                    "ais" => apply_feed_key(&mut config.ais, key, val),
                    "bounds" => match key {
                        "south" => {
                            if let Some(v) = parse_float_value(val) {
                                config.bounds.south = v;
                            }
                        }
                        "west" => {
                            if let Some(v) = parse_float_value(val) {
                                config.bounds.west = v;
                            }
                        }
                        "north" => {
                            if let Some(v) = parse_float_value(val) {
                                config.bounds.north = v;
                            }
                        }
                        "east" => {
                            if let Some(v) = parse_float_value(val) {
                                config.bounds.east = v;
                            }
                        }
                        _ => {}
                    },
                    "render" => {
                        if key == "tick_hz" {
                            if let Some(v) = parse_float_value(val) {
                                config.render.tick_hz = v;
                            }
                        }
                    }
                    "tracking" => {
                        if key == "evict_after_sec" {
                            config.tracking.evict_after_sec = parse_float_value(val);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Some(config)
}

fn apply_feed_key(feed: &mut FeedConfig, key: &str, val: &str) {
    match key {
        "url" => {
            if let Some(v) = parse_string_value(val) {
                feed.url = v;
            }
        }
        "token_url" => feed.token_url = parse_string_value(val),
        "client_id" => feed.client_id = parse_string_value(val),
        "client_secret" => feed.client_secret = parse_string_value(val),
        "interval_sec" => {
            if let Some(v) = parse_float_value(val) {
                feed.interval_sec = v;
            }
        }
        "enabled" => {
            if let Ok(v) = val.parse::<bool>() {
                feed.enabled = v;
            }
        }
        _ => {}
    }
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if (val.starts_with('"') && val.ends_with('"'))
        || (val.starts_with('\'') && val.ends_with('\''))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# skyfuse configuration".to_string(), String::new()];

    for (name, feed) in [("adsb", &config.adsb), ("ais", &config.ais)] {
        lines.push(format!("{name}:"));
        lines.push(format!("  url: \"{}\"", feed.url));
        match &feed.token_url {
            Some(v) => lines.push(format!("  token_url: \"{v}\"")),
            None => lines.push("  token_url: null".into()),
        }
        match &feed.client_id {
            Some(v) => lines.push(format!("  client_id: \"{v}\"")),
            None => lines.push("  client_id: null".into()),
        }
        match &feed.client_secret {
            Some(v) => lines.push(format!("  client_secret: \"{v}\"")),
            None => lines.push("  client_secret: null".into()),
        }
        lines.push(format!("  interval_sec: {}", feed.interval_sec));
        lines.push(format!("  enabled: {}", feed.enabled));
        lines.push(String::new());
    }

    lines.push("bounds:".into());
    lines.push(format!("  south: {}", config.bounds.south));
    lines.push(format!("  west: {}", config.bounds.west));
    lines.push(format!("  north: {}", config.bounds.north));
    lines.push(format!("  east: {}", config.bounds.east));
    lines.push(String::new());

    lines.push("render:".into());
    lines.push(format!("  tick_hz: {}", config.render.tick_hz));
    lines.push(String::new());

    lines.push("tracking:".into());
    match config.tracking.evict_after_sec {
        Some(v) => lines.push(format!("  evict_after_sec: {v}")),
        None => lines.push("  evict_after_sec: null".into()),
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.adsb.enabled);
        assert!(config.adsb.client_id.is_none(), "anonymous by default");
        assert_eq!(config.ais.interval_sec, 60.0);
        assert_eq!(config.render.tick_hz, 30.0);
        assert!(config.tracking.evict_after_sec.is_none());
        assert!(config.bounds.contains(59.9, 10.7));
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
adsb:
  url: "https://example.com/states"
  client_id: "my-client"
  client_secret: "my-secret"
  interval_sec: 15
  enabled: true

ais:
  enabled: false

bounds:
  south: 54.0
  west: 8.0
  north: 58.0
  east: 13.0

render:
  tick_hz: 60

tracking:
  evict_after_sec: 300
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.adsb.url, "https://example.com/states");
        assert_eq!(config.adsb.client_id, Some("my-client".into()));
        assert_eq!(config.adsb.interval_sec, 15.0);
        assert!(!config.ais.enabled);
        assert_eq!(config.bounds.south, 54.0);
        assert_eq!(config.bounds.east, 13.0);
        assert_eq!(config.render.tick_hz, 60.0);
        assert_eq!(config.tracking.evict_after_sec, Some(300.0));
    }

    #[test]
    fn test_parse_config_null_values() {
        let text = r#"
adsb:
  client_id: null
  client_secret: ~

tracking:
  evict_after_sec: null
"#;
        let config = parse_config(text).unwrap();
        assert!(config.adsb.client_id.is_none());
        assert!(config.adsb.client_secret.is_none());
        assert!(config.tracking.evict_after_sec.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.adsb.client_id = Some("abc".into());
        config.adsb.client_secret = Some("def".into());
        config.ais.enabled = false;
        config.render.tick_hz = 24.0;
        config.tracking.evict_after_sec = Some(120.0);

        let text = serialize_config(&config);
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.adsb.client_id, Some("abc".into()));
        assert!(!parsed.ais.enabled);
        assert_eq!(parsed.render.tick_hz, 24.0);
        assert_eq!(parsed.tracking.evict_after_sec, Some(120.0));
        assert_eq!(parsed.bounds, config.bounds);
    }
}
