//! skyfuse: multi-feed track fusion and smoothing daemon.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skyfuse_core::config::{self, Config, FeedConfig};
use skyfuse_core::filter::TrackFilter;
use skyfuse_core::interp::InterpolationEngine;
use skyfuse_core::store::TrackStore;

use crate::auth::{HttpExchanger, TokenCache};
use crate::feed::{DataSource, FeedAdapter, StateVectorSource, VesselSource};
use crate::orchestrator::{Orchestrator, SharedStore};

mod auth;
mod feed;
mod orchestrator;
mod render;

#[derive(Parser)]
#[command(name = "skyfuse", version, about = "Multi-feed track fusion and smoothing daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll all enabled feeds and track entities until interrupted
    Run {
        /// Config file path (default: ~/.skyfuse/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the interpolation tick rate from the config
        #[arg(long)]
        tick_hz: Option<f64>,

        /// Seconds between snapshot table prints
        #[arg(long, default_value = "2.0")]
        print_interval: f64,

        /// Disable the snapshot table (logs only)
        #[arg(long)]
        no_table: bool,
    },

    /// Parse the config and print the effective settings
    CheckConfig {
        /// Config file path (default: ~/.skyfuse/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            tick_hz,
            print_interval,
            no_table,
        } => cmd_run(config, tick_hz, print_interval, no_table).await,
        Commands::CheckConfig { config } => cmd_check_config(config),
    }
}

async fn cmd_run(
    config_path: Option<PathBuf>,
    tick_hz: Option<f64>,
    print_interval: f64,
    no_table: bool,
) {
    let config = config::load_config(config_path.as_ref());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error building HTTP client: {e}");
            std::process::exit(1);
        });

    let store: SharedStore = Arc::new(RwLock::new(TrackStore::new(
        config.tracking.evict_after_sec,
    )));
    let (mut orch, motion_rx) = Orchestrator::new(store.clone());

    let filter = TrackFilter::new(config.bounds);

    if config.adsb.enabled {
        let source = StateVectorSource::new(client.clone(), &config.adsb.url);
        spawn_feed(&mut orch, &client, &config.adsb, Box::new(source), &filter);
    }
    if config.ais.enabled {
        let source = VesselSource::new(client.clone(), &config.ais.url);
        spawn_feed(&mut orch, &client, &config.ais, Box::new(source), &filter);
    }

    let tick_hz = tick_hz.unwrap_or(config.render.tick_hz);
    orch.spawn_interpolator(InterpolationEngine::default(), tick_hz);

    let table_task = if no_table {
        None
    } else {
        Some(tokio::spawn(render::run_table_loop(
            store.clone(),
            motion_rx,
            Duration::from_secs_f64(print_interval.max(0.1)),
        )))
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for shutdown signal: {e}");
    }

    info!("shutting down");
    if let Some(task) = table_task {
        task.abort();
    }
    orch.shutdown().await;

    let entities = store.read().await.snapshot();
    println!("\nFinal state: {} entities", entities.len());
    println!("{}", render::format_snapshot(&entities));
}

/// Wire one configured feed into the orchestrator, with a token cache when
/// the config carries credentials and anonymous mode otherwise.
fn spawn_feed(
    orch: &mut Orchestrator,
    client: &reqwest::Client,
    feed: &FeedConfig,
    source: Box<dyn DataSource>,
    filter: &TrackFilter,
) {
    let auth = build_auth(client, feed);
    let adapter = FeedAdapter::new(source, auth, filter.clone());
    orch.spawn_feed(adapter, feed.interval_sec);
}

fn build_auth(client: &reqwest::Client, feed: &FeedConfig) -> Option<TokenCache> {
    match (&feed.client_id, &feed.client_secret, &feed.token_url) {
        (Some(id), Some(secret), Some(url)) => Some(TokenCache::new(
            url,
            Box::new(HttpExchanger::new(client.clone(), url, id, secret)),
        )),
        _ => None,
    }
}

fn cmd_check_config(config_path: Option<PathBuf>) {
    let mut config = config::load_config(config_path.as_ref());
    redact(&mut config);
    print!("{}", config::serialize_config(&config));
}

fn redact(config: &mut Config) {
    for feed in [&mut config.adsb, &mut config.ais] {
        if feed.client_secret.is_some() {
            feed.client_secret = Some("****".into());
        }
    }
}
