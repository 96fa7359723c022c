//! peermapd — serves the clients page: per-client status plus the peer map.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use peermap_core::config::PeermapConfig;
use peermap_services::{CallRateLimiter, ClientRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = PeermapConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = PeermapConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        PeermapConfig::default()
    });
    tracing::info!(
        seconds_per_slot = config.chain.seconds_per_slot,
        rate_limit = config.rate_limit.enabled,
        "peermapd starting"
    );

    // Registry, optionally seeded from a file (first CLI arg wins over config)
    let registry = ClientRegistry::new();
    let seed_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.registry.seed_path.clone());
    if let Some(path) = seed_path {
        if let Err(e) = registry.load_seed(&path) {
            tracing::warn!(error = %e, "failed to load client seed, starting empty");
        }
    }

    let limiter = CallRateLimiter::new(&config.rate_limit);

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let registry_printer = {
        let registry = registry.clone();
        let period = config.chain.slot_duration();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                tracing::debug!(clients = registry.len(), "registry snapshot");
            }
        })
    };

    let limiter_pruner = {
        let limiter = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                limiter.prune();
                tracing::trace!(callers = limiter.tracked_callers(), "rate limiter pruned");
            }
        })
    };

    let api_addr = SocketAddr::new(config.api.bind, config.api.port);
    let state = peermap_api::ApiState::new(registry, limiter, config.chain.clone());
    let api_task = tokio::spawn(async move {
        if let Err(e) = peermap_api::serve(state, api_addr).await {
            tracing::error!(error = %e, "API server failed");
        }
    });

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv()  => tracing::info!("shutting down"),
        r = api_task            => tracing::error!("API task exited: {:?}", r),
        r = registry_printer    => tracing::error!("registry printer exited: {:?}", r),
        r = limiter_pruner      => tracing::error!("rate limiter pruner exited: {:?}", r),
    }

    Ok(())
}
