//! HTTP API handlers — exposes the clients page model as JSON.

pub mod clients;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde::Serialize;

use peermap_core::config::ChainConfig;
use peermap_core::{build_snapshot, NodeRegistry, RegistryError, Snapshot};
use peermap_services::{CallRateLimiter, ClientRegistry, PageCache};

/// Cache key the clients page is stored under.
pub const CLIENTS_PAGE_KEY: &str = "clients";

/// Builds a fresh clients page from whatever registry the state reads.
pub type PageBuilder = Arc<dyn Fn() -> Result<(Snapshot, Duration), RegistryError> + Send + Sync>;

#[derive(Clone)]
pub struct ApiState {
    /// Target of client reports and removals.
    pub registry: ClientRegistry,
    pub cache: PageCache<Snapshot>,
    pub limiter: CallRateLimiter,
    pub chain: ChainConfig,
    pub build_page: PageBuilder,
}

impl ApiState {
    pub fn new(registry: ClientRegistry, limiter: CallRateLimiter, chain: ChainConfig) -> Self {
        let source = registry.clone();
        Self::with_source(registry, source, limiter, chain)
    }

    /// Serve the clients page from `source` instead of the report registry.
    pub fn with_source<R>(
        registry: ClientRegistry,
        source: R,
        limiter: CallRateLimiter,
        chain: ChainConfig,
    ) -> Self
    where
        R: NodeRegistry + 'static,
    {
        let build_chain = chain.clone();
        let build_page: PageBuilder = Arc::new(move || build_snapshot(&source, &build_chain));
        Self {
            registry,
            cache: PageCache::new(),
            limiter,
            chain,
            build_page,
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, axum::Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        axum::Json(ErrorBody {
            error: error.into(),
        }),
    )
}

// Re-export handler functions for use in router setup.
pub use clients::{handle_client_remove, handle_client_report, handle_clients, handle_topology};
