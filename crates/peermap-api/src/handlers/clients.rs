//! /clients, /clients/topology, /clients/{name} handlers.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use peermap_core::{PeerMap, Snapshot, StatusRecord};
use peermap_services::{ClientReport, Page};

use super::{api_error, ApiError, ApiState, CLIENTS_PAGE_KEY};

#[derive(Deserialize, Default)]
pub struct PageQuery {
    /// Rebuild the page even if the cached one is still fresh.
    #[serde(default)]
    pub refresh: bool,
}

/// Rate-limit the caller, then serve the clients page from cache.
async fn clients_page(
    state: &ApiState,
    caller: SocketAddr,
    refresh: bool,
) -> Result<Page<Snapshot>, ApiError> {
    if !state.limiter.check(caller.ip(), 1) {
        return Err(api_error(StatusCode::TOO_MANY_REQUESTS, "call rate limit exceeded"));
    }

    state
        .cache
        .get_or_build(CLIENTS_PAGE_KEY, refresh, || (state.build_page)())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "clients page build failed");
            api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        })
}

// ── /clients ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ClientsResponse<'a> {
    pub clients: &'a [StatusRecord],
    pub client_count: u64,
    pub peer_map: &'a PeerMap,
    pub cache_ttl_secs: u64,
    pub cache_age_ms: u64,
}

pub async fn handle_clients(
    State(state): State<ApiState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let page = clients_page(&state, caller, query.refresh).await?;
    let snapshot = &page.value;

    Ok(Json(ClientsResponse {
        clients: &snapshot.clients,
        client_count: snapshot.client_count,
        peer_map: &snapshot.peer_map,
        cache_ttl_secs: page.ttl.as_secs(),
        cache_age_ms: page.age().as_millis() as u64,
    })
    .into_response())
}

// ── /clients/topology ────────────────────────────────────────────────────────

pub async fn handle_topology(
    State(state): State<ApiState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let page = clients_page(&state, caller, query.refresh).await?;
    Ok(Json(&page.value.peer_map).into_response())
}

// ── /clients/{name} ──────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct ReportResponse {
    pub name: String,
    pub index: u32,
}

pub async fn handle_client_report(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(report): Json<ClientReport>,
) -> Result<Json<ReportResponse>, ApiError> {
    if report.name != name {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("report name {:?} does not match path {:?}", report.name, name),
        ));
    }
    if report.peer_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "peer_id must not be empty"));
    }

    let index = state.registry.upsert(report);
    state.cache.invalidate(CLIENTS_PAGE_KEY).await;
    tracing::info!(client = %name, index, "client report accepted");

    Ok(Json(ReportResponse { name, index }))
}

#[derive(Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: String,
}

pub async fn handle_client_remove(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveResponse>, ApiError> {
    if state.registry.remove(&name).is_none() {
        return Err(api_error(StatusCode::NOT_FOUND, format!("unknown client {name}")));
    }
    state.cache.invalidate(CLIENTS_PAGE_KEY).await;
    Ok(Json(RemoveResponse { removed: name }))
}
