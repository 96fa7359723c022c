//! Clients page snapshot — status of every registry client plus the peer map.
//!
//! A snapshot is built from scratch, handed to the page cache together with
//! its TTL, and never touched again. The next build replaces it wholesale.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ChainConfig;
use crate::error::RegistryError;
use crate::registry::{ClientNode, NodeRegistry, PeerEntry};
use crate::topology::{build_peer_map, PeerMap};

/// Status of one registry client, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// 1-based position on the page.
    pub index: u32,
    pub name: String,
    pub version: String,
    pub peers: Vec<PeerEntry>,
    pub peer_id: String,
    /// Never negative; unsynced clients show slot 0.
    pub head_slot: u64,
    pub head_root: String,
    pub status: String,
    /// Unix ms.
    pub last_refresh: u64,
    pub last_error: Option<String>,
}

impl StatusRecord {
    fn from_client<C: ClientNode>(client: &C) -> Self {
        let head = client.last_head();
        Self {
            index: client.index().saturating_add(1),
            name: client.display_name().to_string(),
            version: client.version().to_string(),
            peers: client.peer_list().to_vec(),
            peer_id: client.identifier().to_string(),
            head_slot: u64::try_from(head.slot).unwrap_or(0),
            head_root: head.root,
            status: client.status().to_string(),
            last_refresh: head.refreshed_at,
            last_error: client.last_error().map(str::to_string),
        }
    }
}

/// One complete build of the clients page model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub clients: Vec<StatusRecord>,
    pub peer_map: PeerMap,
    pub client_count: u64,
}

/// Assemble a snapshot from an already-fetched client list.
///
/// Clients are taken in the order given; [`build_snapshot`] sorts them by
/// registry index first.
pub fn assemble<C: ClientNode>(clients: &[C], chain: &ChainConfig) -> (Snapshot, Duration) {
    let peer_map = build_peer_map(clients);
    let records: Vec<StatusRecord> = clients.iter().map(StatusRecord::from_client).collect();

    let snapshot = Snapshot {
        client_count: records.len() as u64,
        clients: records,
        peer_map,
    };
    (snapshot, chain.slot_duration())
}

/// Read the registry once and build the clients page model.
///
/// Returns the snapshot and how long it may be served from cache. A registry
/// failure is returned as-is; there is no partial snapshot.
pub fn build_snapshot<R: NodeRegistry>(
    registry: &R,
    chain: &ChainConfig,
) -> Result<(Snapshot, Duration), RegistryError> {
    let mut clients = registry.clients()?;
    clients.sort_by_key(|c| c.index());

    let (snapshot, ttl) = assemble(&clients, chain);
    tracing::info!(
        clients = snapshot.client_count,
        nodes = snapshot.peer_map.nodes.len(),
        edges = snapshot.peer_map.edges.len(),
        ttl_secs = ttl.as_secs(),
        "clients snapshot built"
    );
    Ok((snapshot, ttl))
}
