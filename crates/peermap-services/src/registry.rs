//! Client registry — the clients we monitor and what they last reported.
//!
//! Keyed on client name. Each client gets a stable index the first time it
//! is seen; replacing a report keeps the index so page order stays put.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use peermap_core::{ClientNode, HeadInfo, NodeRegistry, PeerEntry, RegistryError};

/// What a client pushes to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientReport {
    pub name: String,
    pub peer_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
    #[serde(default)]
    pub head: HeadInfo,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub last_error: Option<String>,
}

fn default_status() -> String {
    "online".to_string()
}

/// A registered client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub report: ClientReport,
    pub index: u32,
}

impl ClientNode for ClientRecord {
    fn identifier(&self) -> &str {
        &self.report.peer_id
    }
    fn display_name(&self) -> &str {
        &self.report.name
    }
    fn version(&self) -> &str {
        &self.report.version
    }
    fn peer_list(&self) -> &[PeerEntry] {
        &self.report.peers
    }
    fn last_head(&self) -> HeadInfo {
        self.report.head.clone()
    }
    fn status(&self) -> &str {
        &self.report.status
    }
    fn last_error(&self) -> Option<&str> {
        self.report.last_error.as_deref()
    }
    fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {0}: {1}")]
    Read(std::path::PathBuf, std::io::Error),
    #[error("failed to parse seed file {0}: {1}")]
    Parse(std::path::PathBuf, serde_json::Error),
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory registry shared between the API and whatever feeds it.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<String, ClientRecord>>,
    next_index: Arc<AtomicU32>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a client's report. Returns the client's index.
    pub fn upsert(&self, report: ClientReport) -> u32 {
        let name = report.name.clone();
        let peers = report.peers.len();
        let index = match self.clients.entry(name.clone()) {
            Entry::Occupied(mut e) => {
                e.get_mut().report = report;
                e.get().index
            }
            Entry::Vacant(e) => {
                let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                e.insert(ClientRecord { report, index });
                index
            }
        };
        tracing::debug!(client = %name, index, peers, "client report stored");
        index
    }

    /// Record a new head for a client. Returns false if the client is unknown.
    pub fn update_head(&self, name: &str, slot: i64, root: impl Into<String>) -> bool {
        match self.clients.get_mut(name) {
            Some(mut record) => {
                record.report.head = HeadInfo {
                    slot,
                    root: root.into(),
                    refreshed_at: now_ms(),
                };
                true
            }
            None => false,
        }
    }

    pub fn set_status(&self, name: &str, status: impl Into<String>) -> bool {
        match self.clients.get_mut(name) {
            Some(mut record) => {
                record.report.status = status.into();
                true
            }
            None => false,
        }
    }

    /// Set or clear a client's last error.
    pub fn set_error(&self, name: &str, error: Option<String>) -> bool {
        match self.clients.get_mut(name) {
            Some(mut record) => {
                record.report.last_error = error;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, name: &str) -> Option<ClientRecord> {
        let removed = self.clients.remove(name).map(|(_, record)| record);
        if removed.is_some() {
            tracing::info!(client = name, "client removed");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<ClientRecord> {
        self.clients.get(name).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Load client reports from a JSON array. Returns how many were stored.
    pub fn load_seed(&self, path: &Path) -> Result<usize, SeedError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SeedError::Read(path.to_path_buf(), e))?;
        let reports: Vec<ClientReport> = serde_json::from_str(&text)
            .map_err(|e| SeedError::Parse(path.to_path_buf(), e))?;
        let count = reports.len();
        for report in reports {
            self.upsert(report);
        }
        tracing::info!(count, path = %path.display(), "loaded client seed");
        Ok(count)
    }
}

impl NodeRegistry for ClientRegistry {
    type Client = ClientRecord;

    /// Point-in-time copy of every client, ordered by index.
    fn clients(&self) -> Result<Vec<ClientRecord>, RegistryError> {
        let mut clients: Vec<ClientRecord> =
            self.clients.iter().map(|e| e.value().clone()).collect();
        clients.sort_by_key(|c| c.index);
        Ok(clients)
    }
}
