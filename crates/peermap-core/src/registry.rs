//! Registry seam — the read-only view of live clients the core builds from.
//!
//! The core never owns registry state. Callers hand in something that
//! implements [`NodeRegistry`] and the builders take a point-in-time list
//! of [`ClientNode`]s from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Which side opened a peer connection, as seen by the reporting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Direction::Inbound),
            "outbound" => Ok(Direction::Outbound),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// One entry of a client's reported peer list.
///
/// `direction` is kept as the raw string the client reported so that a
/// malformed value never fails deserialization of the whole report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    pub peer_id: String,
    pub direction: String,
}

impl PeerEntry {
    pub fn new(peer_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            peer_id: peer_id.into(),
            direction: direction.to_string(),
        }
    }

    /// Parsed direction, or the raw value if it is not recognised.
    pub fn direction(&self) -> Result<Direction, String> {
        self.direction.parse()
    }
}

/// Last head a client reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadInfo {
    /// Slot of the head. Clients that have not synced yet report -1.
    pub slot: i64,
    /// Hex root of the head block.
    pub root: String,
    /// Unix ms of the client's last successful refresh.
    pub refreshed_at: u64,
}

/// Read-only accessors the core needs from each registry client.
pub trait ClientNode {
    /// Network-level peer identifier.
    fn identifier(&self) -> &str;
    fn display_name(&self) -> &str;
    fn version(&self) -> &str;
    fn peer_list(&self) -> &[PeerEntry];
    fn last_head(&self) -> HeadInfo;
    fn status(&self) -> &str;
    fn last_error(&self) -> Option<&str>;
    /// Stable 0-based ordinal within the registry.
    fn index(&self) -> u32;
}

/// A source of clients.
///
/// `clients()` must return a stable list for the duration of one build,
/// ordered by [`ClientNode::index`].
pub trait NodeRegistry: Send + Sync {
    type Client: ClientNode;

    fn clients(&self) -> Result<Vec<Self::Client>, RegistryError>;
}
