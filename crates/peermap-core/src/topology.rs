//! Peer topology — folds every client's "my peers are X, Y, Z" report into
//! one deduplicated graph for the peer map.
//!
//! Two passes over the client list:
//!   1. seed an `internal` node per client identifier
//!   2. walk each client's peer list, adding `external` nodes and edges
//!
//! Nodes and edges are appended to ordered lists; the maps only hold
//! positions for O(1) dedup, so output order never depends on hash order.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::{ClientNode, Direction};

/// Characters kept from each end of an identifier in a short label.
const LABEL_EDGE_CHARS: usize = 5;

/// Whether a node is one of our registry clients or a peer we only know of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Internal,
    External,
}

/// A vertex of the peer map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub origin: Origin,
    /// Observed edge endpoints touching this node.
    pub degree: u32,
}

/// A connection between two nodes.
///
/// Undirected for dedup purposes; `from`/`to` record the direction of
/// whichever report was processed first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// At least one endpoint is an external peer.
    pub cross_boundary: bool,
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.from, &self.to)
    }
}

/// Canonical unordered endpoint pair, lexicographically sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey(String, String);

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Entries the builder saw and how many it set aside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyStats {
    /// Peer entries that produced degree increments.
    pub observations: u32,
    /// Entries whose direction was not recognised and defaulted to outbound.
    pub malformed_directions: u32,
    /// Entries naming the reporting client itself. Kept as an `A-A` edge
    /// and counted here so the map can flag them.
    pub self_loops: u32,
    /// Repeat entries for a neighbour already listed by the same client; dropped.
    pub duplicate_entries: u32,
}

/// The graph handed to the peer map renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMap {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub stats: TopologyStats,
}

impl PeerMap {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        let key = EdgeKey::new(a, b);
        self.edges.iter().find(|e| e.key() == key)
    }
}

/// Short display label for a peer we have no name for: `abcde...vwxyz`.
///
/// Identifiers too short to truncate are returned whole.
pub fn short_label(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() < LABEL_EDGE_CHARS * 2 {
        return id.to_string();
    }
    let head: String = chars[..LABEL_EDGE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - LABEL_EDGE_CHARS..].iter().collect();
    format!("{head}...{tail}")
}

/// Build the peer map for a list of clients.
///
/// Pure and infallible. Running it twice over the same clients yields
/// identical output, order included.
pub fn build_peer_map<C: ClientNode>(clients: &[C]) -> PeerMap {
    let mut builder = Builder::default();

    for client in clients {
        builder.seed_client(client.identifier(), client.display_name());
    }
    for client in clients {
        builder.add_reports(client);
    }

    tracing::debug!(
        nodes = builder.map.nodes.len(),
        edges = builder.map.edges.len(),
        observations = builder.map.stats.observations,
        "peer map built"
    );
    builder.map
}

#[derive(Default)]
struct Builder {
    map: PeerMap,
    /// node id → position in `map.nodes`
    node_index: HashMap<String, usize>,
    edge_keys: HashSet<EdgeKey>,
}

impl Builder {
    fn seed_client(&mut self, id: &str, name: &str) {
        if let Some(&pos) = self.node_index.get(id) {
            tracing::debug!(peer_id = id, name, "duplicate client identifier, relabelling");
            self.map.nodes[pos].label = name.to_string();
            return;
        }
        self.push_node(id, name.to_string(), Origin::Internal);
    }

    fn add_reports<C: ClientNode>(&mut self, client: &C) {
        let reporter = client.identifier();
        let mut listed: HashSet<&str> = HashSet::new();

        for entry in client.peer_list() {
            let peer = entry.peer_id.as_str();
            if !listed.insert(peer) {
                tracing::debug!(peer_id = reporter, peer, "duplicate peer entry, skipping");
                self.map.stats.duplicate_entries += 1;
                continue;
            }
            if peer == reporter {
                tracing::debug!(peer_id = reporter, "client lists itself as a peer");
                self.map.stats.self_loops += 1;
            }
            let direction = entry.direction().unwrap_or_else(|raw| {
                tracing::debug!(
                    peer_id = reporter,
                    peer,
                    direction = %raw,
                    "unknown peer direction, assuming outbound"
                );
                self.map.stats.malformed_directions += 1;
                Direction::Outbound
            });
            self.observe(reporter, peer, direction);
        }
    }

    /// A self-loop lands both degree increments on the same node.
    fn observe(&mut self, reporter: &str, peer: &str, direction: Direction) {
        let peer_pos = self.node_or_external(peer);
        let reporter_pos = self.node_or_external(reporter);

        if self.edge_keys.insert(EdgeKey::new(reporter, peer)) {
            let cross_boundary = self.map.nodes[peer_pos].origin == Origin::External
                || self.map.nodes[reporter_pos].origin == Origin::External;
            let (from, to) = match direction {
                Direction::Inbound => (peer, reporter),
                Direction::Outbound => (reporter, peer),
            };
            self.map.edges.push(Edge {
                from: from.to_string(),
                to: to.to_string(),
                cross_boundary,
            });
        }

        self.map.nodes[peer_pos].degree += 1;
        self.map.nodes[reporter_pos].degree += 1;
        self.map.stats.observations += 1;
    }

    fn node_or_external(&mut self, id: &str) -> usize {
        match self.node_index.get(id) {
            Some(&pos) => pos,
            None => self.push_node(id, short_label(id), Origin::External),
        }
    }

    fn push_node(&mut self, id: &str, label: String, origin: Origin) -> usize {
        let pos = self.map.nodes.len();
        self.map.nodes.push(Node {
            id: id.to_string(),
            label,
            origin,
            degree: 0,
        });
        self.node_index.insert(id.to_string(), pos);
        pos
    }
}
