//! peermap-core — client topology graph, status snapshot, and shared types.
//! All other peermap crates depend on this one.

pub mod config;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod topology;

pub use error::RegistryError;
pub use registry::{ClientNode, Direction, HeadInfo, NodeRegistry, PeerEntry};
pub use snapshot::{assemble, build_snapshot, Snapshot, StatusRecord};
pub use topology::{build_peer_map, short_label, Edge, EdgeKey, Node, Origin, PeerMap, TopologyStats};

#[cfg(test)]
mod testing;
