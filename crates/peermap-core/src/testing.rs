//! In-crate test fixtures.

use crate::error::RegistryError;
use crate::registry::{ClientNode, HeadInfo, NodeRegistry, PeerEntry};

#[derive(Debug, Clone)]
pub(crate) struct TestClient {
    pub name: String,
    pub id: String,
    pub peers: Vec<PeerEntry>,
    pub head: HeadInfo,
    pub error: Option<String>,
    pub index: u32,
}

impl TestClient {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            peers: Vec::new(),
            head: HeadInfo::default(),
            error: None,
            index: 0,
        }
    }

    pub fn with_peers(mut self, peers: Vec<PeerEntry>) -> Self {
        self.peers = peers;
        self
    }
}

impl ClientNode for TestClient {
    fn identifier(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn version(&self) -> &str {
        "test/v0.0.1"
    }
    fn peer_list(&self) -> &[PeerEntry] {
        &self.peers
    }
    fn last_head(&self) -> HeadInfo {
        self.head.clone()
    }
    fn status(&self) -> &str {
        "online"
    }
    fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }
    fn index(&self) -> u32 {
        self.index
    }
}

/// Registry returning a fixed list, or a fixed error.
pub(crate) struct TestRegistry(pub Result<Vec<TestClient>, RegistryError>);

impl NodeRegistry for TestRegistry {
    type Client = TestClient;

    fn clients(&self) -> Result<Vec<TestClient>, RegistryError> {
        self.0.clone()
    }
}
