//! Errors surfaced by the registry seam.

/// Failure reading the node registry.
///
/// Snapshot assembly passes this through untouched; retry and backoff
/// belong to whoever owns the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("node registry unavailable: {0}")]
    Unavailable(String),
}
