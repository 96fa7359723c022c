//! peermap-services — live state behind the clients page: the client
//! registry, the page cache, and the caller rate limiter.

pub mod cache;
pub mod ratelimit;
pub mod registry;

pub use cache::{Page, PageCache};
pub use ratelimit::CallRateLimiter;
pub use registry::{ClientRecord, ClientRegistry, ClientReport, SeedError};
