//! Page cache — built page models keyed by page name.
//!
//! A page is rebuilt only when its TTL has passed or the caller forces a
//! refresh. Each key has its own async lock held across check-and-build,
//! so concurrent readers of a stale page wait for one rebuild and share
//! its result instead of rebuilding in parallel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

/// A built page together with when it was built and how long it stays fresh.
///
/// Readers get the metadata of the exact page they were served, so TTL and
/// age never come from a later rebuild.
#[derive(Debug)]
pub struct Page<T> {
    pub value: Arc<T>,
    pub built_at: Instant,
    pub ttl: Duration,
}

impl<T> Clone for Page<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            built_at: self.built_at,
            ttl: self.ttl,
        }
    }
}

impl<T> Page<T> {
    pub fn age(&self) -> Duration {
        self.built_at.elapsed()
    }

    fn is_fresh(&self) -> bool {
        self.age() < self.ttl
    }
}

type PageSlot<T> = Arc<Mutex<Option<Page<T>>>>;

/// Typed page cache. Cloning shares the underlying storage.
pub struct PageCache<T> {
    pages: Arc<DashMap<String, PageSlot<T>>>,
}

impl<T> Clone for PageCache<T> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
        }
    }
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PageCache<T> {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(DashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> PageSlot<T> {
        self.pages.entry(key.to_string()).or_default().clone()
    }

    /// Return the cached page for `key`, rebuilding it if it is missing,
    /// expired, or `force_refresh` is set.
    ///
    /// `build` returns the page and how long it stays fresh. If it fails the
    /// error is returned and whatever was cached before is left in place.
    pub async fn get_or_build<F, E>(
        &self,
        key: &str,
        force_refresh: bool,
        build: F,
    ) -> Result<Page<T>, E>
    where
        F: FnOnce() -> Result<(T, Duration), E>,
    {
        let slot = self.slot(key);
        let mut page = slot.lock().await;

        if !force_refresh {
            if let Some(cached) = page.as_ref().filter(|p| p.is_fresh()) {
                tracing::trace!(key, "page cache hit");
                return Ok(cached.clone());
            }
        }

        let started = Instant::now();
        let (value, ttl) = build()?;
        let built = Page {
            value: Arc::new(value),
            built_at: Instant::now(),
            ttl,
        };
        *page = Some(built.clone());
        tracing::debug!(
            key,
            force_refresh,
            ttl_secs = ttl.as_secs(),
            build_ms = started.elapsed().as_millis() as u64,
            "page rebuilt"
        );
        Ok(built)
    }

    /// Drop the cached page for `key`. The next read rebuilds it.
    pub async fn invalidate(&self, key: &str) {
        let Some(slot) = self.pages.get(key).map(|s| s.value().clone()) else {
            return;
        };
        *slot.lock().await = None;
        tracing::debug!(key, "page invalidated");
    }

    /// How long ago the page for `key` was built, if one is cached.
    pub async fn age(&self, key: &str) -> Option<Duration> {
        let slot = self.pages.get(key).map(|s| s.value().clone())?;
        let page = slot.lock().await;
        page.as_ref().map(Page::age)
    }

    /// Number of keys the cache has seen.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
