//! External-resource cache metadata.
//!
//! The core never fetches anything itself; the surrounding application
//! downloads referenced images and stylesheets and records what it has on
//! disk here, keyed by resolved URI. The map is a bounded LRU so a long
//! conversion run over many documents cannot grow it without limit.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;

/// Validation metadata for one fetched external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResource {
    /// Resolved URI the resource was fetched from.
    pub uri: String,
    /// HTTP ETag returned by the origin, if any.
    pub etag: Option<String>,
    /// HTTP Last-Modified returned by the origin, if any.
    pub last_modified: Option<String>,
    /// Where the application stored the payload.
    pub local_path: Option<PathBuf>,
}

impl CachedResource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            etag: None,
            last_modified: None,
            local_path: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_last_modified(mut self, value: impl Into<String>) -> Self {
        self.last_modified = Some(value.into());
        self
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// A bounded LRU map of resource metadata keyed by URI.
pub struct ResourceCache {
    entries: LruCache<String, CachedResource>,
}

impl ResourceCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Record a resource, returning the displaced entry if the insert
    /// evicted one or replaced an entry under the same URI.
    pub fn insert(&mut self, resource: CachedResource) -> Option<CachedResource> {
        debug!(uri = %resource.uri, "caching resource metadata");
        self.entries
            .push(resource.uri.clone(), resource)
            .map(|(_, old)| old)
    }

    /// Look up by URI, marking the entry most recently used.
    pub fn get(&mut self, uri: &str) -> Option<&CachedResource> {
        self.entries.get(uri)
    }

    /// Look up by URI without touching recency.
    pub fn peek(&self, uri: &str) -> Option<&CachedResource> {
        self.entries.peek(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains(uri)
    }

    pub fn remove(&mut self, uri: &str) -> Option<CachedResource> {
        self.entries.pop(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
