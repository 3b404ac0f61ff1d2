//! Versioned cache store
//!
//! One named cache per worker version. Renaming the cache (a version bump)
//! is the only mass-invalidation mechanism: activation deletes every cache
//! whose name is not the current one.

use crate::fetch::{Request, Response};
use hashbrown::HashMap;

/// One named cache, keyed by full request URL.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    name: String,
    entries: HashMap<String, Response>,
}

impl Cache {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response for a request, replacing any previous entry.
    pub fn put(&mut self, request: &Request, response: Response) {
        self.entries.insert(request.url.to_string(), response);
    }

    /// Exact-URL lookup.
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        self.entries.get(request.url.as_str())
    }

    pub fn delete(&mut self, request: &Request) -> bool {
        self.entries.remove(request.url.as_str()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

/// All named caches known to the worker's origin.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cache, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Insert a fully populated cache, replacing any same-named one. Used by
    /// install to commit the staged shell in one step.
    pub fn insert(&mut self, cache: Cache) {
        self.caches.insert(cache.name().to_string(), cache);
    }

    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Lookup within one named cache.
    pub fn match_in(&self, name: &str, request: &Request) -> Option<&Response> {
        self.caches.get(name).and_then(|c| c.match_request(request))
    }
}
