//! Response cache
//!
//! Entries are keyed by service, path, method and canonical query parameters
//! and expire after the classification TTL. Concurrent writers to the same key
//! race; the last writer wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use http::Method;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::policy::classification;
use crate::types::{Classification, ServiceIdentifier};

/// Cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Target service
    pub service: ServiceIdentifier,
    /// Endpoint path
    pub path: String,
    /// HTTP method
    pub method: Method,
    /// Form-urlencoded parameters, sorted by key
    pub params: String,
}

impl CacheKey {
    /// Build a key; `params` ordering never affects the result
    pub fn new(
        service: ServiceIdentifier,
        path: impl Into<String>,
        method: Method,
        params: &BTreeMap<String, String>,
    ) -> Self {
        // Encoding keeps `&` and `=` inside values from forging extra pairs
        let params = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();

        Self {
            service,
            path: path.into(),
            method,
            params,
        }
    }
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-memory response cache
#[derive(Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Only non-Restricted `GET` responses with a positive TTL are cacheable
    pub fn is_cacheable(method: &Method, classification: Classification) -> bool {
        *method == Method::GET
            && classification != Classification::Restricted
            && classification::resolve(classification).caching_allowed()
    }

    /// Fetch an unexpired entry
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Fetch an entry that is unexpired at `now`
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Store a response under `ttl`
    pub fn insert(&self, key: CacheKey, value: Value, ttl: Duration) {
        self.insert_at(key, value, ttl, Instant::now())
    }

    /// Store a response under `ttl` starting at `now`
    pub fn insert_at(&self, key: CacheKey, value: Value, ttl: Duration, now: Instant) {
        if ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.expires_at > now);
        debug!(service = %key.service, path = %key.path, ttl_seconds = ttl.as_secs(), "Caching response");
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
