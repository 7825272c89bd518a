// Explicit query cache owned by the session layer
// Keyed by the SHA-256 of the query text; invalidation is caller-controlled
// (optional TTL plus manual invalidate/clear).

use crate::source::{QueryService, TablePage};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

fn cache_key(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheEntry {
    page: TablePage,
    fetched_at: DateTime<Utc>,
}

/// In-memory cache of query results.
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Option<Duration>,
}

impl QueryCache {
    /// Cache that only refreshes on manual invalidation.
    pub fn new() -> Self {
        QueryCache {
            entries: HashMap::new(),
            ttl: None,
        }
    }

    /// Cache whose entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        QueryCache {
            entries: HashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Cached page for the query, or run it through the service and store
    /// the result. Expired entries are refreshed in place.
    pub fn fetch(&mut self, service: &dyn QueryService, sql: &str) -> Result<TablePage> {
        let key = cache_key(sql);
        let now = Utc::now();

        if let Some(entry) = self.entries.get(&key) {
            let expired = self
                .ttl
                .map(|ttl| entry.fetched_at + ttl <= now)
                .unwrap_or(false);

            if !expired {
                debug!("cache hit for query {}", &key[..12]);
                return Ok(entry.page.clone());
            }
            debug!("cache entry {} expired, refetching", &key[..12]);
        }

        let page = service.run_query(sql)?;
        self.entries.insert(
            key,
            CacheEntry {
                page: page.clone(),
                fetched_at: now,
            },
        );
        Ok(page)
    }

    /// Drop the cached result for one query.
    pub fn invalidate(&mut self, sql: &str) {
        self.entries.remove(&cache_key(sql));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        QueryCache::new()
    }
}
