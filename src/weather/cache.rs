//! In-memory TTL cache of weather reports.
//!
//! # Design Decisions
//! - Bounded: at capacity, expired entries go first, then the ones closest to expiry
//! - Lost on restart, which is acceptable for data this short-lived

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};
use crate::weather::types::WeatherReport;

#[derive(Debug, Clone)]
struct CacheEntry {
    expires_at: Instant,
    report: WeatherReport,
}

/// A thread-safe, size-bounded TTL cache keyed by [`WeatherQuery::cache_key`].
///
/// [`WeatherQuery::cache_key`]: crate::weather::WeatherQuery::cache_key
#[derive(Debug)]
pub struct ResponseCache<C: Clock = SystemClock> {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_items: usize,
    clock: C,
}

impl ResponseCache<SystemClock> {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ResponseCache<C> {
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            max_items: config.max_items.max(1),
            clock,
        }
    }

    /// Fresh report for `key`, if any. Expired entries are dropped on the way.
    pub fn get(&self, key: &str) -> Option<WeatherReport> {
        let now = self.clock.now();
        match self.entries.get(key) {
            None => {
                metrics::record_cache_lookup(false);
                return None;
            }
            Some(entry) if now <= entry.expires_at => {
                metrics::record_cache_lookup(true);
                return Some(entry.report.clone());
            }
            Some(_) => {}
        }

        self.entries.remove_if(key, |_, entry| now > entry.expires_at);
        metrics::record_cache_lookup(false);
        None
    }

    /// Store a report, evicting if the cache is full.
    pub fn insert(&self, key: String, report: WeatherReport) {
        let now = self.clock.now();
        if self.entries.len() >= self.max_items && !self.entries.contains_key(&key) {
            self.evict(now);
        }

        self.entries.insert(
            key,
            CacheEntry {
                expires_at: now + self.ttl,
                report,
            },
        );
        metrics::record_cache_size(self.entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&self, now: Instant) {
        self.entries.retain(|_, entry| now <= entry.expires_at);
        if self.entries.len() < self.max_items {
            return;
        }

        let mut by_expiry: Vec<(Instant, String)> = self
            .entries
            .iter()
            .map(|r| (r.value().expires_at, r.key().clone()))
            .collect();
        by_expiry.sort_unstable_by_key(|(expires_at, _)| *expires_at);

        let batch = (self.max_items / 10).max(1);
        for (_, key) in by_expiry.into_iter().take(batch) {
            self.entries.remove(&key);
        }
        tracing::debug!(evicted = batch, "Response cache full, evicted oldest entries");
    }
}
