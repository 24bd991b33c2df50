use std::time::{Duration, Instant};

/// A single cached value with its bookkeeping
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub last_accessed: Instant,
    pub access_count: u64,
    pub ttl: Option<Duration>,
    pub expires_at: Option<Instant>,
    /// Monotonic per-cache sequence of the last touch; orders recency ties
    /// that share an `Instant` reading.
    pub touched: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, now: Instant, ttl: Option<Duration>, touched: u64) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            ttl,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            touched,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    pub fn touch(&mut self, now: Instant, touched: u64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now;
        self.touched = touched;
    }
}
