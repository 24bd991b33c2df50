//! The local cache engine
//!
//! All state lives behind one mutex, so every operation is synchronous and
//! safe to call from any thread. The async methods are thin wrappers that
//! exist so async callers can treat the cache like any other backend.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use super::entry::CacheEntry;
use super::stats::{hit_rate, CacheStats};
use super::TOP_KEYS_LIMIT;

/// Construction options for [`LocalCache`]
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Maximum number of entries; values below 1 are raised to 1
    pub max_size: usize,
    /// TTL applied when `set` is called without one
    pub default_ttl: Option<Duration>,
    /// Interval used by [`LocalCache::start_cleanup`]
    pub cleanup_interval: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: None,
            cleanup_interval: Some(Duration::from_secs(60)),
        }
    }
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
    clock: u64,
}

enum Presence {
    Live,
    Expired,
    Absent,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
            expirations: 0,
            evictions: 0,
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Resolve lazy expiry for one key
    fn presence<Q>(&mut self, key: &Q, now: Instant) -> Presence
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.entries.get(key) {
            None => return Presence::Absent,
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.entries.remove(key);
            self.expirations += 1;
            Presence::Expired
        } else {
            Presence::Live
        }
    }

    /// Remove the least accessed entry, oldest touch first on ties
    fn evict_one(&mut self) -> Option<K> {
        let victim = self
            .entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.access_count
                    .cmp(&b.access_count)
                    .then(a.touched.cmp(&b.touched))
            })
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&victim);
        self.evictions += 1;
        Some(victim)
    }

    fn sweep_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.expirations += removed as u64;
        removed
    }
}

/// Bounded in-memory cache with TTL expiry and LFU/LRU hybrid eviction
pub struct LocalCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    options: CacheOptions,
    created_at: DateTime<Utc>,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(options: CacheOptions) -> Self {
        let options = CacheOptions {
            max_size: options.max_size.max(1),
            ..options
        };

        Self {
            state: Arc::new(Mutex::new(CacheState::new())),
            options,
            created_at: Utc::now(),
            cleanup_task: Mutex::new(None),
        }
    }

    /// Cache with the given capacity and no default TTL
    pub fn with_capacity(max_size: usize) -> Self {
        Self::new(CacheOptions {
            max_size,
            default_ttl: None,
            ..CacheOptions::default()
        })
    }

    pub fn max_size(&self) -> usize {
        self.options.max_size
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.options.default_ttl
    }

    /// Insert or overwrite a value
    ///
    /// `ttl` of `None` falls back to the configured default TTL; with no
    /// default the entry never expires and only leaves by eviction.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let ttl = ttl.or(self.options.default_ttl);
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.options.max_size {
            if state.evict_one().is_some() {
                trace!("Cache full ({} entries), evicted one entry", self.options.max_size);
            }
        }

        let touched = state.tick();
        state
            .entries
            .insert(key, CacheEntry::new(value, now, ttl, touched));
    }

    /// Look up a value, recording the access
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.presence(key, now) {
            Presence::Absent => {
                state.misses += 1;
                None
            }
            Presence::Expired => None,
            Presence::Live => {
                let touched = state.tick();
                let entry = state.entries.get_mut(key)?;
                entry.touch(now, touched);
                state.hits += 1;
                Some(entry.value.clone())
            }
        }
    }

    /// Existence check; applies lazy expiry but records no access
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.state.lock();
        matches!(guard.presence(key, Instant::now()), Presence::Live)
    }

    /// Remove one entry, returning whether it existed
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Entry count, including expired entries that have not been touched or swept
    pub fn size(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Remove all expired entries now
    pub fn cleanup(&self) -> usize {
        let removed = self.state.lock().sweep_expired(Instant::now());
        if removed > 0 {
            debug!("Cache cleanup removed {} expired entries", removed);
        }
        removed
    }

    /// Remove every entry whose key matches the predicate
    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let mut guard = self.state.lock();
        let before = guard.entries.len();
        guard.entries.retain(|key, _| !predicate(key));
        before - guard.entries.len()
    }

    pub fn stats(&self) -> CacheStats<K> {
        let guard = self.state.lock();
        let size = guard.entries.len();

        let average_access_count = if size == 0 {
            0.0
        } else {
            let total: u64 = guard.entries.values().map(|e| e.access_count).sum();
            total as f64 / size as f64
        };

        let mut ranked: Vec<(&K, &CacheEntry<V>)> = guard.entries.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.access_count
                .cmp(&a.access_count)
                .then(b.touched.cmp(&a.touched))
        });
        let top_keys = ranked
            .into_iter()
            .take(TOP_KEYS_LIMIT)
            .map(|(key, _)| key.clone())
            .collect();

        CacheStats {
            size,
            max_size: self.options.max_size,
            hits: guard.hits,
            misses: guard.misses,
            hit_rate: hit_rate(guard.hits, guard.misses),
            expirations: guard.expirations,
            evictions: guard.evictions,
            average_access_count,
            top_keys,
            created_at: self.created_at,
        }
    }

    pub async fn set_async(&self, key: K, value: V, ttl: Option<Duration>) {
        self.set(key, value, ttl)
    }

    pub async fn get_async<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key)
    }

    pub async fn has_async<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.has(key)
    }

    pub async fn delete_async<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.delete(key)
    }

    pub async fn clear_async(&self) {
        self.clear()
    }

    pub async fn cleanup_async(&self) -> usize {
        self.cleanup()
    }
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Start the periodic sweep at the configured interval
    ///
    /// Returns false when no interval is configured, no tokio runtime is
    /// available, or a sweep task is already running.
    pub fn start_cleanup(&self) -> bool {
        match self.options.cleanup_interval {
            Some(interval) => self.start_cleanup_every(interval),
            None => {
                debug!("No cleanup interval configured, periodic sweep not started");
                false
            }
        }
    }

    /// Start the periodic sweep at an explicit interval
    pub fn start_cleanup_every(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            warn!("Refusing to start cache sweep with a zero interval");
            return false;
        }

        let mut slot = self.cleanup_task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime available, periodic cache sweep not started");
                return false;
            }
        };

        // The task holds only a weak reference so a dropped cache ends it.
        let weak: Weak<Mutex<CacheState<K, V>>> = Arc::downgrade(&self.state);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(state) = weak.upgrade() else {
                    break;
                };
                let removed = state.lock().sweep_expired(Instant::now());
                if removed > 0 {
                    debug!("Periodic cache sweep removed {} expired entries", removed);
                }
            }
        });

        debug!("Started periodic cache sweep every {:?}", interval);
        *slot = Some(task);
        true
    }
}

impl<K, V> LocalCache<K, V> {
    /// Stop the periodic sweep; safe to call repeatedly
    pub fn destroy(&self) {
        if let Some(task) = self.cleanup_task.lock().take() {
            task.abort();
            debug!("Stopped periodic cache sweep");
        }
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.cleanup_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<K, V> Drop for LocalCache<K, V> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<K, V> std::fmt::Debug for LocalCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("options", &self.options)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
