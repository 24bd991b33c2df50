//! Tests for the cache engine and factory

use super::*;
use crate::config::CacheConfig;
use crate::error::CacheError;
use std::thread::sleep;
use std::time::Duration;

fn cache(max_size: usize) -> LocalCache<String, u32> {
    LocalCache::with_capacity(max_size)
}

#[test]
fn test_set_then_get() {
    let cache = cache(4);
    cache.set("a".to_string(), 1, None);

    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("missing"), None);
    assert_eq!(cache.size(), 1);
}

#[test]
fn test_overwrite_resets_access_count() {
    let cache = cache(2);
    cache.set("a".to_string(), 1, None);
    cache.get("a");
    cache.get("a");
    cache.set("a".to_string(), 2, None);
    cache.set("b".to_string(), 3, None);
    cache.get("b");

    // "a" was overwritten so its access count is back to zero and it loses
    cache.set("c".to_string(), 4, None);
    assert!(!cache.has("a"));
    assert!(cache.has("b"));
    assert!(cache.has("c"));
}

#[test]
fn test_size_never_exceeds_capacity() {
    let cache = cache(5);
    for i in 0..200u32 {
        cache.set(format!("key-{}", i % 17), i, None);
        if i % 3 == 0 {
            cache.get(&format!("key-{}", i % 7));
        }
        assert!(cache.size() <= 5, "size {} exceeded capacity", cache.size());
    }
    assert!(cache.stats().evictions > 0);
}

#[test]
fn test_evicts_oldest_when_nothing_accessed() {
    let cache = cache(3);
    cache.set("first".to_string(), 1, None);
    cache.set("second".to_string(), 2, None);
    cache.set("third".to_string(), 3, None);

    cache.set("fourth".to_string(), 4, None);

    assert!(!cache.has("first"));
    assert!(cache.has("second"));
    assert!(cache.has("third"));
    assert!(cache.has("fourth"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_evicts_less_accessed_even_if_newer() {
    let cache = cache(2);
    cache.set("older".to_string(), 1, None);
    cache.set("newer".to_string(), 2, None);

    for _ in 0..4 {
        cache.get("older");
    }
    cache.get("newer");

    cache.set("third".to_string(), 3, None);

    assert!(cache.has("older"));
    assert!(!cache.has("newer"));
    assert!(cache.has("third"));
}

#[test]
fn test_overwriting_existing_key_in_full_cache_does_not_evict() {
    let cache = cache(2);
    cache.set("a".to_string(), 1, None);
    cache.set("b".to_string(), 2, None);
    cache.set("a".to_string(), 10, None);

    assert_eq!(cache.size(), 2);
    assert_eq!(cache.get("a"), Some(10));
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_ttl_expiry_on_get() {
    let cache = cache(4);
    cache.set("k".to_string(), 7, Some(Duration::from_millis(30)));
    assert_eq!(cache.get("k"), Some(7));

    sleep(Duration::from_millis(60));

    assert_eq!(cache.get("k"), None);
    let stats = cache.stats();
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.size, 0);
}

#[test]
fn test_entries_without_ttl_do_not_expire() {
    let cache = cache(4);
    cache.set("forever".to_string(), 1, None);
    sleep(Duration::from_millis(20));
    assert_eq!(cache.cleanup(), 0);
    assert_eq!(cache.get("forever"), Some(1));
}

#[test]
fn test_default_ttl_applies_when_none_given() {
    let cache: LocalCache<String, u32> = LocalCache::new(CacheOptions {
        max_size: 4,
        default_ttl: Some(Duration::from_millis(20)),
        cleanup_interval: None,
    });
    cache.set("k".to_string(), 1, None);
    sleep(Duration::from_millis(40));
    assert!(!cache.has("k"));
}

#[test]
fn test_has_applies_expiry_without_counting_access() {
    let cache = cache(4);
    cache.set("live".to_string(), 1, None);
    cache.set("dying".to_string(), 2, Some(Duration::from_millis(10)));

    assert!(cache.has("live"));
    assert!(!cache.has("absent"));

    sleep(Duration::from_millis(30));
    assert!(!cache.has("dying"));

    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.average_access_count, 0.0);
}

#[test]
fn test_hit_rate() {
    let cache = cache(4);
    assert_eq!(cache.stats().hit_rate, 0.0);

    cache.set("a".to_string(), 1, None);
    cache.get("a");
    cache.get("a");
    cache.get("x");
    cache.get("y");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hit_rate, 50.0);
}

#[test]
fn test_stats_top_keys_and_average() {
    let cache = cache(20);
    for i in 0..12u32 {
        cache.set(format!("k{i}"), i, None);
    }
    for _ in 0..3 {
        cache.get("k5");
    }
    cache.get("k9");

    let stats = cache.stats();
    assert_eq!(stats.top_keys.len(), TOP_KEYS_LIMIT);
    assert_eq!(stats.top_keys[0], "k5");
    assert_eq!(stats.top_keys[1], "k9");
    assert!((stats.average_access_count - 4.0 / 12.0).abs() < f64::EPSILON);
    assert_eq!(stats.max_size, 20);
}

#[test]
fn test_cleanup_sweeps_only_expired() {
    let cache = cache(8);
    cache.set("a".to_string(), 1, Some(Duration::from_millis(10)));
    cache.set("b".to_string(), 2, Some(Duration::from_millis(10)));
    cache.set("c".to_string(), 3, None);

    // Expired entries still count until swept
    sleep(Duration::from_millis(30));
    assert_eq!(cache.size(), 3);

    assert_eq!(cache.cleanup(), 2);
    assert_eq!(cache.size(), 1);
    assert_eq!(cache.stats().expirations, 2);
}

#[test]
fn test_delete_and_clear() {
    let cache = cache(4);
    cache.set("a".to_string(), 1, None);
    cache.set("b".to_string(), 2, None);

    assert!(cache.delete("a"));
    assert!(!cache.delete("a"));
    assert_eq!(cache.size(), 1);

    cache.clear();
    assert_eq!(cache.size(), 0);
}

#[test]
fn test_invalidate_where() {
    let cache = cache(8);
    cache.set("/root/a".to_string(), 1, None);
    cache.set("/root/b".to_string(), 2, None);
    cache.set("/other/c".to_string(), 3, None);

    let removed = cache.invalidate_where(|key| key.starts_with("/root"));
    assert_eq!(removed, 2);
    assert!(cache.has("/other/c"));
}

#[test]
fn test_zero_capacity_is_raised_to_one() {
    let cache = cache(0);
    cache.set("a".to_string(), 1, None);
    cache.set("b".to_string(), 2, None);
    assert_eq!(cache.size(), 1);
    assert_eq!(cache.max_size(), 1);
}

#[tokio::test]
async fn test_async_twins_share_state() {
    let cache = cache(4);
    cache.set_async("a".to_string(), 1, None).await;

    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get_async("a").await, Some(1));
    assert!(cache.has_async("a").await);
    assert!(cache.delete_async("a").await);
    assert_eq!(cache.size(), 0);

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_periodic_cleanup_runs_and_stops() {
    let cache: LocalCache<String, u32> = LocalCache::new(CacheOptions {
        max_size: 8,
        default_ttl: None,
        cleanup_interval: Some(Duration::from_millis(10)),
    });
    cache.set("a".to_string(), 1, Some(Duration::from_millis(5)));

    assert!(cache.start_cleanup());
    assert!(cache.is_cleanup_running());
    // Second start is a no-op while the first task runs
    assert!(!cache.start_cleanup());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.stats().expirations, 1);

    cache.destroy();
    cache.destroy();
    tokio::task::yield_now().await;
    assert!(!cache.is_cleanup_running());
}

#[test]
fn test_cleanup_without_runtime_is_refused() {
    let cache = cache(4);
    assert!(!cache.start_cleanup_every(Duration::from_millis(10)));
    assert!(!cache.start_cleanup_every(Duration::ZERO));
    cache.destroy();
}

#[test]
fn test_provider_parsing() {
    assert_eq!("local".parse::<CacheProvider>().unwrap(), CacheProvider::Local);
    assert_eq!(" Redis ".parse::<CacheProvider>().unwrap(), CacheProvider::Redis);
    assert!(matches!(
        "memcached".parse::<CacheProvider>(),
        Err(CacheError::UnsupportedProvider { .. })
    ));
}

#[test]
fn test_factory_strict_local() {
    let config = CacheConfig {
        max_size: 3,
        ttl_ms: Some(1000),
        ..CacheConfig::default()
    };
    let cache: LocalCache<String, u32> = CacheFactory::build(&config).unwrap();
    assert_eq!(cache.max_size(), 3);
    assert_eq!(cache.default_ttl(), Some(Duration::from_secs(1)));
}

#[test]
fn test_factory_strict_rejects_redis() {
    let config = CacheConfig {
        provider: "redis".to_string(),
        ..CacheConfig::default()
    };
    let result: Result<LocalCache<String, u32>, _> = CacheFactory::build(&config);
    let err = result.unwrap_err();
    assert!(matches!(err, CacheError::NotImplemented { .. }));
    assert!(err.to_string().contains("not yet implemented"));
}

#[test]
fn test_factory_strict_rejects_unknown_and_zero_capacity() {
    let unknown = CacheConfig {
        provider: "dynamo".to_string(),
        ..CacheConfig::default()
    };
    let result: Result<LocalCache<String, u32>, _> = CacheFactory::build(&unknown);
    assert!(matches!(result, Err(CacheError::UnsupportedProvider { .. })));

    let zero = CacheConfig {
        max_size: 0,
        ..CacheConfig::default()
    };
    let result: Result<LocalCache<String, u32>, _> = CacheFactory::build(&zero);
    assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
}

#[test]
fn test_factory_best_effort_falls_back_from_redis() {
    let config = CacheConfig {
        provider: "redis".to_string(),
        max_size: 7,
        ttl_ms: Some(2500),
        ..CacheConfig::default()
    };
    let cache: LocalCache<String, u32> = CacheFactory::build_best_effort(&config).unwrap();
    assert_eq!(cache.max_size(), 7);
    assert_eq!(cache.default_ttl(), Some(Duration::from_millis(2500)));
}

#[test]
fn test_factory_best_effort_still_rejects_unknown() {
    let config = CacheConfig {
        provider: "dynamo".to_string(),
        ..CacheConfig::default()
    };
    let result: Result<LocalCache<String, u32>, _> = CacheFactory::build_best_effort(&config);
    assert!(matches!(result, Err(CacheError::UnsupportedProvider { .. })));
}

#[test]
#[serial_test::serial]
fn test_factory_from_env() {
    std::env::set_var(crate::config::ENV_CACHE_PROVIDER, "redis");
    std::env::set_var(crate::config::ENV_CACHE_MAX_SIZE, "11");

    let result: Result<LocalCache<String, u32>, _> = CacheFactory::from_env();

    std::env::remove_var(crate::config::ENV_CACHE_PROVIDER);
    std::env::remove_var(crate::config::ENV_CACHE_MAX_SIZE);

    assert_eq!(result.unwrap().max_size(), 11);
}
