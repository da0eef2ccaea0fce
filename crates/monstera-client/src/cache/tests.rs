//! Unit tests for the client cache

use super::*;
use crate::interceptors::InterceptorChain;
use monstera_config::{ConfigLayering, ConfigOverrides};

fn test_client(preset: Preset) -> Arc<ApiClient> {
    let resolved = ConfigLayering::default()
        .resolve(preset, None, None, &ConfigOverrides::default())
        .unwrap();
    Arc::new(ApiClient::new(resolved, InterceptorChain::new()).unwrap())
}

fn pause() {
    std::thread::sleep(Duration::from_millis(2));
}

#[test]
fn test_cache_key_rendering() {
    assert_eq!(CacheKey::new(Preset::Default).to_string(), "default");
    assert_eq!(CacheKey::new(Preset::Default).version("v2").to_string(), "default@v2");
    assert_eq!(
        CacheKey::new(Preset::Auth)
            .environment(Environment::Staging)
            .to_string(),
        "auth/staging"
    );
    assert_eq!(
        CacheKey::new(Preset::Auth)
            .version("v3")
            .environment(Environment::Production)
            .scope("token-1f")
            .to_string(),
        "auth@v3/production#token-1f"
    );
}

#[test]
fn test_get_and_put() {
    let cache = ClientCache::new();
    let client = test_client(Preset::Default);

    assert!(cache.get("default").is_none());
    cache.put("default", Arc::clone(&client));

    let cached = cache.get("default").unwrap();
    assert!(Arc::ptr_eq(&cached, &client));

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.total_hits, 1);
    assert_eq!(stats.total_misses, 1);
    assert_eq!(stats.average_hit_rate, 0.5);
}

#[test]
fn test_empty_stats() {
    let stats = ClientCache::new().stats();
    assert_eq!(stats, CacheStats::default());
    assert_eq!(stats.average_hit_rate, 0.0);
}

#[test]
fn test_hits_are_counted_per_entry() {
    let cache = ClientCache::new();
    cache.put("admin", test_client(Preset::Admin));
    cache.get("admin");
    cache.get("admin");

    let entries = cache.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "admin");
    assert_eq!(entries[0].preset, Preset::Admin);
    assert_eq!(entries[0].hits, 2);
    assert!(entries[0].last_accessed >= entries[0].created_at);
}

#[test]
fn test_peek_does_not_count() {
    let cache = ClientCache::new();
    cache.put("public", test_client(Preset::Public));
    assert!(cache.peek("public").is_some());
    assert!(cache.peek("missing").is_none());
    assert_eq!(cache.stats().total_hits, 0);
    assert_eq!(cache.stats().total_misses, 0);
}

#[test]
fn test_least_recently_used_is_evicted() {
    let cache = ClientCache::with_capacity(2);
    cache.put("default", test_client(Preset::Default));
    pause();
    cache.put("auth", test_client(Preset::Auth));
    pause();

    // Refresh "default" so "auth" becomes the oldest
    cache.get("default");
    pause();
    cache.put("admin", test_client(Preset::Admin));

    assert_eq!(cache.len(), 2);
    assert!(cache.contains("default"));
    assert!(cache.contains("admin"));
    assert!(!cache.contains("auth"));
}

#[test]
fn test_replacing_existing_key_does_not_evict() {
    let cache = ClientCache::with_capacity(2);
    cache.put("default", test_client(Preset::Default));
    cache.put("auth", test_client(Preset::Auth));
    cache.put("auth", test_client(Preset::Auth));
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("default"));
}

#[test]
fn test_get_or_try_insert_with_builds_once() {
    let cache = ClientCache::new();
    let mut builds = 0;

    let first = cache
        .get_or_try_insert_with("batch", || {
            builds += 1;
            Ok(test_client(Preset::Batch))
        })
        .unwrap();
    let second = cache
        .get_or_try_insert_with("batch", || {
            builds += 1;
            Ok(test_client(Preset::Batch))
        })
        .unwrap();

    assert_eq!(builds, 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_builder_may_use_the_cache() {
    let cache = ClientCache::new();
    let outer = cache
        .get_or_try_insert_with("auth", || {
            // Would deadlock if the entry lock were held while building
            let nested = cache.get_or_try_insert_with("default", || Ok(test_client(Preset::Default)))?;
            assert_eq!(nested.preset(), Preset::Default);
            Ok(test_client(Preset::Auth))
        })
        .unwrap();

    assert_eq!(outer.preset(), Preset::Auth);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_concurrent_inserts_respect_capacity() {
    let cache = Arc::new(ClientCache::with_capacity(4));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for j in 0..5 {
                    let key = format!("client-{}-{}", i, j);
                    cache
                        .get_or_try_insert_with(&key, || Ok(test_client(Preset::Realtime)))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 4, "cache grew to {}", cache.len());
}

#[test]
fn test_concurrent_lookups_share_one_instance() {
    let cache = Arc::new(ClientCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                cache
                    .get_or_try_insert_with("admin", || Ok(test_client(Preset::Admin)))
                    .unwrap()
            })
        })
        .collect();
    let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_failed_build_is_not_cached() {
    let cache = ClientCache::new();
    let result = cache.get_or_try_insert_with("upload", || {
        Err(monstera_core::MonsteraError::ConfigValidation {
            field: "base_url".to_string(),
            reason: "missing".to_string(),
        })
    });
    assert!(result.is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_remove_and_clear() {
    let cache = ClientCache::new();
    cache.put("default", test_client(Preset::Default));
    cache.put("realtime", test_client(Preset::Realtime));
    cache.get("default");

    assert!(cache.remove("realtime"));
    assert!(!cache.remove("realtime"));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats(), CacheStats::default());
}

#[test]
fn test_cleanup_older_than() {
    let cache = ClientCache::new();
    cache.put("default", test_client(Preset::Default));
    pause();
    pause();

    assert_eq!(cache.cleanup_older_than(Duration::from_secs(60)), 0);
    assert_eq!(cache.cleanup_older_than(Duration::from_millis(1)), 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_spawn_cleanup_stops_on_cancel() {
    let cache = Arc::new(ClientCache::new());
    cache.put("default", test_client(Preset::Default));

    let cancel = CancellationToken::new();
    let handle = cache.spawn_cleanup(Duration::from_millis(10), Duration::from_millis(1), cancel.clone());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(cache.is_empty());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("cleanup task should stop")
        .unwrap();
}
