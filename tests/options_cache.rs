//! Integration tests for the ACL options cache gate.
//! Tests: single build per cache window, fail-open on broken stores.

use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use phpbb_acl_core::{
    ACL_OPTIONS_CACHE_KEY, AclOptionRow, AclOptionSource, CacheStore, PhpbbError, Result,
    SimpleCache, load_option_index,
};

/// Routes the gate's recovery warnings through a test subscriber so
/// `RUST_LOG` surfaces them alongside failing assertions.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Option source that counts how often the full table scan runs.
struct CountingSource {
    rows: Vec<AclOptionRow>,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            rows: vec![
                AclOptionRow::new(1, "m_edit", false, true),
                AclOptionRow::new(2, "f_post", true, false),
            ],
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AclOptionSource for CountingSource {
    fn fetch_acl_options(&self) -> Result<Vec<AclOptionRow>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }
}

/// Cache store whose every operation fails.
struct BrokenCache;

impl CacheStore for BrokenCache {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(PhpbbError::CacheStore {
            reason: "connection refused".to_string(),
        })
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Err(PhpbbError::CacheStore {
            reason: "connection refused".to_string(),
        })
    }
}

struct FailingSource;

impl AclOptionSource for FailingSource {
    fn fetch_acl_options(&self) -> Result<Vec<AclOptionRow>> {
        Err(PhpbbError::OptionSource {
            reason: "database gone".to_string(),
        })
    }
}

#[test]
fn index_is_built_once_per_cache_window() {
    init_tracing();
    let source = CountingSource::new();
    let cache = SimpleCache::new();

    let first = load_option_index(&source, &cache).unwrap();
    let second = load_option_index(&source, &cache).unwrap();
    let third = load_option_index(&source, &cache).unwrap();

    assert_eq!(source.calls(), 1, "only the first load scans the table");
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(first.global_ordinal("m_edit"), Some(0));
    assert_eq!(first.local_ordinal("f_post"), Some(0));
}

#[test]
fn expired_cache_entry_triggers_a_rebuild() {
    init_tracing();
    let source = CountingSource::new();
    let cache = SimpleCache::new();

    load_option_index(&source, &cache).unwrap();
    // Simulate TTL expiry by replacing the entry with an already-expired one.
    let raw = cache.get(ACL_OPTIONS_CACHE_KEY).unwrap().unwrap();
    cache
        .set(ACL_OPTIONS_CACHE_KEY, &raw, Some(Duration::ZERO))
        .unwrap();

    load_option_index(&source, &cache).unwrap();
    assert_eq!(source.calls(), 2);
}

#[test]
fn corrupt_cache_entry_is_rebuilt_and_overwritten() {
    init_tracing();
    let source = CountingSource::new();
    let cache = SimpleCache::new();
    cache
        .set(ACL_OPTIONS_CACHE_KEY, "definitely not json", None)
        .unwrap();

    let index = load_option_index(&source, &cache).unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(index.global_ordinal("m_edit"), Some(0));

    // The corrupt blob was replaced; the next load is served from cache.
    load_option_index(&source, &cache).unwrap();
    assert_eq!(source.calls(), 1);
}

#[test]
fn empty_cached_index_is_not_trusted() {
    init_tracing();
    let source = CountingSource::new();
    let cache = SimpleCache::new();
    cache
        .set(ACL_OPTIONS_CACHE_KEY, r#"{"local":{},"global":{}}"#, None)
        .unwrap();

    let index = load_option_index(&source, &cache).unwrap();
    assert_eq!(source.calls(), 1);
    assert!(!index.is_empty());
}

#[test]
fn broken_cache_store_never_blocks_evaluation() {
    init_tracing();
    let source = CountingSource::new();

    let first = load_option_index(&source, &BrokenCache).unwrap();
    let second = load_option_index(&source, &BrokenCache).unwrap();

    // Every load rebuilds, but answers keep flowing.
    assert_eq!(source.calls(), 2);
    assert_eq!(first, second);
}

#[test]
fn option_source_failure_propagates() {
    init_tracing();
    let err = load_option_index(&FailingSource, &SimpleCache::new()).unwrap_err();
    assert!(matches!(err, PhpbbError::OptionSource { .. }));
}
