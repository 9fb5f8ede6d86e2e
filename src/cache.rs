//! Cache store seam and the ACL options cache gate.
//!
//! The option index is expensive to rebuild (a full `acl_options` scan),
//! shared by every session, and changes rarely. The gate keeps it behind a
//! pluggable [`CacheStore`] so the full build runs at most once per TTL
//! window system-wide. Store failures are never allowed to break privilege
//! evaluation: the gate logs them and falls back to rebuilding from the
//! source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::acl::build_option_index;
use crate::constants::{ACL_OPTIONS_CACHE_KEY, ACL_OPTIONS_CACHE_TTL};
use crate::error::Result;
use crate::types::{AclOptionIndex, AclOptionRow};

/// Narrow get/set view of whatever cache backs the deployment.
///
/// Values are JSON strings; TTL of `None` means the backend's default
/// lifetime. Implementations are expected to be shared across request
/// contexts, so both operations take `&self`.
pub trait CacheStore {
    /// Fetches a previously stored value, `None` when absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value, replacing any previous entry under `key`.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
}

/// Source of the full, unpaged, ordered `acl_options` row list.
pub trait AclOptionSource {
    /// Fetches every option row, ordered by ascending `auth_option_id`.
    fn fetch_acl_options(&self) -> Result<Vec<AclOptionRow>>;
}

/// Read-through gate in front of [`build_option_index`].
///
/// A cached non-empty index is reused as-is. On a miss the full row list
/// is fetched, indexed, and written back under
/// [`ACL_OPTIONS_CACHE_KEY`] with [`ACL_OPTIONS_CACHE_TTL`]. Concurrent
/// rebuilds compute identical indices, so last-writer-wins in the store is
/// harmless.
///
/// # Errors
/// Only source failures propagate: without option rows there is no safe
/// answer to any privilege query. Cache get, parse, and set failures are
/// logged and recovered by rebuilding.
pub fn load_option_index(
    source: &dyn AclOptionSource,
    cache: &dyn CacheStore,
) -> Result<AclOptionIndex> {
    match cache.get(ACL_OPTIONS_CACHE_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<AclOptionIndex>(&raw) {
            Ok(index) if !index.is_empty() => {
                tracing::debug!(
                    local = index.local_len(),
                    global = index.global_len(),
                    "acl option index served from cache"
                );
                return Ok(index);
            }
            Ok(_) => {
                tracing::warn!("cached acl option index is empty; rebuilding");
            }
            Err(error) => {
                tracing::warn!(%error, "cached acl option index is corrupt; rebuilding");
            }
        },
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(%error, "cache store get failed; rebuilding acl option index");
        }
    }

    let rows = source.fetch_acl_options()?;
    let index = build_option_index(&rows);
    log::info!(
        "rebuilt acl option index from {} rows ({} local, {} global)",
        rows.len(),
        index.local_len(),
        index.global_len()
    );

    match serde_json::to_string(&index) {
        Ok(raw) => {
            if let Err(error) = cache.set(
                ACL_OPTIONS_CACHE_KEY,
                &raw,
                Some(Duration::from_secs(ACL_OPTIONS_CACHE_TTL)),
            ) {
                tracing::warn!(%error, "cache store set failed; index stays unshared this window");
            }
        }
        Err(error) => {
            tracing::warn!(%error, "acl option index did not serialize; not cached");
        }
    }

    Ok(index)
}

/// In-process cache store with per-entry expiry.
///
/// The default collaborator for single-process deployments and the test
/// double everywhere else; a memcached-style store slots in through the
/// same trait.
#[derive(Debug, Default)]
pub struct SimpleCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl SimpleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for SimpleCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(key) {
            Some(entry) => {
                if entry.expires_at.is_some_and(|at| at <= Instant::now()) {
                    entries.remove(key);
                    return Ok(None);
                }
                Ok(Some(entry.value.clone()))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
