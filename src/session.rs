//! Session value wrapper and the cache-backed session data store.
//!
//! The forum row hydrates the session as read-only properties; anything
//! the application writes on top is tracked by an explicit dirty flag and
//! persisted to the cache store as a JSON side-channel blob, keyed by the
//! phpBB session id. Collaborators (backend, cache) are passed in
//! explicitly rather than reached through ambient globals.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::backend::{ForumBackend, resolve};
use crate::cache::CacheStore;
use crate::constants::{
    ANONYMOUS_USER_ID, LINK_HASH_LEN, SESSION_DATA_KEY_PREFIX, SESSION_DATA_TTL,
};
use crate::error::Result;

/// Reference to a forum group, by id or by name.
#[derive(Debug, Clone, Copy)]
pub enum GroupRef<'a> {
    Id(i64),
    Name(&'a str),
}

/// One user's session: hydrated forum-row properties plus mutable
/// application data with dirty tracking.
#[derive(Debug)]
pub struct SessionData {
    values: HashMap<String, Value>,
    read_only: HashSet<String>,
    modified: bool,
    new: bool,
    // Results that must not repeat within one request but never persist.
    request_cache: RefCell<HashMap<String, Value>>,
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionData {
    /// An empty session that has not been hydrated from a forum row yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            read_only: HashSet::new(),
            modified: false,
            new: true,
            request_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Seeds the session with the user/session row fetched from the
    /// forum. Hydrated keys become read-only properties: writes to them
    /// still land but never mark the session dirty, since they are not
    /// ours to persist.
    pub fn hydrate(&mut self, row: HashMap<String, Value>) {
        self.read_only = row.keys().cloned().collect();
        self.values.extend(row);
        self.new = false;
    }

    /// Merges previously saved side-channel data without touching the
    /// dirty flag.
    pub fn restore(&mut self, data: HashMap<String, Value>) {
        self.values.extend(data);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.values.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|raw| raw.parse().ok()))
    }

    /// Stores a value. The session becomes dirty only when the value
    /// actually changed and the key is not a hydrated read-only property.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let changed = self.values.get(&key) != Some(&value);
        let writable = !self.read_only.contains(&key);
        self.values.insert(key, value);
        if writable {
            self.modified |= changed;
        }
    }

    /// Removes a key, always marking the session dirty.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.modified = true;
        self.values.remove(key)
    }

    /// Drops every value, marking the session dirty.
    pub fn clear(&mut self) {
        self.modified = true;
        self.values.clear();
    }

    /// Whether any writable value changed since hydration.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether this session was never hydrated from a forum row.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.new
    }

    /// The forum user id; the anonymous guest when absent or unparsable.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.get_i64("user_id").unwrap_or(ANONYMOUS_USER_ID)
    }

    /// Anyone above the reserved guest id counts as authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id() > ANONYMOUS_USER_ID
    }

    /// Tests group membership, by id or resolved by name.
    ///
    /// An id matching the session's own default `group_id` short-circuits
    /// without touching the backend.
    ///
    /// # Errors
    /// Propagates backend failures; membership is never guessed.
    pub fn is_member(&self, backend: &dyn ForumBackend, group: GroupRef<'_>) -> Result<bool> {
        let mut args = BTreeMap::new();
        args.insert("user_id".to_string(), self.user_id().to_string());

        match group {
            GroupRef::Id(group_id) => {
                if self.get_i64("group_id") == Some(group_id) {
                    return Ok(true);
                }
                args.insert("group_id".to_string(), group_id.to_string());
                backend.has(resolve("has_membership")?, &args)
            }
            GroupRef::Name(group_name) => {
                args.insert("group_name".to_string(), group_name.to_string());
                backend.has(resolve("has_membership_resolve")?, &args)
            }
        }
    }

    /// Number of unread notifications, fetched at most once per session
    /// object.
    ///
    /// # Errors
    /// Propagates backend failures on the first call.
    pub fn unread_notifications(&self, backend: &dyn ForumBackend) -> Result<i64> {
        const KEY: &str = "num_unread_notifications";

        if let Some(cached) = self.request_cache.borrow().get(KEY) {
            return Ok(cached.as_i64().unwrap_or(0));
        }

        let mut args = BTreeMap::new();
        args.insert("user_id".to_string(), self.user_id().to_string());
        let row = backend.get(resolve("get_unread_notifications_count")?, &args)?;
        let count = row
            .as_ref()
            .and_then(|row| row.get("num"))
            .and_then(Value::as_i64)
            .unwrap_or(0);

        self.request_cache
            .borrow_mut()
            .insert(KEY.to_string(), Value::from(count));
        Ok(count)
    }

    /// CSRF-style link hash: first 8 hex chars of
    /// `SHA-1(user_form_salt + link)`. Empty for anonymous users and for
    /// sessions without a form salt.
    #[must_use]
    pub fn link_hash(&self, link: &str) -> String {
        if !self.is_authenticated() {
            return String::new();
        }
        let Some(salt) = self.get_str("user_form_salt") else {
            return String::new();
        };

        let mut hasher = Sha1::new();
        hasher.update(salt.as_bytes());
        hasher.update(link.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..LINK_HASH_LEN].to_string()
    }

    /// The writable (non-hydrated) portion of the session, for
    /// persistence.
    #[must_use]
    pub fn writable_values(&self) -> HashMap<String, Value> {
        self.values
            .iter()
            .filter(|(key, _)| !self.read_only.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Persists the writable session portion as JSON blobs in the cache
/// store, keyed `sessions_<session_id>`.
pub struct SessionStore<'a> {
    cache: &'a dyn CacheStore,
}

impl<'a> SessionStore<'a> {
    #[must_use]
    pub fn new(cache: &'a dyn CacheStore) -> Self {
        Self { cache }
    }

    fn key(session_id: &str) -> String {
        format!("{SESSION_DATA_KEY_PREFIX}{session_id}")
    }

    /// Loads previously saved side-channel data. Absent, expired, or
    /// corrupt blobs all come back as an empty map; stale session junk
    /// must never block a login.
    #[must_use]
    pub fn load(&self, session_id: &str) -> HashMap<String, Value> {
        let raw = match self.cache.get(&Self::key(session_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(error) => {
                tracing::warn!(%error, "session data load failed; starting empty");
                return HashMap::new();
            }
        };
        match serde_json::from_str::<HashMap<String, Value>>(&raw) {
            Ok(data) => data,
            Err(error) => {
                tracing::warn!(%error, "session data blob is corrupt; starting empty");
                HashMap::new()
            }
        }
    }

    /// Saves the writable session portion when the session is dirty and
    /// was hydrated from a real forum row.
    ///
    /// # Errors
    /// Propagates cache and serialization failures; the caller decides
    /// whether losing session side-data is fatal for the request.
    pub fn save(&self, session_id: &str, session: &SessionData) -> Result<()> {
        if !session.is_modified() || session.is_new() {
            return Ok(());
        }
        let raw = serde_json::to_string(&session.writable_values())?;
        self.cache.set(
            &Self::key(session_id),
            &raw,
            Some(Duration::from_secs(SESSION_DATA_TTL)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrated() -> SessionData {
        let mut session = SessionData::new();
        session.hydrate(HashMap::from([
            ("user_id".to_string(), Value::from(42)),
            ("group_id".to_string(), Value::from(4)),
            ("username".to_string(), Value::from("alice")),
            ("user_form_salt".to_string(), Value::from("pepper")),
        ]));
        session
    }

    #[test]
    fn hydrated_properties_are_read_only_for_dirty_tracking() {
        let mut session = hydrated();
        assert!(!session.is_modified());

        session.set("username", Value::from("mallory"));
        assert!(!session.is_modified(), "hydrated keys never mark dirty");
        assert_eq!(session.get_str("username"), Some("mallory"));

        session.set("theme", Value::from("dark"));
        assert!(session.is_modified());
    }

    #[test]
    fn unchanged_writes_stay_clean() {
        let mut session = hydrated();
        session.restore(HashMap::from([("theme".to_string(), Value::from("dark"))]));
        session.set("theme", Value::from("dark"));
        assert!(!session.is_modified());
    }

    #[test]
    fn removals_always_mark_dirty() {
        let mut session = hydrated();
        session.remove("nonexistent");
        assert!(session.is_modified());
    }

    #[test]
    fn default_and_new_sessions_agree() {
        let session = SessionData::default();
        assert!(session.is_new());
        assert!(!session.is_modified());
        assert!(SessionData::new().is_new());
    }

    #[test]
    fn anonymous_session_is_not_authenticated() {
        let mut session = SessionData::new();
        assert!(!session.is_authenticated());
        session.hydrate(HashMap::from([(
            "user_id".to_string(),
            Value::from(ANONYMOUS_USER_ID),
        )]));
        assert!(!session.is_authenticated());
        assert!(hydrated().is_authenticated());
    }

    #[test]
    fn user_id_accepts_stringly_typed_rows() {
        let mut session = SessionData::new();
        session.hydrate(HashMap::from([(
            "user_id".to_string(),
            Value::from("42"),
        )]));
        assert_eq!(session.user_id(), 42);
    }

    #[test]
    fn link_hash_is_stable_and_truncated() {
        let session = hydrated();
        let hash = session.link_hash("viewtopic.php?t=1");
        assert_eq!(hash.len(), LINK_HASH_LEN);
        assert_eq!(hash, session.link_hash("viewtopic.php?t=1"));
        assert_ne!(hash, session.link_hash("viewtopic.php?t=2"));
    }

    #[test]
    fn link_hash_is_empty_for_anonymous() {
        let session = SessionData::new();
        assert_eq!(session.link_hash("index.php"), "");
    }

    #[test]
    fn writable_values_exclude_hydrated_columns() {
        let mut session = hydrated();
        session.set("theme", Value::from("dark"));
        let writable = session.writable_values();
        assert_eq!(writable.len(), 1);
        assert!(writable.contains_key("theme"));
    }
}
