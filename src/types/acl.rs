//! Data types for the phpBB3 ACL format: option rows, the scoped option
//! index, and a user's decoded permission map.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::GLOBAL_FORUM;

/// One row of the `acl_options` table.
///
/// Rows arrive ordered by ascending `auth_option_id`; that order assigns
/// the bit positions in every user's packed permission blob, so it must be
/// preserved end to end.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AclOptionRow {
    pub auth_option_id: u32,
    pub auth_option: String,
    /// phpBB stores the scope flags as 0/1 integers.
    #[serde(deserialize_with = "bool_from_int", serialize_with = "int_from_bool")]
    pub is_local: bool,
    #[serde(deserialize_with = "bool_from_int", serialize_with = "int_from_bool")]
    pub is_global: bool,
}

impl AclOptionRow {
    #[must_use]
    pub fn new(
        auth_option_id: u32,
        auth_option: impl Into<String>,
        is_local: bool,
        is_global: bool,
    ) -> Self {
        Self {
            auth_option_id,
            auth_option: auth_option.into(),
            is_local,
            is_global,
        }
    }
}

fn bool_from_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u8::deserialize(deserializer)?;
    Ok(value != 0)
}

// serde's serialize_with contract requires the reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn int_from_bool<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

/// Dense option-name to bit-position mappings, one per scope.
///
/// Built once from the ordered option rows and read-only afterwards. The
/// index is shared across all sessions and lives in the cache store for
/// [`crate::constants::ACL_OPTIONS_CACHE_TTL`] seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct AclOptionIndex {
    pub(crate) local: HashMap<String, usize>,
    pub(crate) global: HashMap<String, usize>,
}

impl AclOptionIndex {
    /// Bit position of `option` within the global scope, if it has one.
    #[must_use]
    pub fn global_ordinal(&self, option: &str) -> Option<usize> {
        self.global.get(option).copied()
    }

    /// Bit position of `option` within the local scope, if it has one.
    #[must_use]
    pub fn local_ordinal(&self, option: &str) -> Option<usize> {
        self.local.get(option).copied()
    }

    /// True when neither scope maps any option.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }

    /// Number of options carrying the local flag.
    #[must_use]
    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    /// Number of options carrying the global flag.
    #[must_use]
    pub fn global_len(&self) -> usize {
        self.global.len()
    }
}

/// A user's decoded permissions: forum-id string to concatenated
/// bit-string, with `"0"` holding the global scope.
///
/// Owned by exactly one session context and dropped with it; nothing here
/// is shared between users.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct UserAcl {
    pub(crate) forums: HashMap<String, String>,
}

impl UserAcl {
    /// Bit-string for one forum, `None` when the blob had no line for it.
    #[must_use]
    pub fn bits(&self, forum_id: &str) -> Option<&str> {
        self.forums.get(forum_id).map(String::as_str)
    }

    /// Bit-string for the global scope, if present.
    #[must_use]
    pub fn global_bits(&self) -> Option<&str> {
        self.forums.get(GLOBAL_FORUM).map(String::as_str)
    }

    /// Number of forums (including the global sentinel) with decoded bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forums.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forums.is_empty()
    }

    pub(crate) fn insert(&mut self, forum_id: String, bits: String) {
        self.forums.insert(forum_id, bits);
    }
}
