//! Shared constants for the phpBB3 permission format and cache lifetimes.

/// Number of base-36 characters in one packed permission chunk.
pub const CHUNK_WIDTH: usize = 6;

/// Number of binary digits one unpacked chunk expands to.
pub const GROUP_BITS: usize = 31;

/// Forum-id key reserved for global (non-forum-specific) permissions.
pub const GLOBAL_FORUM: &str = "0";

/// Cache key under which the shared ACL option index is stored.
pub const ACL_OPTIONS_CACHE_KEY: &str = "_acl_options";

/// Lifetime of the cached ACL option index, in seconds.
pub const ACL_OPTIONS_CACHE_TTL: u64 = 3600;

/// Lifetime of the cached anonymous user row, in seconds.
pub const ANONYMOUS_CACHE_TTL: u64 = 3600 * 24;

/// Lifetime of side-channel session data blobs, in seconds.
pub const SESSION_DATA_TTL: u64 = 3600 * 3 / 2;

/// phpBB reserves user id 1 for the anonymous guest account.
pub const ANONYMOUS_USER_ID: i64 = 1;

/// Cache key prefix for side-channel session data blobs.
pub const SESSION_DATA_KEY_PREFIX: &str = "sessions_";

/// Number of hex characters kept from a link hash digest.
pub const LINK_HASH_LEN: usize = 8;
