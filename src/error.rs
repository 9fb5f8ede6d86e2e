//! Crate-wide error type and `Result` alias.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PhpbbError>;

/// Errors surfaced by the ACL engine and its collaborator seams.
///
/// Privilege evaluation itself never returns these: evaluation is
/// fail-closed and resolves recoverable conditions to "permission denied".
/// Errors appear at decode time, at the cache/backend seams, and when a
/// caller names a query command that does not exist.
#[derive(Debug, Error)]
pub enum PhpbbError {
    /// A permission line contained characters outside `0-9a-z`. The whole
    /// decode fails; a partially decoded ACL is a security hazard.
    #[error("malformed base-36 permission chunk {chunk:?} at forum index {forum}")]
    MalformedPermissionChunk { chunk: String, forum: usize },

    /// A permission line was not valid ASCII and could not be chunked.
    #[error("permission line at forum index {forum} is not ASCII")]
    NonAsciiPermissionLine { forum: usize },

    /// A query command name has no registered descriptor.
    #[error("unknown query command {command:?}")]
    UnknownCommand { command: String },

    /// The option source could not produce the ACL option rows.
    #[error("acl option source failed: {reason}")]
    OptionSource { reason: String },

    /// The cache store rejected a get or set.
    #[error("cache store failed: {reason}")]
    CacheStore { reason: String },

    /// The backend seam reported a failure executing a rendered query.
    #[error("backend query failed: {reason}")]
    Backend { reason: String },

    /// Configuration named a driver this crate does not know.
    #[error("unknown database driver {driver:?}")]
    UnknownDriver { driver: String },

    /// JSON (de)serialization at the cache boundary failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
