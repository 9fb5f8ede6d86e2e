//! Query descriptor registry and the data-access seam.
//!
//! The original adapter resolved query names through attribute reflection
//! over a name-to-SQL dict. Here the registry is an explicit mapping from
//! command name to a typed descriptor, resolved by direct lookup with a
//! clear "unknown command" error; actually executing the SQL belongs to
//! the integration layer behind [`ForumBackend`].

use std::collections::BTreeMap;
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{PhpbbError, Result};

/// What shape of result a command produces.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum QueryOperation {
    /// Many rows, with skip/limit pagination.
    Fetch,
    /// A single optional row.
    Get,
    /// An existence check collapsed to a boolean.
    Has,
    /// A mutation; the result is a status line.
    Set,
}

/// One prepared statement: name, result shape, SQL template.
///
/// Templates carry a `{TABLE_PREFIX}` placeholder and named `%(param)s`
/// markers in the phpBB style; [`QueryDescriptor::render`] resolves the
/// prefix, parameter binding stays with the driver.
#[derive(Debug, Clone, Copy)]
pub struct QueryDescriptor {
    pub name: &'static str,
    pub operation: QueryOperation,
    pub sql: &'static str,
}

impl QueryDescriptor {
    /// Substitutes the table prefix into the SQL template.
    #[must_use]
    pub fn render(&self, table_prefix: &str) -> String {
        self.sql.replace("{TABLE_PREFIX}", table_prefix)
    }
}

/// The phpBB 3.1 statement set.
static STATEMENTS: Lazy<HashMap<&'static str, QueryDescriptor>> = Lazy::new(|| {
    let descriptors = [
        QueryDescriptor {
            name: "get_autologin",
            operation: QueryOperation::Get,
            sql: "SELECT u.* \
                  FROM {TABLE_PREFIX}users u, {TABLE_PREFIX}sessions_keys k \
                  WHERE u.user_type IN (0, 3) \
                  AND k.user_id = u.user_id \
                  AND k.key_id = %(key)s",
        },
        QueryDescriptor {
            name: "get_session",
            operation: QueryOperation::Get,
            sql: "SELECT * \
                  FROM {TABLE_PREFIX}sessions s, {TABLE_PREFIX}users u \
                  WHERE s.session_id = %(session_id)s \
                  AND s.session_user_id = u.user_id",
        },
        QueryDescriptor {
            name: "get_user",
            operation: QueryOperation::Get,
            sql: "SELECT * FROM {TABLE_PREFIX}users WHERE user_id = %(user_id)s",
        },
        QueryDescriptor {
            name: "has_membership",
            operation: QueryOperation::Has,
            sql: "SELECT ug.group_id \
                  FROM {TABLE_PREFIX}user_group ug \
                  WHERE ug.user_id = %(user_id)s \
                  AND ug.group_id = %(group_id)s \
                  AND ug.user_pending = 0 \
                  LIMIT 1",
        },
        QueryDescriptor {
            name: "has_membership_resolve",
            operation: QueryOperation::Has,
            sql: "SELECT ug.group_id \
                  FROM {TABLE_PREFIX}user_group ug, {TABLE_PREFIX}groups g \
                  WHERE ug.user_id = %(user_id)s \
                  AND g.group_name = %(group_name)s \
                  AND ug.group_id = g.group_id \
                  AND ug.user_pending = 0 \
                  LIMIT 1",
        },
        QueryDescriptor {
            name: "fetch_acl_options",
            operation: QueryOperation::Fetch,
            sql: "SELECT * FROM {TABLE_PREFIX}acl_options ORDER BY auth_option_id",
        },
        QueryDescriptor {
            name: "get_unread_notifications_count",
            operation: QueryOperation::Get,
            sql: "SELECT COUNT(n.*) AS num \
                  FROM {TABLE_PREFIX}notifications n, {TABLE_PREFIX}notification_types nt \
                  WHERE n.user_id = %(user_id)s \
                  AND nt.notification_type_id = n.notification_type_id \
                  AND nt.notification_type_enabled = 1 \
                  AND n.notification_read = 0",
        },
    ];
    descriptors
        .into_iter()
        .map(|descriptor| (descriptor.name, descriptor))
        .collect()
});

/// Looks up the descriptor for `command`.
///
/// # Errors
/// [`PhpbbError::UnknownCommand`] when no statement is registered under
/// that name.
pub fn resolve(command: &str) -> Result<&'static QueryDescriptor> {
    STATEMENTS
        .get(command)
        .ok_or_else(|| PhpbbError::UnknownCommand {
            command: command.to_string(),
        })
}

/// Builds the versioned cache key for a cached command invocation:
/// `name:arg1value1:arg2value2` over sorted argument names, so the key is
/// deterministic for equal argument sets.
#[must_use]
pub fn cache_key(command: &str, args: &BTreeMap<String, String>) -> String {
    let mut key = String::from(command);
    for (name, value) in args {
        key.push(':');
        key.push_str(name);
        key.push_str(value);
    }
    key
}

/// Execution seam the integration layer implements against a real
/// database driver. Rows cross the boundary as JSON objects so the core
/// stays driver-agnostic.
pub trait ForumBackend {
    /// Runs a `fetch` statement, honoring skip/limit pagination.
    fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        args: &BTreeMap<String, String>,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<serde_json::Value>>;

    /// Runs a `get` statement; `None` when no row matched.
    fn get(
        &self,
        descriptor: &QueryDescriptor,
        args: &BTreeMap<String, String>,
    ) -> Result<Option<serde_json::Value>>;

    /// Runs a `has` statement, collapsing the result to row-existence.
    fn has(&self, descriptor: &QueryDescriptor, args: &BTreeMap<String, String>) -> Result<bool>;

    /// Runs a `set` statement, returning the driver's status line.
    fn set(&self, descriptor: &QueryDescriptor, args: &BTreeMap<String, String>)
    -> Result<String>;
}
