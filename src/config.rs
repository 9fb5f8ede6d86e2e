//! Adapter configuration with the stock phpBB defaults.
//!
//! Everything here deserializes from whatever configuration source the
//! embedding application uses; absent fields fall back to the same
//! defaults the original adapter shipped with.

use serde::{Deserialize, Serialize};

use crate::error::{PhpbbError, Result};

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub table_prefix: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            database: "phpbb3".to_string(),
            user: "phpbb3".to_string(),
            password: String::new(),
            table_prefix: "phpbb_".to_string(),
        }
    }
}

/// Which cache store backs sessions and the option index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackendKind {
    #[default]
    Simple,
    Memcached,
}

/// Session/cache backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct SessionBackendConfig {
    #[serde(rename = "type")]
    pub kind: SessionBackendKind,
    pub key_prefix: String,
    pub servers: Vec<String>,
}

impl Default for SessionBackendConfig {
    fn default() -> Self {
        Self {
            kind: SessionBackendKind::Simple,
            key_prefix: "phpbb3".to_string(),
            servers: vec!["127.0.0.1:11211".to_string()],
        }
    }
}

/// Top-level adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct PhpbbConfig {
    /// Database driver the integration layer should load.
    pub driver: String,
    /// Targeted phpBB schema version.
    pub version: String,
    /// Cookie name prefix the forum issues its `sid` cookie under.
    pub cookie_name: String,
    pub db: DbConfig,
    pub session_backend: SessionBackendConfig,
}

impl Default for PhpbbConfig {
    fn default() -> Self {
        Self {
            driver: "psycopg2".to_string(),
            version: "3.1".to_string(),
            cookie_name: "phpbb3_".to_string(),
            db: DbConfig::default(),
            session_backend: SessionBackendConfig::default(),
        }
    }
}

impl PhpbbConfig {
    /// Known database drivers.
    pub const KNOWN_DRIVERS: &'static [&'static str] = &["psycopg2"];

    /// Rejects configurations naming a driver the adapter cannot load.
    ///
    /// # Errors
    /// [`PhpbbError::UnknownDriver`] for anything outside
    /// [`Self::KNOWN_DRIVERS`].
    pub fn validate(&self) -> Result<()> {
        if !Self::KNOWN_DRIVERS.contains(&self.driver.as_str()) {
            return Err(PhpbbError::UnknownDriver {
                driver: self.driver.clone(),
            });
        }
        Ok(())
    }

    /// Full name of the session-id cookie.
    #[must_use]
    pub fn sid_cookie(&self) -> String {
        format!("{}sid", self.cookie_name)
    }
}
