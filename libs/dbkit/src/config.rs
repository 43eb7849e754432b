//! Database configuration types.
//!
//! These types are deserialized directly from the layered application
//! configuration (YAML file + `APP__` environment overrides).
//!
//! A connection is described either by a full `dsn` or by individual fields
//! (`engine`, `host`, `port`, `user`, `password`, `dbname`). When both are
//! present, individual fields override the matching DSN parts. SQLite files
//! may be given with `path` instead of a DSN.
//!
//! Secrets never need to live in the file: `password` and `dsn` accept
//! `${VAR}` references that are expanded from the process environment when the
//! handle is built.
//!
//! ## Conflict Detection
//!
//! [`crate::build_db_handle`] returns [`crate::DbError::ConfigConflict`] for:
//! - SQLite DSN combined with server fields (`host`/`port`)
//! - Server DSN combined with `path`
//! - `path` combined with `host`/`port`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::DbEngine;

/// Connection config for the application database.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DbConnConfig {
    // DSN-style (full, valid). Optional: can be absent and rely on fields.
    pub dsn: Option<String>,

    // Field-based style; any of these override DSN parts when present:
    pub engine: Option<DbEngine>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>, // literal password or ${VAR} for env expansion
    pub dbname: Option<String>,   // required for server-based DBs without a DSN
    #[serde(default)]
    pub params: Option<HashMap<String, String>>,

    // SQLite file path; relative paths are resolved by the caller against home_dir.
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub pool: Option<PoolCfg>,

    #[serde(default)]
    pub retry: Option<RetryCfg>,

    /// Upper bound for a single statement, including result transfer.
    #[serde(with = "humantime_serde", default)]
    pub statement_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolCfg {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde", default)]
    pub acquire_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: Option<bool>,
}

impl PoolCfg {
    /// Apply pool configuration to the `Any` pool builder.
    pub fn apply(&self, mut opts: sqlx::any::AnyPoolOptions) -> sqlx::any::AnyPoolOptions {
        if let Some(max_conns) = self.max_conns {
            opts = opts.max_connections(max_conns);
        }
        if let Some(min_conns) = self.min_conns {
            opts = opts.min_connections(min_conns);
        }
        if let Some(acquire_timeout) = self.acquire_timeout {
            opts = opts.acquire_timeout(acquire_timeout);
        }
        if let Some(idle_timeout) = self.idle_timeout {
            opts = opts.idle_timeout(Some(idle_timeout));
        }
        if let Some(max_lifetime) = self.max_lifetime {
            opts = opts.max_lifetime(Some(max_lifetime));
        }
        if let Some(test_before_acquire) = self.test_before_acquire {
            opts = opts.test_before_acquire(test_before_acquire);
        }
        opts
    }
}

/// Bounded retry for transient connection acquisition failures.
///
/// Statements are never retried; only getting a connection is.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryCfg {
    /// Total attempts including the first one. `1` disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled on every further attempt.
    #[serde(with = "humantime_serde", default = "default_initial_backoff")]
    pub initial_backoff: Duration,
    /// Ceiling for the doubled delay.
    #[serde(with = "humantime_serde", default = "default_max_backoff")]
    pub max_backoff: Duration,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
        }
    }
}

impl RetryCfg {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(200)
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(2)
}

/// Statement timeout applied when the config does not set one.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);
