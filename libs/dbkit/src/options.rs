//! Turning a [`DbConnConfig`] into a ready [`DbHandle`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use sqlx::any::AnyPoolOptions;

use crate::config::{DbConnConfig, DEFAULT_STATEMENT_TIMEOUT};
use crate::{DbEngine, DbError, DbHandle, Result};

/// Build a database handle from configuration.
///
/// The pool is created lazily: no connection is opened here, so an
/// unreachable database surfaces later as [`DbError::Connection`] from
/// [`DbHandle::acquire`] instead of aborting startup.
pub async fn build_db_handle(mut cfg: DbConnConfig) -> Result<DbHandle> {
    sqlx::any::install_default_drivers();

    // Expand environment variables in DSN, password and params
    if let Some(dsn) = &cfg.dsn {
        cfg.dsn = Some(expand_env_vars(dsn)?);
    }
    if let Some(password) = &cfg.password {
        cfg.password = Some(expand_env_vars(password)?);
    }
    if let Some(ref mut params) = cfg.params {
        for value in params.values_mut() {
            if value.contains("${") {
                *value = expand_env_vars(value)?;
            }
        }
    }

    validate_config_consistency(&cfg)?;

    let url = connection_url(&cfg)?;
    let engine = DbEngine::detect(&url)?;
    if let Some(expected) = cfg.engine {
        if expected != engine {
            return Err(DbError::ConfigConflict(format!(
                "engine '{}' does not match DSN scheme '{}'",
                expected.scheme(),
                engine.scheme()
            )));
        }
    }

    let mut pool_opts = cfg
        .pool
        .clone()
        .unwrap_or_default()
        .apply(AnyPoolOptions::new());

    // Every connection to an in-memory SQLite database is a fresh database;
    // pin the pool to one long-lived connection so data survives between calls.
    let in_memory = engine == DbEngine::Sqlite && is_sqlite_memory(&url);
    if in_memory {
        pool_opts = pool_opts
            .max_connections(1)
            .min_connections(0)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_opts
        .connect_lazy(&url)
        .map_err(|e| DbError::InvalidParameter(e.to_string()))?;

    let log_dsn = redact_credentials_in_dsn(Some(&url));
    let statement_timeout = cfg.statement_timeout.unwrap_or(DEFAULT_STATEMENT_TIMEOUT);
    tracing::debug!(
        dsn = %log_dsn,
        engine = engine.scheme(),
        ?statement_timeout,
        "Built database handle"
    );

    Ok(DbHandle::new(
        engine,
        pool,
        log_dsn,
        cfg.retry.unwrap_or_default(),
        statement_timeout,
        in_memory,
    ))
}

/// Compose the driver URL from either the DSN, the SQLite path or the
/// individual server fields.
fn connection_url(cfg: &DbConnConfig) -> Result<String> {
    if let Some(path) = &cfg.path {
        return sqlite_file_url(path);
    }

    match &cfg.dsn {
        Some(dsn) if dsn.trim_start().starts_with("sqlite:") => {
            if let Some(parent) = sqlite_path_from_dsn(dsn).as_deref().and_then(Path::parent) {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Ok(dsn.trim().to_string())
        }
        Some(dsn) => {
            let mut url = url::Url::parse(dsn)?;
            apply_server_fields(&mut url, cfg)?;
            Ok(url.to_string())
        }
        None => {
            let engine = cfg.engine.unwrap_or(DbEngine::MySql);
            if engine == DbEngine::Sqlite {
                return Err(DbError::InvalidParameter(
                    "SQLite connection requires either 'dsn' or 'path'".to_string(),
                ));
            }
            let host = cfg.host.as_deref().ok_or_else(|| {
                DbError::InvalidParameter("'host' is required without a DSN".to_string())
            })?;
            if cfg.dbname.is_none() {
                return Err(DbError::InvalidParameter(
                    "'dbname' is required without a DSN".to_string(),
                ));
            }
            let mut url = url::Url::parse(&format!("{}://{}", engine.scheme(), host))?;
            apply_server_fields(&mut url, cfg)?;
            Ok(url.to_string())
        }
    }
}

/// Individual fields override the matching URL parts.
fn apply_server_fields(url: &mut url::Url, cfg: &DbConnConfig) -> Result<()> {
    let invalid = |what: &str| DbError::InvalidParameter(format!("cannot set {what} on DSN"));

    if let Some(host) = &cfg.host {
        url.set_host(Some(host))?;
    }
    if let Some(port) = cfg.port {
        url.set_port(Some(port)).map_err(|_| invalid("port"))?;
    }
    if let Some(user) = &cfg.user {
        url.set_username(user).map_err(|_| invalid("user"))?;
    }
    if let Some(password) = &cfg.password {
        url.set_password(Some(password))
            .map_err(|_| invalid("password"))?;
    }
    if let Some(dbname) = &cfg.dbname {
        url.set_path(&format!("/{dbname}"));
    }
    if let Some(params) = &cfg.params {
        // Sorted for a stable URL (and stable logs).
        let mut pairs: Vec<_> = params.iter().collect();
        pairs.sort();
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    Ok(())
}

fn sqlite_file_url(path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(format!("sqlite://{}?mode=rwc", path.display()))
}

fn is_sqlite_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Parse the file path out of a SQLite DSN; `None` for in-memory databases.
pub fn sqlite_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    if is_sqlite_memory(dsn) {
        return None;
    }
    let rest = dsn.trim().strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let rest = rest.split('?').next().unwrap_or(rest);
    (!rest.is_empty()).then(|| PathBuf::from(rest))
}

/// Expand `${VAR}` references from the process environment.
fn expand_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| DbError::InvalidParameter(e.to_string()))?;
    let mut result = input.to_string();

    for caps in re.captures_iter(input) {
        let full_match = &caps[0];
        let var_name = &caps[1];
        let value = std::env::var(var_name)?;
        result = result.replace(full_match, &value);
    }

    Ok(result)
}

/// Validate configuration for consistency and detect conflicts.
fn validate_config_consistency(cfg: &DbConnConfig) -> Result<()> {
    let has_server_fields = cfg.host.is_some() || cfg.port.is_some();

    if let Some(dsn) = &cfg.dsn {
        let is_sqlite_dsn = dsn.trim_start().starts_with("sqlite");

        if is_sqlite_dsn && has_server_fields {
            return Err(DbError::ConfigConflict(
                "SQLite DSN cannot be used with host/port fields".to_string(),
            ));
        }

        if !is_sqlite_dsn && cfg.path.is_some() {
            return Err(DbError::ConfigConflict(
                "Non-SQLite DSN cannot be used with the path field".to_string(),
            ));
        }

        if is_sqlite_dsn && cfg.path.is_some() {
            return Err(DbError::ConfigConflict(
                "Cannot specify both a SQLite DSN and 'path' - use one or the other".to_string(),
            ));
        }
    }

    if cfg.path.is_some() && has_server_fields {
        return Err(DbError::ConfigConflict(
            "SQLite path cannot be used with host/port fields".to_string(),
        ));
    }

    if cfg.path.is_some() && matches!(cfg.engine, Some(e) if e != DbEngine::Sqlite) {
        return Err(DbError::ConfigConflict(
            "SQLite path cannot be used with a server engine".to_string(),
        ));
    }

    Ok(())
}

/// Redact credentials from DSN for logging.
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => match url::Url::parse(dsn) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            }
            Err(_) => redact_unparsable(dsn).into_owned(),
        },
        Some(dsn) => dsn.to_string(),
        None => "none".to_string(),
    }
}

// Keep the scheme so the log still says which backend was meant.
fn redact_unparsable(dsn: &str) -> Cow<'static, str> {
    match dsn.split_once("://") {
        Some((scheme, _)) => Cow::Owned(format!("{scheme}://***")),
        None => Cow::Borrowed("***"),
    }
}
