use sqlx::AnyPool;
use sqlx::pool::PoolConnection;
use sqlx::Any;

use crate::config::RetryCfg;
use crate::{DbError, Result};

/// Acquire a pooled connection, retrying transient failures with backoff.
pub(crate) async fn acquire_with_retry(
    pool: &AnyPool,
    retry: &RetryCfg,
    dsn: &str,
) -> Result<PoolConnection<Any>> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match pool.acquire().await {
            Ok(conn) => {
                if attempt > 1 {
                    tracing::info!(dsn, attempt, "Database connection re-established");
                }
                return Ok(conn);
            }
            Err(err) if attempt < max_attempts && is_transient(&err) => {
                let delay = retry.backoff_for(attempt);
                tracing::warn!(
                    dsn,
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %err,
                    "Database connection attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(dsn, attempt, error = %err, "Database connection unavailable");
                return Err(DbError::Connection(err));
            }
        }
    }
}

/// Failures worth another try: the network blipped or the pool was saturated.
/// Authentication or "database missing" errors will not fix themselves.
fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}
