//! Query gateway behaviour against SQLite.

mod common;

use dbkit::{build_db_handle, DbConnConfig, DbEngine, DbError, Param, RetryCfg, SqlValue};
use std::time::Duration;

const CREATE: &str = "CREATE TABLE food_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    kcal REAL
)";

#[tokio::test]
async fn run_returns_named_rows_in_order() {
    let db = common::sqlite_memory().await.unwrap();
    assert_eq!(db.engine(), DbEngine::Sqlite);
    db.execute(CREATE, &[]).await.unwrap();

    for (name, category, kcal) in [
        ("Poulet", "protéine", Some(165.0)),
        ("Brocoli", "légume", None),
        ("Boeuf", "protéine", Some(250.0)),
    ] {
        let affected = db
            .execute(
                "INSERT INTO food_item (name, category, kcal) VALUES (?, ?, ?)",
                &[name.into(), category.into(), Param::from(kcal)],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }

    let rows = db
        .run(
            "SELECT id, name, kcal FROM food_item WHERE category = ? ORDER BY name",
            &["protéine".into()],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    let names: Vec<_> = rows.iter().map(|r| r.string("name").unwrap()).collect();
    assert_eq!(names, ["Boeuf", "Poulet"]);
    let cols: Vec<_> = rows[0].columns().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(cols, ["id", "name", "kcal"]);
    assert_eq!(rows[0].f64("kcal").unwrap(), 250.0);
}

#[tokio::test]
async fn zero_rows_is_an_empty_result() {
    let db = common::sqlite_memory().await.unwrap();
    db.execute(CREATE, &[]).await.unwrap();

    let rows = db
        .run(
            "SELECT id FROM food_item WHERE category = ?",
            &["fruit".into()],
        )
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn null_parameters_round_trip_as_null() {
    let db = common::sqlite_memory().await.unwrap();
    db.execute(CREATE, &[]).await.unwrap();
    db.execute(
        "INSERT INTO food_item (name, category, kcal) VALUES (?, ?, ?)",
        &["Eau".into(), "boisson".into(), Param::Float(None)],
    )
    .await
    .unwrap();

    let rows = db.run("SELECT kcal FROM food_item", &[]).await.unwrap();
    assert_eq!(rows[0].get("kcal"), Some(&SqlValue::Null));
    assert_eq!(rows[0].opt_f64("kcal").unwrap(), None);
}

#[tokio::test]
async fn values_are_never_spliced_into_sql() {
    let db = common::sqlite_memory().await.unwrap();
    db.execute(CREATE, &[]).await.unwrap();

    let hostile = "x'); DROP TABLE food_item; --";
    db.execute(
        "INSERT INTO food_item (name, category) VALUES (?, ?)",
        &[hostile.into(), "protéine".into()],
    )
    .await
    .unwrap();

    let rows = db
        .run("SELECT name FROM food_item WHERE name = ?", &[hostile.into()])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].string("name").unwrap(), hostile);
}

#[tokio::test]
async fn bad_statement_is_a_query_error() {
    let db = common::sqlite_memory().await.unwrap();
    let err = db.run("SELECT * FROM no_such_table", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Query(_)), "got {err:?}");
    assert!(!err.is_connection());
}

#[tokio::test]
async fn connection_released_after_failed_statement() {
    // One connection only: a leaked guard would make the second call hang.
    let db = common::sqlite_memory().await.unwrap();
    let _ = db.run("SELECT * FROM no_such_table", &[]).await;
    db.ping().await.unwrap();
}

#[tokio::test]
async fn unreachable_database_is_a_connection_error_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.db");
    let cfg = DbConnConfig {
        // read-only mode never creates the file
        dsn: Some(format!("sqlite://{}?mode=ro", missing.display())),
        retry: Some(RetryCfg {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(10),
        }),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();

    let err = db
        .run("SELECT 1", &[])
        .await
        .expect_err("a missing database must not look like zero rows");
    assert!(matches!(err, DbError::Connection(_)), "got {err:?}");
    assert!(err.is_connection());
}

#[tokio::test]
async fn sqlite_path_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("nutrition.db");
    let cfg = DbConnConfig {
        path: Some(path.clone()),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();
    db.ping().await.unwrap();
    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn sqlite_dsn_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("app.db");
    let cfg = DbConnConfig {
        dsn: Some(format!("sqlite://{}?mode=rwc", path.display())),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();
    db.ping().await.unwrap();
    assert!(path.exists());
    db.close().await;
}

/// Streams a row every 100k steps for a very long time, so it never
/// finishes within a test but stops soon after its reader goes away.
const SLOW: &str = "WITH RECURSIVE c(x) AS (
    SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000000
) SELECT x FROM c WHERE x % 100000 = 0";

#[tokio::test]
async fn slow_statement_times_out_as_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DbConnConfig {
        path: Some(dir.path().join("slow.db")),
        statement_timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();

    let started = std::time::Instant::now();
    let err = db.run(SLOW, &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Timeout(t) if t == Duration::from_millis(100)), "got {err:?}");
    assert!(err.is_connection());
    assert!(started.elapsed() < Duration::from_secs(5));

    // The abandoned connection is closed; the next call gets a fresh one.
    db.ping().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn in_memory_database_survives_a_statement_timeout() {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".into()),
        statement_timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();
    db.execute(CREATE, &[]).await.unwrap();
    db.execute(
        "INSERT INTO food_item (name, category) VALUES (?, ?)",
        &["Brocoli".into(), "légume".into()],
    )
    .await
    .unwrap();

    let err = db.run(SLOW, &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Timeout(_)), "got {err:?}");

    let rows = db.run("SELECT name FROM food_item", &[]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].string("name").unwrap(), "Brocoli");
}

#[tokio::test]
async fn saturated_pool_is_retried_up_to_max_attempts() {
    let acquire_timeout = Duration::from_millis(50);
    let backoff = Duration::from_millis(20);
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".into()),
        pool: Some(dbkit::PoolCfg {
            acquire_timeout: Some(acquire_timeout),
            ..Default::default()
        }),
        retry: Some(RetryCfg {
            max_attempts: 3,
            initial_backoff: backoff,
            max_backoff: Duration::from_secs(1),
        }),
        ..Default::default()
    };
    let db = build_db_handle(cfg).await.unwrap();

    // The in-memory pool has one connection; holding it starves every caller.
    let held = db.acquire().await.unwrap();

    let started = std::time::Instant::now();
    let err = db.run("SELECT 1", &[]).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(
        matches!(err, DbError::Connection(sqlx::Error::PoolTimedOut)),
        "got {err:?}"
    );
    // Three timed-out attempts with 20ms then 40ms of backoff in between.
    let minimum = acquire_timeout * 3 + backoff + backoff * 2;
    assert!(elapsed >= minimum, "gave up after {elapsed:?}, expected at least {minimum:?}");

    drop(held);
    db.ping().await.unwrap();
}
