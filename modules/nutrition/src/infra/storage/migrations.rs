//! Idempotent schema setup for SQLite, PostgreSQL and MySQL/MariaDB.

use dbkit::{DbEngine, DbError, DbHandle};
use tracing::info;

use crate::contract::model::Goals;

struct Dialect {
    id_column: &'static str,
    text: &'static str,
    date: &'static str,
    number: &'static str,
    /// Suffix for `CREATE TABLE (...)`.
    table_options: &'static str,
}

fn dialect(engine: DbEngine) -> Dialect {
    match engine {
        DbEngine::Sqlite => Dialect {
            id_column: "id INTEGER PRIMARY KEY AUTOINCREMENT",
            text: "TEXT",
            date: "TEXT",
            number: "REAL",
            table_options: "",
        },
        DbEngine::Postgres => Dialect {
            id_column: "id BIGSERIAL PRIMARY KEY",
            text: "TEXT",
            date: "TEXT",
            number: "DOUBLE PRECISION",
            table_options: "",
        },
        DbEngine::MySql => Dialect {
            id_column: "id BIGINT AUTO_INCREMENT PRIMARY KEY",
            text: "VARCHAR(255)",
            date: "VARCHAR(10)",
            number: "DOUBLE",
            table_options: " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        },
    }
}

/// DDL statements in dependency order.
pub fn statements(engine: DbEngine) -> Vec<String> {
    let d = dialect(engine);
    let goal_columns = Goals::FIELDS
        .iter()
        .map(|c| format!("{c} {} NULL", d.number))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = vec![
        format!(
            "CREATE TABLE IF NOT EXISTS app_user ({}, username {} NOT NULL UNIQUE, \
             password_hash {} NOT NULL){}",
            d.id_column, d.text, d.text, d.table_options
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS goal (user_id BIGINT NOT NULL PRIMARY KEY, {goal_columns}, \
             FOREIGN KEY (user_id) REFERENCES app_user(id)){}",
            d.table_options
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS food_item ({}, name {} NOT NULL, category {} NOT NULL{}){}",
            d.id_column,
            d.text,
            d.text,
            if engine == DbEngine::MySql {
                ", INDEX idx_food_item_category (category)"
            } else {
                ""
            },
            d.table_options
        ),
    ];

    match engine {
        DbEngine::MySql => out.push(format!(
            "CREATE TABLE IF NOT EXISTS daily_entry ({}, user_id BIGINT NOT NULL, \
             food_item_id BIGINT NOT NULL, entry_date {} NOT NULL, quantity {} NOT NULL, \
             INDEX idx_daily_entry_user_date (user_id, entry_date), \
             INDEX idx_daily_entry_food (food_item_id), \
             FOREIGN KEY (user_id) REFERENCES app_user(id), \
             FOREIGN KEY (food_item_id) REFERENCES food_item(id)){}",
            d.id_column, d.date, d.number, d.table_options
        )),
        DbEngine::Postgres | DbEngine::Sqlite => {
            out.push(format!(
                "CREATE TABLE IF NOT EXISTS daily_entry ({}, \
                 user_id BIGINT NOT NULL REFERENCES app_user(id), \
                 food_item_id BIGINT NOT NULL REFERENCES food_item(id), \
                 entry_date {} NOT NULL, quantity {} NOT NULL)",
                d.id_column, d.date, d.number
            ));
            out.push(
                "CREATE INDEX IF NOT EXISTS idx_daily_entry_user_date \
                 ON daily_entry (user_id, entry_date)"
                    .to_string(),
            );
            out.push(
                "CREATE INDEX IF NOT EXISTS idx_food_item_category ON food_item (category)"
                    .to_string(),
            );
        }
    }
    out
}

/// Create any missing table. Safe to run on every start.
pub async fn apply(db: &DbHandle) -> Result<(), DbError> {
    let stmts = statements(db.engine());
    for sql in &stmts {
        db.execute(sql, &[]).await?;
    }
    info!(engine = ?db.engine(), statements = stmts.len(), "schema is up to date");
    Ok(())
}
