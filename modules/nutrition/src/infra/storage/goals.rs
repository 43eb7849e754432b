use std::sync::Arc;

use async_trait::async_trait;
use dbkit::{DbEngine, DbHandle, Param};

use crate::contract::model::Goals;
use crate::domain::repo::{GoalRepository, PersistenceError};

/// Owner of the `goal` table (unique on `user_id`).
#[derive(Clone)]
pub struct SqlGoalStore {
    db: Arc<DbHandle>,
}

impl SqlGoalStore {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

/// Single-statement insert-or-replace keyed by `user_id`. Insert and update
/// clauses come from the same column list.
fn upsert_sql(engine: DbEngine) -> String {
    let columns = Goals::FIELDS.join(", ");
    let placeholders = vec!["?"; Goals::FIELDS.len() + 1].join(", ");

    let conflict = match engine {
        DbEngine::MySql => "ON DUPLICATE KEY UPDATE",
        DbEngine::Postgres | DbEngine::Sqlite => "ON CONFLICT (user_id) DO UPDATE SET",
    };
    let updates = Goals::FIELDS
        .iter()
        .map(|c| match engine {
            DbEngine::MySql => format!("{c} = VALUES({c})"),
            DbEngine::Postgres | DbEngine::Sqlite => format!("{c} = excluded.{c}"),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO goal (user_id, {columns}) VALUES ({placeholders}) {conflict} {updates}")
}

fn select_sql() -> String {
    format!(
        "SELECT {} FROM goal WHERE user_id = ?",
        Goals::FIELDS.join(", ")
    )
}

#[async_trait]
impl GoalRepository for SqlGoalStore {
    async fn upsert(&self, user_id: i64, goals: &Goals) -> Result<(), PersistenceError> {
        let params: Vec<Param> = std::iter::once(Param::from(user_id))
            .chain(goals.values().into_iter().map(|(_, v)| Param::from(v)))
            .collect();

        let affected = self
            .db
            .execute(&upsert_sql(self.db.engine()), &params)
            .await?;
        tracing::debug!(user_id, affected, "goal upsert executed");
        Ok(())
    }

    async fn find(&self, user_id: i64) -> Result<Option<Goals>, PersistenceError> {
        let rows = self
            .db
            .run(&select_sql(), &[Param::from(user_id)])
            .await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        Ok(Some(Goals::from_lookup(|name| row.opt_f64(name))?))
    }
}
