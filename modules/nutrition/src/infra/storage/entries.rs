use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dbkit::{DbHandle, Param, Row};

use crate::contract::model::DailyEntry;
use crate::domain::repo::{IntakeRepository, PersistenceError};

/// `entry_date` is stored as `YYYY-MM-DD` text on every engine.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Append-only access to `daily_entry`.
#[derive(Clone)]
pub struct SqlIntakeLog {
    db: Arc<DbHandle>,
}

impl SqlIntakeLog {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

fn to_entry(row: &Row) -> Result<DailyEntry, PersistenceError> {
    let raw_date = row.string("entry_date")?;
    let entry_date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|e| {
        PersistenceError::query(format!("stored entry_date '{raw_date}' is not a date: {e}"))
    })?;
    Ok(DailyEntry {
        id: row.i64("id")?,
        food_item_id: row.i64("food_item_id")?,
        food_name: row.string("food_name")?,
        entry_date,
        quantity_grams: row.f64("quantity")?,
    })
}

#[async_trait]
impl IntakeRepository for SqlIntakeLog {
    async fn append(
        &self,
        user_id: i64,
        food_item_id: i64,
        entry_date: NaiveDate,
        quantity_grams: f64,
    ) -> Result<(), PersistenceError> {
        self.db
            .execute(
                "INSERT INTO daily_entry (user_id, food_item_id, entry_date, quantity) \
                 VALUES (?, ?, ?, ?)",
                &[
                    Param::from(user_id),
                    Param::from(food_item_id),
                    Param::from(entry_date.format(DATE_FORMAT).to_string()),
                    Param::from(quantity_grams),
                ],
            )
            .await?;
        Ok(())
    }

    async fn for_day(
        &self,
        user_id: i64,
        entry_date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, PersistenceError> {
        let rows = self
            .db
            .run(
                "SELECT e.id AS id, e.food_item_id AS food_item_id, f.name AS food_name, \
                        e.entry_date AS entry_date, e.quantity AS quantity \
                 FROM daily_entry e JOIN food_item f ON f.id = e.food_item_id \
                 WHERE e.user_id = ? AND e.entry_date = ? \
                 ORDER BY e.id",
                &[
                    Param::from(user_id),
                    Param::from(entry_date.format(DATE_FORMAT).to_string()),
                ],
            )
            .await?;
        rows.iter().map(to_entry).collect()
    }
}
