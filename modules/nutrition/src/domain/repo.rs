use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::contract::model::{DailyEntry, FoodItem, Goals, User};

/// Failure reported by a persistence adapter.
///
/// The split matters: "could not reach the database" must never be confused
/// with "the database said no", and neither with an empty result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("database connection unavailable: {message}")]
    Connection { message: String },

    #[error("database statement failed: {message}")]
    Query { message: String },
}

impl PersistenceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// A user row including the stored password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Read access to accounts. Accounts are provisioned outside this module.
#[async_trait]
pub trait UserDirectoryRepository: Send + Sync {
    async fn find_by_username(&self, username: &str)
        -> Result<Option<StoredUser>, PersistenceError>;

    async fn find_id_by_username(&self, username: &str) -> Result<Option<i64>, PersistenceError>;
}

/// Owner of the goal table: at most one record per user.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert or fully replace the record of `user_id` in one statement.
    async fn upsert(&self, user_id: i64, goals: &Goals) -> Result<(), PersistenceError>;

    async fn find(&self, user_id: i64) -> Result<Option<Goals>, PersistenceError>;
}

/// Read access to the food catalog.
#[async_trait]
pub trait FoodCatalogRepository: Send + Sync {
    /// Items whose category equals `category` exactly, ordered by name then id.
    async fn list_by_category(&self, category: &str) -> Result<Vec<FoodItem>, PersistenceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FoodItem>, PersistenceError>;
}

/// Append-only intake log.
#[async_trait]
pub trait IntakeRepository: Send + Sync {
    async fn append(
        &self,
        user_id: i64,
        food_item_id: i64,
        entry_date: NaiveDate,
        quantity_grams: f64,
    ) -> Result<(), PersistenceError>;

    async fn for_day(
        &self,
        user_id: i64,
        entry_date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, PersistenceError>;
}
