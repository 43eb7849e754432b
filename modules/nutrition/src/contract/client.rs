use async_trait::async_trait;
use chrono::NaiveDate;

use crate::contract::{
    error::NutritionError,
    model::{DailyEntry, FoodCategory, FoodOption, Goals, LoggedEntry, NewEntry, Session},
};

/// Public API of the nutrition module for in-process callers.
#[async_trait]
pub trait NutritionApi: Send + Sync {
    /// Check credentials and open a session.
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<Session, NutritionError>;

    /// Replace the session user's goal record.
    async fn save_goals(&self, session: &Session, goals: Goals) -> Result<(), NutritionError>;

    /// The session user's goal record, if one was ever saved.
    async fn load_goals(&self, session: &Session) -> Result<Option<Goals>, NutritionError>;

    /// The categories a catalog can be browsed by.
    fn food_categories(&self) -> &'static [FoodCategory];

    /// Food items of one category; no category means no options.
    async fn list_food_options(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<FoodOption>, NutritionError>;

    /// Append an intake entry dated today.
    async fn log_food(
        &self,
        session: &Session,
        entry: NewEntry,
    ) -> Result<LoggedEntry, NutritionError>;

    /// The session user's entries for one day.
    async fn entries_for_day(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, NutritionError>;
}
