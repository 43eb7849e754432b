use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::contract::{
    client::NutritionApi,
    error::NutritionError,
    model::{DailyEntry, FoodCategory, FoodOption, Goals, LoggedEntry, NewEntry, Session},
};
use crate::domain::service::Service;

/// Local implementation of the NutritionApi trait that delegates to the domain service
pub struct NutritionLocalClient {
    service: Arc<Service>,
}

impl NutritionLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl NutritionApi for NutritionLocalClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, NutritionError> {
        self.service
            .authenticate(username, password)
            .await
            .map_err(Into::into)
    }

    async fn save_goals(&self, session: &Session, goals: Goals) -> Result<(), NutritionError> {
        self.service
            .save_goals(session, goals)
            .await
            .map_err(Into::into)
    }

    async fn load_goals(&self, session: &Session) -> Result<Option<Goals>, NutritionError> {
        self.service.load_goals(session).await.map_err(Into::into)
    }

    fn food_categories(&self) -> &'static [FoodCategory] {
        self.service.food_categories()
    }

    async fn list_food_options(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<FoodOption>, NutritionError> {
        let items = self.service.list_by_category(category).await?;
        Ok(items.into_iter().map(FoodOption::from).collect())
    }

    async fn log_food(
        &self,
        session: &Session,
        entry: NewEntry,
    ) -> Result<LoggedEntry, NutritionError> {
        self.service
            .log_entry(session, entry)
            .await
            .map_err(Into::into)
    }

    async fn entries_for_day(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, NutritionError> {
        self.service
            .entries_for_day(session, date)
            .await
            .map_err(Into::into)
    }
}
