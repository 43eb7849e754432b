use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{
    DailyEntry, FoodCategory, FoodItem, Goals, LoggedEntry, NewEntry, Session, User,
};
use crate::domain::clock::Clock;
use crate::domain::error::DomainError;
use crate::domain::password;
use crate::domain::repo::{
    FoodCatalogRepository, GoalRepository, IntakeRepository, UserDirectoryRepository,
};

static CATEGORIES: [FoodCategory; 4] = FoodCategory::ALL;

/// Domain service for goals and intake logging.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UserDirectoryRepository>,
    goals: Arc<dyn GoalRepository>,
    foods: Arc<dyn FoodCatalogRepository>,
    intake: Arc<dyn IntakeRepository>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound for any single goal value.
    pub max_goal_value: f64,
    /// Upper bound for one logged quantity, in grams.
    pub max_quantity_grams: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_goal_value: 100_000.0,
            max_quantity_grams: 10_000.0,
        }
    }
}

/// The repository ports a [`Service`] works against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserDirectoryRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub foods: Arc<dyn FoodCatalogRepository>,
    pub intake: Arc<dyn IntakeRepository>,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self {
            users: repos.users,
            goals: repos.goals,
            foods: repos.foods,
            intake: repos.intake,
            clock,
            config,
        }
    }

    /// Today's date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // --- user directory ---

    /// The user whose stored hash matches `password`.
    ///
    /// Unknown user and wrong password both yield
    /// [`DomainError::InvalidCredentials`], at comparable cost.
    #[instrument(name = "nutrition.service.find_by_credentials", skip(self, password))]
    pub async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let stored = self
            .users
            .find_by_username(username)
            .await
            .map_err(DomainError::from_read)?;

        let password = password.to_owned();
        let Some(stored) = stored else {
            // Unknown user: pay for a verification anyway.
            let _ = tokio::task::spawn_blocking(move || password::verify_against_dummy(&password))
                .await;
            debug!("no such user");
            return Err(DomainError::InvalidCredentials);
        };

        let hash = stored.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
                .await
                .map_err(|e| DomainError::database(format!("password check aborted: {e}")))?;

        if matches {
            debug!(user_id = stored.user.id, "credentials accepted");
            Ok(stored.user)
        } else {
            debug!("password mismatch");
            Err(DomainError::InvalidCredentials)
        }
    }

    /// Check credentials and issue a session.
    #[instrument(name = "nutrition.service.authenticate", skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let user = self.find_by_credentials(username, password).await?;
        info!(user_id = user.id, "user authenticated");
        Ok(Session::issue(user))
    }

    #[instrument(name = "nutrition.service.find_id_by_username", skip(self))]
    pub async fn find_id_by_username(&self, username: &str) -> Result<i64, DomainError> {
        self.users
            .find_id_by_username(username)
            .await
            .map_err(DomainError::from_read)?
            .ok_or_else(|| DomainError::user_not_found(username))
    }

    /// Re-resolve the session's user. A session whose username vanished or
    /// now maps to another id is an integrity violation.
    async fn resolve_acting_user(&self, session: &Session) -> Result<i64, DomainError> {
        match self.find_id_by_username(session.username()).await {
            Ok(id) if id == session.user_id() => Ok(id),
            Ok(id) => {
                error!(
                    username = session.username(),
                    session_user_id = session.user_id(),
                    resolved_user_id = id,
                    "session user id no longer matches the directory"
                );
                Err(DomainError::session_invalid(session.username()))
            }
            Err(DomainError::UserNotFound { username }) => {
                error!(username = %username, "session user no longer exists");
                Err(DomainError::session_invalid(username))
            }
            Err(e) => Err(e),
        }
    }

    // --- goal store ---

    /// Replace the acting user's goal record. Absent fields are stored as NULL.
    #[instrument(
        name = "nutrition.service.save_goals",
        skip(self, session, goals),
        fields(user_id = session.user_id())
    )]
    pub async fn save_goals(&self, session: &Session, goals: Goals) -> Result<(), DomainError> {
        self.validate_goals(&goals)?;
        let user_id = self.resolve_acting_user(session).await?;

        self.goals.upsert(user_id, &goals).await.map_err(|e| {
            error!(error = %e, "goal upsert failed");
            DomainError::from_write(e)
        })?;

        info!("goals saved");
        Ok(())
    }

    #[instrument(
        name = "nutrition.service.load_goals",
        skip(self, session),
        fields(user_id = session.user_id())
    )]
    pub async fn load_goals(&self, session: &Session) -> Result<Option<Goals>, DomainError> {
        let user_id = self.resolve_acting_user(session).await?;
        let goals = self
            .goals
            .find(user_id)
            .await
            .map_err(DomainError::from_read)?;
        debug!(found = goals.is_some(), "goals loaded");
        Ok(goals)
    }

    // --- food catalog ---

    pub fn food_categories(&self) -> &'static [FoodCategory] {
        &CATEGORIES
    }

    /// Items whose stored category equals `category` exactly.
    /// No category (or a blank one) yields nothing without touching the database.
    #[instrument(name = "nutrition.service.list_by_category", skip(self))]
    pub async fn list_by_category(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<FoodItem>, DomainError> {
        let Some(category) = category.filter(|c| !c.trim().is_empty()) else {
            debug!("no category selected");
            return Ok(Vec::new());
        };

        let items = self
            .foods
            .list_by_category(category)
            .await
            .map_err(DomainError::from_read)?;
        debug!(count = items.len(), "catalog items listed");
        Ok(items)
    }

    // --- intake log ---

    /// Append one intake row dated by the server clock.
    #[instrument(
        name = "nutrition.service.log_entry",
        skip(self, session),
        fields(user_id = session.user_id())
    )]
    pub async fn log_entry(
        &self,
        session: &Session,
        entry: NewEntry,
    ) -> Result<LoggedEntry, DomainError> {
        let (food_item_id, quantity_grams) = self.validate_entry(&entry)?;
        let user_id = self.resolve_acting_user(session).await?;

        let known = self
            .foods
            .find_by_id(food_item_id)
            .await
            .map_err(DomainError::from_read)?;
        if known.is_none() {
            warn!(food_item_id, "log attempt for unknown food item");
            return Err(DomainError::validation(
                "food_item_id",
                format!("unknown food item {food_item_id}"),
            ));
        }

        let entry_date = self.clock.today();
        self.intake
            .append(user_id, food_item_id, entry_date, quantity_grams)
            .await
            .map_err(|e| {
                error!(error = %e, food_item_id, "intake insert failed");
                DomainError::from_write(e)
            })?;

        info!(food_item_id, quantity_grams, %entry_date, "intake logged");
        Ok(LoggedEntry {
            user_id,
            food_item_id,
            entry_date,
            quantity_grams,
        })
    }

    #[instrument(
        name = "nutrition.service.entries_for_day",
        skip(self, session),
        fields(user_id = session.user_id())
    )]
    pub async fn entries_for_day(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<Vec<DailyEntry>, DomainError> {
        let user_id = self.resolve_acting_user(session).await?;
        let entries = self
            .intake
            .for_day(user_id, date)
            .await
            .map_err(DomainError::from_read)?;
        debug!(count = entries.len(), "entries listed");
        Ok(entries)
    }

    // --- validation helpers ---

    fn validate_goals(&self, goals: &Goals) -> Result<(), DomainError> {
        for (field, value) in goals.values() {
            let Some(value) = value else { continue };
            if !value.is_finite() {
                return Err(DomainError::validation(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(DomainError::validation(field, "must not be negative"));
            }
            if value > self.config.max_goal_value {
                return Err(DomainError::validation(
                    field,
                    format!("must not exceed {}", self.config.max_goal_value),
                ));
            }
        }
        Ok(())
    }

    fn validate_entry(&self, entry: &NewEntry) -> Result<(i64, f64), DomainError> {
        let food_item_id = entry
            .food_item_id
            .ok_or_else(|| DomainError::validation("food_item_id", "is required"))?;
        let quantity = entry
            .quantity_grams
            .ok_or_else(|| DomainError::validation("quantity", "is required"))?;

        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(DomainError::validation(
                "quantity",
                "must be a positive number of grams",
            ));
        }
        if quantity > self.config.max_quantity_grams {
            return Err(DomainError::validation(
                "quantity",
                format!("must not exceed {} g", self.config.max_quantity_grams),
            ));
        }
        Ok((food_item_id, quantity))
    }
}
