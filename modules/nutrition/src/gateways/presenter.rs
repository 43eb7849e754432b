//! The four user actions as a form-driven UI sees them: every call returns an
//! outcome with a status line, never an error.

use serde::Serialize;
use utoipa::ToSchema;

use crate::contract::{
    client::NutritionApi,
    error::NutritionError,
    model::{FoodOption, Goals, NewEntry, Session},
};

/// Status lines shown to the user.
pub mod messages {
    pub const LOGIN_OK: &str = "Login successful!";
    pub const LOGIN_FAILED: &str = "Invalid username or password.";
    pub const GOALS_SAVED: &str = "Goals saved successfully!";
    pub const FOOD_LOGGED: &str = "Food item logged successfully!";
    pub const SESSION_EXPIRED: &str = "Your session is no longer valid. Please log in again.";
    pub const UNAVAILABLE: &str = "The service is temporarily unavailable. Please try again later.";
    pub const SAVE_FAILED: &str = "Could not save your changes. Please try again.";
    pub const NOT_FOUND: &str = "The requested item was not found.";
}

/// Result of one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Outcome {
    pub ok: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: &str) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Status line for a failed action. Internal details stay in the logs.
pub fn failure_message(err: &NutritionError) -> String {
    match err {
        NutritionError::InvalidCredentials => messages::SESSION_EXPIRED.to_string(),
        NutritionError::Validation { message } => message.clone(),
        NutritionError::NotFound { .. } => messages::NOT_FOUND.to_string(),
        NutritionError::Unavailable => messages::UNAVAILABLE.to_string(),
        NutritionError::Internal => messages::SAVE_FAILED.to_string(),
    }
}

/// Log in. The session is handed back only on success.
pub async fn authenticate(
    api: &dyn NutritionApi,
    username: &str,
    password: &str,
) -> (Outcome, Option<Session>) {
    match api.authenticate(username, password).await {
        Ok(session) => (Outcome::success(messages::LOGIN_OK), Some(session)),
        Err(NutritionError::InvalidCredentials) => (Outcome::failure(messages::LOGIN_FAILED), None),
        Err(e) => (Outcome::failure(failure_message(&e)), None),
    }
}

pub async fn save_goals(api: &dyn NutritionApi, session: &Session, goals: Goals) -> Outcome {
    match api.save_goals(session, goals).await {
        Ok(()) => Outcome::success(messages::GOALS_SAVED),
        Err(e) => Outcome::failure(failure_message(&e)),
    }
}

/// Options for the food dropdown. A selection list cannot show an error, so a
/// failure degrades to no options.
pub async fn list_food_options(api: &dyn NutritionApi, category: Option<&str>) -> Vec<FoodOption> {
    match api.list_food_options(category).await {
        Ok(options) => options,
        Err(e) => {
            tracing::warn!(error = %e, ?category, "food options unavailable");
            Vec::new()
        }
    }
}

pub async fn log_food(
    api: &dyn NutritionApi,
    session: &Session,
    food_item_id: Option<i64>,
    quantity: Option<f64>,
) -> Outcome {
    let entry = NewEntry {
        food_item_id,
        quantity_grams: quantity,
    };
    match api.log_food(session, entry).await {
        Ok(_) => Outcome::success(messages::FOOD_LOGGED),
        Err(e) => Outcome::failure(failure_message(&e)),
    }
}
