use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contract::model::{DailyEntry, FoodCategory, FoodOption, LoggedEntry, NewEntry};

/// REST DTO for a login attempt
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

/// REST DTO for a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub ok: bool,
    pub message: String,
    pub user_id: i64,
}

/// One entry of the category selector
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    /// Value to pass as `category` to `GET /foods`.
    pub value: String,
    pub label: String,
}

impl From<FoodCategory> for CategoryDto {
    fn from(c: FoodCategory) -> Self {
        Self {
            value: c.token().to_string(),
            label: c.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FoodsQuery {
    /// Exact category value; omitted or blank yields no options.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodOptionDto {
    pub id: i64,
    pub label: String,
}

impl From<FoodOption> for FoodOptionDto {
    fn from(o: FoodOption) -> Self {
        Self {
            id: o.id,
            label: o.label,
        }
    }
}

/// REST DTO for logging a food item. The entry is dated by the server.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateEntryReq {
    pub food_item_id: Option<i64>,
    /// Grams.
    pub quantity: Option<f64>,
}

impl From<CreateEntryReq> for NewEntry {
    fn from(req: CreateEntryReq) -> Self {
        Self {
            food_item_id: req.food_item_id,
            quantity_grams: req.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryCreatedDto {
    pub ok: bool,
    pub message: String,
    pub food_item_id: i64,
    pub entry_date: NaiveDate,
    pub quantity: f64,
}

impl EntryCreatedDto {
    pub fn new(message: &str, entry: LoggedEntry) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
            food_item_id: entry.food_item_id,
            entry_date: entry.entry_date,
            quantity: entry.quantity_grams,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntriesQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyEntryDto {
    pub id: i64,
    pub food_item_id: i64,
    pub food_name: String,
    pub entry_date: NaiveDate,
    pub quantity: f64,
}

impl From<DailyEntry> for DailyEntryDto {
    fn from(e: DailyEntry) -> Self {
        Self {
            id: e.id,
            food_item_id: e.food_item_id,
            food_name: e.food_name,
            entry_date: e.entry_date,
            quantity: e.quantity_grams,
        }
    }
}
