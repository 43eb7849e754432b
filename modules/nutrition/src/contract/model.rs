use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An account as seen by the rest of the system. The password hash never
/// leaves the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Proof of a successful authentication.
///
/// Only the user directory can mint one, so holding a `Session` means the
/// credentials were checked. Goal and intake operations take a session, never
/// a bare username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: i64,
    username: String,
}

impl Session {
    pub(crate) fn issue(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

macro_rules! goal_record {
    ($( $(#[$doc:meta])* $field:ident ),+ $(,)?) => {
        /// Daily intake targets. Every field is optional; saving replaces the
        /// whole record, so an absent field clears the stored value.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
        #[serde(default, deny_unknown_fields)]
        pub struct Goals {
            $( $(#[$doc])* pub $field: Option<f64>, )+
        }

        impl Goals {
            /// Column names, in storage order.
            pub const FIELDS: &'static [&'static str] = &[$( stringify!($field) ),+];

            /// `(name, value)` pairs in [`Goals::FIELDS`] order.
            pub fn values(&self) -> Vec<(&'static str, Option<f64>)> {
                vec![$( (stringify!($field), self.$field) ),+]
            }

            /// Build a record by asking `get` for each field by name.
            pub fn from_lookup<E>(
                mut get: impl FnMut(&'static str) -> Result<Option<f64>, E>,
            ) -> Result<Self, E> {
                Ok(Self {
                    $( $field: get(stringify!($field))?, )+
                })
            }
        }
    };
}

goal_record! {
    /// kcal
    calories,
    /// g
    protein,
    /// g
    fat,
    /// g
    carbs,
    vitamin_a,
    vitamin_b1,
    vitamin_b2,
    vitamin_b3,
    vitamin_b5,
    vitamin_b6,
    vitamin_b7,
    vitamin_b9,
    vitamin_b12,
    /// mg
    vitamin_c,
    vitamin_d,
    vitamin_e,
    vitamin_k,
    betaine,
    choline,
    calcium,
    copper,
    fluoride,
    iron,
    magnesium,
    manganese,
    phosphorus,
    potassium,
    selenium,
    sodium,
    zinc,
}

/// The fixed set of catalog categories offered to users.
///
/// Stored category values are free text; these are the tokens the catalog is
/// populated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FoodCategory {
    #[serde(rename = "protéine")]
    Protein,
    #[serde(rename = "glucide")]
    Carbohydrate,
    #[serde(rename = "lipide")]
    Fat,
    #[serde(rename = "légume")]
    Vegetable,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 4] = [
        FoodCategory::Protein,
        FoodCategory::Carbohydrate,
        FoodCategory::Fat,
        FoodCategory::Vegetable,
    ];

    /// Value stored in `food_item.category`.
    pub fn token(self) -> &'static str {
        match self {
            FoodCategory::Protein => "protéine",
            FoodCategory::Carbohydrate => "glucide",
            FoodCategory::Fat => "lipide",
            FoodCategory::Vegetable => "légume",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FoodCategory::Protein => "Protéine",
            FoodCategory::Carbohydrate => "Glucide",
            FoodCategory::Fat => "Lipide",
            FoodCategory::Vegetable => "Légume",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }
}

/// A catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub category: String,
}

/// One choice in a food selection list.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodOption {
    pub id: i64,
    pub label: String,
}

impl From<FoodItem> for FoodOption {
    fn from(item: FoodItem) -> Self {
        Self {
            id: item.id,
            label: item.name,
        }
    }
}

/// Input of a log-food action. Both parts are required; they are optional
/// here so that a missing value is reported as a validation failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEntry {
    pub food_item_id: Option<i64>,
    pub quantity_grams: Option<f64>,
}

/// What a successful log-food action recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEntry {
    pub user_id: i64,
    pub food_item_id: i64,
    pub entry_date: NaiveDate,
    pub quantity_grams: f64,
}

/// A stored intake row, joined with the food name.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub id: i64,
    pub food_item_id: i64,
    pub food_name: String,
    pub entry_date: NaiveDate,
    pub quantity_grams: f64,
}
