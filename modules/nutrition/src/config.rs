use serde::{Deserialize, Serialize};

/// Configuration read from `modules.nutrition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NutritionConfig {
    /// Upper bound accepted for any single goal value.
    #[serde(default = "default_max_goal_value")]
    pub max_goal_value: f64,
    /// Upper bound for one logged quantity, in grams.
    #[serde(default = "default_max_quantity_grams")]
    pub max_quantity_grams: f64,
    /// Apply schema migrations on startup.
    #[serde(default = "default_true")]
    pub migrate_on_start: bool,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            max_goal_value: default_max_goal_value(),
            max_quantity_grams: default_max_quantity_grams(),
            migrate_on_start: true,
        }
    }
}

fn default_max_goal_value() -> f64 {
    100_000.0
}

fn default_max_quantity_grams() -> f64 {
    10_000.0
}

fn default_true() -> bool {
    true
}
