pub mod client;
pub mod error;
pub mod model;

pub use client::NutritionApi;
pub use error::NutritionError;
pub use model::*;
