// === PUBLIC CONTRACT ===
// Other crates (the server binary, the presenter's callers) consume this.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::NutritionModule;

// === INTERNAL MODULES ===
// Exposed for tests and wiring; only `contract` is a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
