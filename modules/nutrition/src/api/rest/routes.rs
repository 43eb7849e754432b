use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Path prefix of every nutrition endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Routes of the nutrition API, nested under [`API_PREFIX`].
pub fn router(service: Arc<Service>) -> Router {
    let api = Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/goals", get(handlers::get_goals).put(handlers::put_goals))
        .route("/food-categories", get(handlers::list_categories))
        .route("/foods", get(handlers::list_foods))
        .route(
            "/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        );

    Router::new()
        .nest(API_PREFIX, api)
        .layer(Extension(service))
}
