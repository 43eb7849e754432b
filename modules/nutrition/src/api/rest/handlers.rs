use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query},
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{info, warn};

use crate::api::rest::auth::Authenticated;
use crate::api::rest::dto::{
    CategoryDto, CreateEntryReq, DailyEntryDto, EntriesQuery, EntryCreatedDto, FoodOptionDto,
    FoodsQuery, LoginReq, LoginResponse,
};
use crate::api::rest::error::{from_parts, map_domain_error};
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::contract::model::{FoodOption, Goals};
use crate::domain::service::Service;
use crate::gateways::presenter::{messages, Outcome};

/// Check credentials. Later requests authenticate with HTTP Basic.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tags = ["auth"],
    security([]),
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = Problem),
        (status = 503, description = "Database unavailable", body = Problem)
    )
)]
pub async fn login(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginResponse>, ProblemResponse> {
    match svc.authenticate(&req.username, &req.password).await {
        Ok(session) => Ok(Json(LoginResponse {
            ok: true,
            message: messages::LOGIN_OK.to_string(),
            user_id: session.user_id(),
        })),
        Err(e) => {
            warn!(username = %req.username, "login rejected: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// The caller's saved goals
#[utoipa::path(
    get,
    path = "/api/v1/goals",
    tags = ["goals"],
    responses(
        (status = 200, description = "Saved goal record", body = Goals),
        (status = 401, description = "Unauthorised", body = Problem),
        (status = 404, description = "No goals saved yet", body = Problem)
    )
)]
pub async fn get_goals(
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(session): Authenticated,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Goals>, ProblemResponse> {
    match svc.load_goals(&session).await {
        Ok(Some(goals)) => Ok(Json(goals)),
        Ok(None) => Err(from_parts(
            StatusCode::NOT_FOUND,
            "NUTRITION_GOALS_NOT_FOUND",
            "Not found",
            "No goals have been saved yet.",
            uri.path(),
        )),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

/// Replace the caller's goals. Omitted fields are cleared.
#[utoipa::path(
    put,
    path = "/api/v1/goals",
    tags = ["goals"],
    request_body = Goals,
    responses(
        (status = 200, description = "Goals saved", body = Outcome),
        (status = 400, description = "Invalid goal value", body = Problem),
        (status = 401, description = "Unauthorised", body = Problem),
        (status = 500, description = "Write failed", body = Problem)
    )
)]
pub async fn put_goals(
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(session): Authenticated,
    OriginalUri(uri): OriginalUri,
    Json(goals): Json<Goals>,
) -> Result<Json<Outcome>, ProblemResponse> {
    info!(user_id = session.user_id(), "Saving goals");
    svc.save_goals(&session, goals)
        .await
        .map(|()| Json(Outcome::success(messages::GOALS_SAVED)))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

#[utoipa::path(
    get,
    path = "/api/v1/food-categories",
    tags = ["foods"],
    security([]),
    responses((status = 200, description = "Category selector values", body = [CategoryDto]))
)]
pub async fn list_categories(Extension(svc): Extension<Arc<Service>>) -> Json<Vec<CategoryDto>> {
    Json(
        svc.food_categories()
            .iter()
            .copied()
            .map(CategoryDto::from)
            .collect(),
    )
}

/// Food items of one category
#[utoipa::path(
    get,
    path = "/api/v1/foods",
    tags = ["foods"],
    security([]),
    params(FoodsQuery),
    responses(
        (status = 200, description = "Matching items, by name", body = [FoodOptionDto]),
        (status = 503, description = "Database unavailable", body = Problem)
    )
)]
pub async fn list_foods(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<FoodsQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<FoodOptionDto>>, ProblemResponse> {
    let items = svc
        .list_by_category(query.category.as_deref())
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| FoodOptionDto::from(FoodOption::from(item)))
            .collect(),
    ))
}

/// Log a quantity of a food item, dated today
#[utoipa::path(
    post,
    path = "/api/v1/entries",
    tags = ["entries"],
    request_body = CreateEntryReq,
    responses(
        (status = 201, description = "Entry recorded", body = EntryCreatedDto),
        (status = 400, description = "Missing or invalid field", body = Problem),
        (status = 401, description = "Unauthorised", body = Problem),
        (status = 500, description = "Write failed", body = Problem)
    )
)]
pub async fn create_entry(
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(session): Authenticated,
    OriginalUri(uri): OriginalUri,
    Json(req): Json<CreateEntryReq>,
) -> Result<(StatusCode, Json<EntryCreatedDto>), ProblemResponse> {
    let logged = svc
        .log_entry(&session, req.into())
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok((
        StatusCode::CREATED,
        Json(EntryCreatedDto::new(messages::FOOD_LOGGED, logged)),
    ))
}

/// The caller's entries for one day
#[utoipa::path(
    get,
    path = "/api/v1/entries",
    tags = ["entries"],
    params(EntriesQuery),
    responses(
        (status = 200, description = "Entries in insertion order", body = [DailyEntryDto]),
        (status = 401, description = "Unauthorised", body = Problem)
    )
)]
pub async fn list_entries(
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(session): Authenticated,
    Query(query): Query<EntriesQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<DailyEntryDto>>, ProblemResponse> {
    let date = query.date.unwrap_or_else(|| svc.today());
    let entries = svc
        .entries_for_day(&session, date)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(entries.into_iter().map(DailyEntryDto::from).collect()))
}
