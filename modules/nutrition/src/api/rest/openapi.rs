use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::{dto, handlers, problem};
use crate::contract::model::{FoodCategory, Goals};
use crate::gateways::presenter::Outcome;

/// Registers HTTP Basic as the default security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "basic",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

/// OpenAPI document of the nutrition API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Nutrition tracker API",
        description = "Daily nutrient goals and food intake logging."
    ),
    security(("basic" = [])),
    paths(
        handlers::login,
        handlers::get_goals,
        handlers::put_goals,
        handlers::list_categories,
        handlers::list_foods,
        handlers::create_entry,
        handlers::list_entries,
    ),
    components(schemas(
        Goals,
        FoodCategory,
        Outcome,
        problem::Problem,
        problem::ValidationError,
        dto::LoginReq,
        dto::LoginResponse,
        dto::CategoryDto,
        dto::FoodOptionDto,
        dto::CreateEntryReq,
        dto::EntryCreatedDto,
        dto::DailyEntryDto,
    )),
    tags(
        (name = "auth", description = "Credential checks"),
        (name = "goals", description = "Daily nutrient goals"),
        (name = "foods", description = "Food catalog"),
        (name = "entries", description = "Intake log")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/login",
            "/api/v1/goals",
            "/api/v1/food-categories",
            "/api/v1/foods",
            "/api/v1/entries",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn basic_auth_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("basic"));
        assert!(components.schemas.contains_key("Goals"));
    }
}
