use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse, ValidationError};
use crate::domain::error::DomainError;
use crate::gateways::presenter::messages;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.nutrition.local/{code}"))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

pub fn unauthorized(detail: &str, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        "NUTRITION_UNAUTHORIZED",
        "Unauthorized",
        detail,
        instance,
    )
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::InvalidCredentials => unauthorized(messages::LOGIN_FAILED, instance),
        DomainError::SessionInvalid { .. } => unauthorized(messages::SESSION_EXPIRED, instance),
        DomainError::UserNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "NUTRITION_NOT_FOUND",
            "Not found",
            messages::NOT_FOUND,
            instance,
        ),
        DomainError::Validation { field, message } => {
            let mut resp = from_parts(
                StatusCode::BAD_REQUEST,
                "NUTRITION_VALIDATION",
                "Validation error",
                format!("{field}: {message}"),
                instance,
            );
            resp.0 = resp.0.with_errors(vec![ValidationError {
                detail: message.clone(),
                pointer: format!("/{field}"),
            }]);
            resp
        }
        DomainError::ConnectionUnavailable { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database unavailable");
            from_parts(
                StatusCode::SERVICE_UNAVAILABLE,
                "NUTRITION_UNAVAILABLE",
                "Service unavailable",
                messages::UNAVAILABLE,
                instance,
            )
        }
        DomainError::WriteFailed { .. } => {
            tracing::error!(error = ?e, "Write failed");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NUTRITION_WRITE_FAILED",
                "Internal error",
                messages::SAVE_FAILED,
                instance,
            )
        }
        DomainError::Database { .. } => {
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NUTRITION_INTERNAL",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (DomainError::InvalidCredentials, 401),
            (DomainError::session_invalid("alice"), 401),
            (DomainError::user_not_found("bob"), 404),
            (DomainError::validation("quantity", "is required"), 400),
            (
                DomainError::ConnectionUnavailable {
                    message: "refused".into(),
                },
                503,
            ),
            (
                DomainError::WriteFailed {
                    message: "constraint".into(),
                },
                500,
            ),
            (DomainError::database("boom"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(map_domain_error(&err, "/x").0.status, status, "{err:?}");
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let p = map_domain_error(
            &DomainError::WriteFailed {
                message: "UNIQUE constraint failed: goal.user_id".into(),
            },
            "/api/v1/goals",
        )
        .0;
        assert_eq!(p.detail, messages::SAVE_FAILED);
        assert!(!p.detail.contains("constraint"));
    }

    #[test]
    fn validation_points_at_the_field() {
        let p = map_domain_error(
            &DomainError::validation("quantity", "must be a positive number of grams"),
            "/api/v1/entries",
        )
        .0;
        let errors = p.errors.unwrap();
        assert_eq!(errors[0].pointer, "/quantity");
        assert_eq!(p.instance, "/api/v1/entries");
    }
}
