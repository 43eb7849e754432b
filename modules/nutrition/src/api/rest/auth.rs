//! Per-request HTTP Basic authentication.
//!
//! There is no token or server-side session store: every protected request
//! carries credentials, which go through the same check as `POST /auth/login`.
//! The resulting [`Session`] is what handlers pass to the service.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::api::rest::error::{map_domain_error, unauthorized};
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::Session;
use crate::domain::service::Service;
use crate::gateways::presenter::messages;

pub const REALM_CHALLENGE: &str = r#"Basic realm="nutrition", charset="UTF-8""#;

/// Extractor yielding the authenticated caller.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

/// Rejection of [`Authenticated`]; 401s carry a Basic challenge.
#[derive(Debug)]
pub struct AuthRejection(pub ProblemResponse);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.0 .0.status;
        let mut resp = self.0.into_response();
        if status == 401 {
            resp.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(REALM_CHALLENGE),
            );
        }
        resp
    }
}

/// Split `Basic <base64(user:pass)>` into its parts.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see the path without the mount prefix.
        let instance = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |OriginalUri(uri)| uri.path())
            .to_string();

        let Some(svc) = parts.extensions.get::<Arc<Service>>().cloned() else {
            tracing::error!("nutrition service extension is missing");
            return Err(AuthRejection(crate::api::rest::error::from_parts(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "NUTRITION_INTERNAL",
                "Internal error",
                "Service not configured",
                &instance,
            )));
        };

        let credentials = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_basic);
        let Some((username, password)) = credentials else {
            return Err(AuthRejection(unauthorized(
                messages::LOGIN_FAILED,
                &instance,
            )));
        };

        svc.authenticate(&username, &password)
            .await
            .map(Authenticated)
            .map_err(|e| AuthRejection(map_domain_error(&e, &instance)))
    }
}
