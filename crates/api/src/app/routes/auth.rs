//! Login and logout. Both routes sit outside the gate.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use crate::app::dto::{LoginRequest, LoginResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::cookies;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", e.body_text()),
    };

    let session = match services
        .auth
        .login(&body.username, &body.password, Utc::now())
        .await
    {
        Ok(s) => s,
        Err(e) => return errors::login_error_to_response(e),
    };

    let Some(cookie) = cookies::issue(session.token.as_str(), services.cookie) else {
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "failed to encode session cookie",
        );
    };

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            role: session.role,
            token: session.token.as_str().to_string(),
        }),
    )
        .into_response()
}

/// Revoke the cookie's session (if any) and expire the cookie. Idempotent.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = cookies::session_token(&headers) {
        if let Err(e) = services.auth.logout(token).await {
            return errors::login_error_to_response(e);
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookies::expire(services.cookie))],
    )
        .into_response()
}
