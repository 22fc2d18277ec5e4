use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::dto::{RegisterUserRequest, UserResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Explicit account creation with a chosen role. Admin-only.
pub async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", e.body_text()),
    };

    match services
        .auth
        .register(&body.username, &body.password, body.role)
        .await
    {
        Ok(account) => {
            tracing::info!(
                admin_id = %principal.user_id(),
                user_id = %account.id,
                role = %account.role,
                "account created by admin"
            );
            (StatusCode::CREATED, Json(UserResponse::from(account))).into_response()
        }
        Err(e) => errors::login_error_to_response(e),
    }
}
