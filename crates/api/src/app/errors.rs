use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use postgate_auth::{AuthzError, LoginError};
use postgate_core::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden => StatusCode::FORBIDDEN,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = status_for(&err);
    let message = match &err {
        // Backend details stay in the logs.
        DomainError::Unavailable(detail) => {
            tracing::error!(error = %detail, "backend unavailable");
            "service temporarily unavailable".to_string()
        }
        other => other.to_string(),
    };
    json_error(status, err.code(), message)
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    domain_error_to_response(err.into())
}

pub fn login_error_to_response(err: LoginError) -> axum::response::Response {
    match err {
        LoginError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        other => domain_error_to_response(other.into()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
