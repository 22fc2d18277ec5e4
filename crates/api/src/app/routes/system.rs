use axum::{Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::WhoAmIResponse;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(principal: PrincipalContext) -> impl IntoResponse {
    Json(WhoAmIResponse::from(&principal))
}
