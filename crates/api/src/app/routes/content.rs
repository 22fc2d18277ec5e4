//! Role-dependent static content.

use axum::{Json, response::IntoResponse};

use crate::app::dto::ContentResponse;

pub async fn user_content() -> impl IntoResponse {
    Json(ContentResponse {
        content: "This is user-level content",
    })
}

pub async fn admin_content() -> impl IntoResponse {
    Json(ContentResponse {
        content: "This is admin-level content",
    })
}
