//! Item CRUD. Callers without view-all are scoped to their own items.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use postgate_infra::items::Scope;

use crate::app::dto::{self, ItemRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

fn scope_of(principal: &PrincipalContext) -> Scope {
    Scope::for_principal(&principal.principal())
}

fn bad_body(e: JsonRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", e.body_text())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    body: Result<Json<ItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_body(e),
    };

    match services
        .items
        .create(principal.user_id(), body.into(), Utc::now())
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> axum::response::Response {
    match services.items.list(scope_of(&principal)).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.items.get(id, scope_of(&principal)).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    body: Result<Json<ItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_body(e),
    };

    match services
        .items
        .update(id, body.into(), scope_of(&principal), Utc::now())
        .await
    {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.items.delete(id, scope_of(&principal)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_all_items(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> axum::response::Response {
    match services.items.delete_all().await {
        Ok(deleted) => {
            tracing::info!(admin_id = %principal.user_id(), deleted, "item table cleared");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
