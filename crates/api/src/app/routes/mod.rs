use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use postgate_auth::{Capability, Requirement};

use crate::app::services::AppServices;
use crate::middleware::{GateState, gate_middleware};

pub mod admin;
pub mod auth;
pub mod content;
pub mod items;
pub mod system;

const VIEW: Requirement = Requirement::new(Capability::View);
const CREATE: Requirement = Requirement::new(Capability::Create);
const UPDATE: Requirement = Requirement::new(Capability::Update);
const DELETE: Requirement = Requirement::new(Capability::Delete);
const DELETE_ALL: Requirement = Requirement::admin_only(Capability::Delete);
const VIEW_ADMIN: Requirement = Requirement::admin_only(Capability::View);
const REGISTER: Requirement = Requirement::admin_only(Capability::Create);

/// Router for every gated endpoint. Each method carries its own requirement.
pub fn router(services: &Arc<AppServices>) -> Router {
    Router::new()
        .route(
            "/whoami",
            get(system::whoami).route_layer(from_fn_with_state(GateState::new(services, VIEW), gate_middleware)),
        )
        .route(
            "/items",
            post(items::create_item).route_layer(from_fn_with_state(GateState::new(services, CREATE), gate_middleware)),
        )
        .route(
            "/items",
            get(items::list_items).route_layer(from_fn_with_state(GateState::new(services, VIEW), gate_middleware)),
        )
        .route(
            "/items",
            delete(items::delete_all_items)
                .route_layer(from_fn_with_state(GateState::new(services, DELETE_ALL), gate_middleware)),
        )
        .route(
            "/items/:id",
            get(items::get_item).route_layer(from_fn_with_state(GateState::new(services, VIEW), gate_middleware)),
        )
        .route(
            "/items/:id",
            put(items::update_item).route_layer(from_fn_with_state(GateState::new(services, UPDATE), gate_middleware)),
        )
        .route(
            "/items/:id",
            delete(items::delete_item).route_layer(from_fn_with_state(GateState::new(services, DELETE), gate_middleware)),
        )
        .route(
            "/content/user",
            get(content::user_content).route_layer(from_fn_with_state(GateState::new(services, VIEW), gate_middleware)),
        )
        .route(
            "/content/admin",
            get(content::admin_content)
                .route_layer(from_fn_with_state(GateState::new(services, VIEW_ADMIN), gate_middleware)),
        )
        .route(
            "/admin/users",
            post(admin::register_user)
                .route_layer(from_fn_with_state(GateState::new(services, REGISTER), gate_middleware)),
        )
}
