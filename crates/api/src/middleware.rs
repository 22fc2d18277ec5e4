use std::sync::Arc;

use axum::{
    extract::State,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use postgate_auth::Requirement;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::cookies;

/// State for one gated route: the services plus what the route demands.
#[derive(Clone)]
pub struct GateState {
    pub services: Arc<AppServices>,
    pub requirement: Requirement,
}

impl GateState {
    pub fn new(services: &Arc<AppServices>, requirement: Requirement) -> Self {
        Self {
            services: Arc::clone(services),
            requirement,
        }
    }
}

/// Authorization gate in front of a protected handler.
///
/// 401 for a missing/unknown/expired session, 403 when the role lacks the
/// requirement, 503 when the session store is down. The handler only runs
/// once admitted, with a [`PrincipalContext`] in the request extensions.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = cookies::session_token(req.headers());

    let session = match state
        .services
        .gate
        .admit(token, state.requirement, Utc::now())
        .await
    {
        Ok(session) => session,
        Err(e) => return errors::authz_error_to_response(e),
    };

    req.extensions_mut()
        .insert(PrincipalContext::from_session(session));

    next.run(req).await
}
