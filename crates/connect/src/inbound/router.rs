use std::sync::Arc;

use app_core::jwt::TokenManager;
use app_core::middleware::optional_auth;
use axum::routing::post;
use axum::{Router, middleware};

use crate::inbound::http::connect::*;
use crate::inbound::state::ConnectState;

pub fn create_router(state: ConnectState, tm: Arc<dyn TokenManager>) -> Router {
    Router::new()
        .route("/facebook/connect", post(connect))
        .route_layer(middleware::from_fn_with_state(tm, optional_auth))
        .with_state(state)
}
