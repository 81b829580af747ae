//! Operator API: service status and table cache inspection.
//!
//! Every route requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache/{hash}", get(get_cache).delete(flush_cache))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
