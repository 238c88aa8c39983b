//! HTTP route entry point.
//!
//! Route groups:
//! - `/health` → health check (public)
//! - `/sessions` → session lifecycle, attendance and the live-session registry

use crate::routes::{health::health_routes, sessions::sessions_routes};
use crate::state::AppState;
use axum::Router;

pub mod common;
pub mod health;
pub mod sessions;

/// Builds the application router with its state attached.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/sessions", sessions_routes())
        .with_state(app_state)
}
