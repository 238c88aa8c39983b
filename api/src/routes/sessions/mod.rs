//! `/sessions` route group.
//!
//! Cookie-or-bearer protected (through [`allow_authenticated`]):
//! - `POST /create`, `POST /getSessions`, `POST /getQR`, `POST /attend_session`, `POST /getStudentSessions`
//!
//! Public:
//! - `GET /active-sessions`, `GET /active-sessions/stats`
//!
//! Bearer header only (checked in the handler):
//! - `POST /submit-attendance`, `GET /student-attendance`

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};

use crate::auth::guards::allow_authenticated;
use crate::state::AppState;

mod common;
mod get;
mod post;

pub use get::{get_active_session_stats, get_active_sessions, get_student_attendance};
pub use post::{attend_session, create_session, get_qr, get_sessions, get_student_sessions, submit_attendance};

/// Upper bound for an attendance upload, image included.
pub const MAX_ATTENDANCE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn sessions_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/create", post(create_session))
        .route("/getSessions", post(get_sessions))
        .route("/getQR", post(get_qr))
        .route(
            "/attend_session",
            post(attend_session).layer(DefaultBodyLimit::max(MAX_ATTENDANCE_UPLOAD_BYTES)),
        )
        .route("/getStudentSessions", post(get_student_sessions))
        .route_layer(from_fn(allow_authenticated));

    Router::new()
        .merge(protected)
        .route("/active-sessions", get(get_active_sessions))
        .route("/active-sessions/stats", get(get_active_session_stats))
        .route("/submit-attendance", post(submit_attendance))
        .route("/student-attendance", get(get_student_attendance))
}
