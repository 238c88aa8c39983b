use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use super::common::{ActiveSessionsResponse, StudentAttendanceQuery, StudentAttendanceResponse};
use crate::auth::BearerUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// GET /sessions/active-sessions
///
/// Sessions students can currently discover, oldest first. Expired entries are
/// dropped before answering.
///
/// ```json
/// { "success": true, "message": "Active sessions retrieved", "sessions": [ { "session_id": "S1", "subject": "Algebra", "isActive": true, ... } ] }
/// ```
pub async fn get_active_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.registry().get_active_sessions().await;
    Json(ApiResponse::success(
        ActiveSessionsResponse { sessions },
        "Active sessions retrieved",
    ))
}

/// GET /sessions/active-sessions/stats
///
/// ```json
/// { "success": true, "message": "Active session stats", "total": 2, "active": 1, "expired": 1 }
/// ```
pub async fn get_active_session_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.registry().get_session_stats().await;
    Json(ApiResponse::success(stats, "Active session stats"))
}

/// GET /sessions/student-attendance?course=MTH
///
/// The caller's attendance history, optionally filtered by course. Requires a bearer header.
///
/// ### Responses
/// - `200 OK` with `attendance: [...]`
/// - `401 Unauthorized` without a usable bearer token
/// - `404 Not Found` when the caller has no student record
pub async fn get_student_attendance(
    State(state): State<AppState>,
    BearerUser(claims): BearerUser,
    Query(query): Query<StudentAttendanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let attendance = state
        .sessions()
        .student_attendance(&claims.caller(), query.course.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(
        StudentAttendanceResponse { attendance },
        "Attendance retrieved",
    )))
}
