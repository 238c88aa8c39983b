use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
};
use services::AppError;
use services::attendance_service::{AttendanceOutcome, AttendanceSubmission, CheckInRequest};
use services::image_store::ImageUpload;
use services::session_service::CreateSessionRequest;

use super::common::{
    CheckInResponse, GetQrReq, MarkedResponse, QrResponse, StudentSessionsResponse, TeacherSessionsResponse,
};
use crate::auth::{AuthUser, BearerUser};
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{forwarded_ip, non_empty};
use crate::state::AppState;

/// POST /sessions/create
///
/// Creates a session for the authenticated teacher, registers it as live and returns
/// the URL its QR code should encode.
///
/// ### Request Body
/// ```json
/// { "session_id": "S1", "name": "Algebra", "date": "2025-01-01", "time": "09:00",
///   "duration": 60, "location": "-25.75,28.23", "radius": 100, "course": "MTH101", "section": "A" }
/// ```
///
/// ### Responses
/// - `200 OK` with `url` and `session`
/// - `400 Bad Request` on missing fields, a malformed location or a reused `session_id`
/// - `404 Not Found` when the caller has no teacher record
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.caller();
    let created = state.sessions().create_session(&caller, body).await?;

    let message = if caller.demo {
        "Demo session created successfully"
    } else {
        "Session created successfully"
    };
    Ok(Json(ApiResponse::success(created, message)))
}

/// POST /sessions/getSessions
///
/// Every session of the authenticated teacher with its attendance list.
pub async fn get_sessions(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions().teacher_sessions(&claims.caller()).await?;
    Ok(Json(ApiResponse::success(
        TeacherSessionsResponse { sessions },
        "Sessions retrieved",
    )))
}

/// POST /sessions/getQR
///
/// ```json
/// { "session_id": "S1" }
/// ```
pub async fn get_qr(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<GetQrReq>,
) -> Result<impl IntoResponse, ApiError> {
    let url = state
        .sessions()
        .get_qr(&claims.caller(), body.session_id.as_deref())?;
    Ok(Json(ApiResponse::success(QrResponse { url }, "QR generated")))
}

/// POST /sessions/getStudentSessions
///
/// The authenticated student's attendance history.
pub async fn get_student_sessions(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions().student_sessions(&claims.caller()).await?;
    Ok(Json(ApiResponse::success(
        StudentSessionsResponse { sessions },
        "Sessions retrieved",
    )))
}

/// POST /sessions/attend_session
///
/// Multipart form with the fields `session_id`, `teacher_email`, `regno`, `IP`, `Location`,
/// `date` and an `image` file. The student is the authenticated caller.
///
/// ### Responses
/// - `200 OK` `"Attendance marked successfully"` or `"Attendance already marked"`
/// - `400 Bad Request` on missing fields, a malformed location or a missing image
/// - `403 Forbidden` outside the geofence when the reject policy is active
/// - `404 Not Found` for an unknown teacher, session or student
/// - `502`/`504` when the image store fails or stalls
pub async fn attend_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut submission = AttendanceSubmission::default();
    let mut image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_owned();
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
            image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;

        match name.as_str() {
            "session_id" => submission.session_id = value.trim().to_owned(),
            "teacher_email" => submission.teacher_email = value.trim().to_owned(),
            "regno" => submission.regno = non_empty(Some(value)),
            "IP" => submission.ip = value.trim().to_owned(),
            "Location" => submission.location = value.trim().to_owned(),
            "date" => submission.date = value,
            // The identity comes from the token, not the form.
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::Validation("image is required".into()))?;
    if submission.ip.is_empty() {
        submission.ip = forwarded_ip(&headers).unwrap_or_else(|| "unknown".into());
    }

    let (attendance, already_marked, message) = match state
        .attendance()
        .record_attendance(&claims.caller(), submission, image)
        .await?
    {
        AttendanceOutcome::Marked { record, .. } => (record, false, "Attendance marked successfully"),
        AttendanceOutcome::AlreadyMarked(existing) => (existing, true, "Attendance already marked"),
    };

    Ok(Json(ApiResponse::success(
        MarkedResponse {
            attendance,
            already_marked,
        },
        message,
    )))
}

/// POST /sessions/submit-attendance
///
/// Live check-in from a scanned QR payload. Requires a bearer header.
///
/// ```json
/// { "sessionId": "S1", "qrData": "http://localhost:3000/login?session_id=S1&email=t%40x.com" }
/// ```
///
/// ### Responses
/// - `200 OK` with `attendance`
/// - `400 Bad Request` `"Invalid QR code, try again"`
/// - `401 Unauthorized` without a usable bearer token
/// - `404 Not Found` `"Session not found or expired"`
pub async fn submit_attendance(
    State(state): State<AppState>,
    BearerUser(claims): BearerUser,
    Json(body): Json<CheckInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attendance = state.attendance().check_in(&claims.caller(), body).await?;
    Ok(Json(ApiResponse::success(
        CheckInResponse { attendance },
        "Attendance marked successfully",
    )))
}
