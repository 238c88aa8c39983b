use db::models::{attendance_record, student_session};
use serde::{Deserialize, Serialize};
use services::active_sessions::ActiveSessionEntry;
use services::attendance_service::CheckIn;
use services::session_service::{SessionView, StudentAttendanceView};

#[derive(Debug, Default, Deserialize)]
pub struct GetQrReq {
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentAttendanceQuery {
    pub course: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct TeacherSessionsResponse {
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Serialize)]
pub struct StudentSessionsResponse {
    pub sessions: Vec<student_session::Model>,
}

#[derive(Debug, Serialize)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<ActiveSessionEntry>,
}

#[derive(Debug, Serialize)]
pub struct MarkedResponse {
    pub attendance: attendance_record::Model,
    pub already_marked: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub attendance: CheckIn,
}

#[derive(Debug, Serialize)]
pub struct StudentAttendanceResponse {
    pub attendance: Vec<StudentAttendanceView>,
}
