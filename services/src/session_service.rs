//! Session lifecycle: creation, QR targets and the read views teachers and students use.

use crate::active_sessions::{ActiveSessionEntry, ActiveSessionRegistry};
use crate::error::AppError;
use crate::geo::Coordinates;
use crate::qr;
use db::models::{attendance_record, session, student, student_session, teacher};
use db::models::session::SessionFields;
use sea_orm::{DatabaseConnection, SqlErr};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use util::config;
use validator::Validate;

pub const DEFAULT_DURATION_MINUTES: i32 = 60;
pub const DEFAULT_RADIUS_METRES: i32 = 100;
pub const DEMO_INSTRUCTOR: &str = "Demo Teacher";

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub email: String,
    pub name: Option<String>,
    /// Set only when the access gate accepted the configured demo token.
    pub demo: bool,
}

impl Caller {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            demo: false,
        }
    }
}

/// Numbers arrive from HTML forms as strings as often as not.
fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<NumOrText>::deserialize(deserializer)? {
        Some(NumOrText::Num(n)) => i32::try_from(n).ok(),
        Some(NumOrText::Float(f)) if f.is_finite() => Some(f.round() as i32),
        Some(NumOrText::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(
        required(message = "session_id is required"),
        length(min = 1, message = "session_id is required")
    )]
    pub session_id: Option<String>,

    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name is required")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "date is required"),
        length(min = 1, message = "date is required")
    )]
    pub date: Option<String>,

    #[validate(
        required(message = "time is required"),
        length(min = 1, message = "time is required")
    )]
    pub time: Option<String>,

    #[serde(default, deserialize_with = "lenient_i32")]
    pub duration: Option<i32>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub radius: Option<i32>,
    pub course: Option<String>,
    pub section: Option<String>,
}

impl CreateSessionRequest {
    /// Validates and fills defaults. Nothing is touched on failure.
    pub fn into_fields(self) -> Result<SessionFields, AppError> {
        self.validate()?;

        let location = self.location.unwrap_or_default().trim().to_owned();
        if !location.is_empty() {
            location.parse::<Coordinates>()?;
        }

        Ok(SessionFields {
            session_id: self.session_id.unwrap_or_default().trim().to_owned(),
            name: self.name.unwrap_or_default(),
            course: self.course.unwrap_or_default(),
            section: self.section.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            time: self.time.unwrap_or_default(),
            duration: self
                .duration
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DURATION_MINUTES),
            location,
            radius: self.radius.filter(|r| *r > 0).unwrap_or(DEFAULT_RADIUS_METRES),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub url: String,
    pub session: ActiveSessionEntry,
}

/// A teacher's session together with its attendance list.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: session::Model,
    pub attendance: Vec<attendance_record::Model>,
}

/// One line of a student's attendance history.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendanceView {
    pub session_id: String,
    pub subject: String,
    pub course: String,
    pub teacher_email: String,
    pub date: String,
    pub time: String,
    pub status: &'static str,
    pub marked_at: chrono::DateTime<chrono::Utc>,
    pub distance: Option<String>,
    pub radius: i32,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub client_url: String,
    pub demo_mode: bool,
}

impl SessionSettings {
    pub fn from_config() -> Self {
        Self {
            client_url: config::client_url(),
            demo_mode: config::demo_mode(),
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    db: DatabaseConnection,
    registry: ActiveSessionRegistry,
    settings: SessionSettings,
}

impl SessionService {
    pub fn new(db: DatabaseConnection, registry: ActiveSessionRegistry, settings: SessionSettings) -> Self {
        Self {
            db,
            registry,
            settings,
        }
    }

    fn is_demo(&self, caller: &Caller) -> bool {
        self.settings.demo_mode && caller.demo
    }

    pub fn qr_url(&self, session_id: &str, teacher_email: &str) -> Result<String, AppError> {
        qr::target_url(&self.settings.client_url, session_id, teacher_email)
            .map_err(|e| AppError::Validation(format!("Invalid client URL '{}': {e}", self.settings.client_url)))
    }

    async fn teacher(&self, email: &str) -> Result<teacher::Model, AppError> {
        teacher::Model::find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| AppError::NotFound("Teacher not found".into()))
    }

    async fn student(&self, email: &str) -> Result<student::Model, AppError> {
        student::Model::find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".into()))
    }

    /// Persists a new session for the caller, mirrors it into the registry and returns
    /// the QR target plus the live projection.
    ///
    /// In demo mode a demo caller skips persistence and only gets the registry entry.
    pub async fn create_session(
        &self,
        caller: &Caller,
        request: CreateSessionRequest,
    ) -> Result<CreatedSession, AppError> {
        let fields = request.into_fields()?;
        let url = self.qr_url(&fields.session_id, &caller.email)?;

        if self.is_demo(caller) {
            let session = self
                .registry
                .add_active_session(&fields, &caller.email, DEMO_INSTRUCTOR)
                .await;
            tracing::info!(session_id = %fields.session_id, "Demo session created");
            return Ok(CreatedSession { url, session });
        }

        let teacher = self.teacher(&caller.email).await?;

        if session::Model::find_for_teacher(&self.db, teacher.id, &fields.session_id)
            .await?
            .is_some()
        {
            return Err(duplicate_session(&fields.session_id));
        }

        session::Model::create(&self.db, teacher.id, &fields)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_session(&fields.session_id),
                _ => AppError::from(e),
            })?;

        let instructor = if teacher.name.trim().is_empty() {
            "Teacher"
        } else {
            teacher.name.as_str()
        };
        let session = self
            .registry
            .add_active_session(&fields, &teacher.email, instructor)
            .await;

        tracing::info!(
            session_id = %fields.session_id,
            teacher = %teacher.email,
            radius = fields.radius,
            "Session created"
        );

        Ok(CreatedSession { url, session })
    }

    pub fn get_qr(&self, caller: &Caller, session_id: Option<&str>) -> Result<String, AppError> {
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("session_id is required".into()))?;
        self.qr_url(session_id, &caller.email)
    }

    /// Every session the caller owns, oldest first, each with its attendance list.
    pub async fn teacher_sessions(&self, caller: &Caller) -> Result<Vec<SessionView>, AppError> {
        if self.is_demo(caller) {
            return Ok(self
                .registry
                .get_active_sessions()
                .await
                .into_iter()
                .filter(|e| e.teacher_email == caller.email)
                .map(|e| SessionView {
                    session: session::Model {
                        id: 0,
                        teacher_id: 0,
                        session_id: e.session_id,
                        name: e.name,
                        course: e.course,
                        section: e.section,
                        date: e.date,
                        time: e.time,
                        duration: e.duration,
                        location: e.location,
                        radius: e.radius,
                        created_at: e.created_at,
                    },
                    attendance: Vec::new(),
                })
                .collect());
        }

        let teacher = self.teacher(&caller.email).await?;
        let sessions = session::Model::list_for_teacher(&self.db, teacher.id).await?;
        let pks: Vec<i64> = sessions.iter().map(|s| s.id).collect();

        let mut by_session: HashMap<i64, Vec<attendance_record::Model>> = HashMap::new();
        for record in attendance_record::Model::list_for_sessions(&self.db, &pks).await? {
            by_session.entry(record.session_pk).or_default().push(record);
        }

        Ok(sessions
            .into_iter()
            .map(|s| SessionView {
                attendance: by_session.remove(&s.id).unwrap_or_default(),
                session: s,
            })
            .collect())
    }

    /// The caller's own attendance history as stored on the student record.
    pub async fn student_sessions(&self, caller: &Caller) -> Result<Vec<student_session::Model>, AppError> {
        let student = self.student(&caller.email).await?;
        Ok(student_session::Model::list_for_student(&self.db, student.id).await?)
    }

    /// History filtered by course. `None`, empty or `"all"` disables the filter; otherwise
    /// a case-insensitive substring match against the course code or session name.
    pub async fn student_attendance(
        &self,
        caller: &Caller,
        course: Option<&str>,
    ) -> Result<Vec<StudentAttendanceView>, AppError> {
        let filter = course
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty() && c != "all");

        Ok(self
            .student_sessions(caller)
            .await?
            .into_iter()
            .filter(|s| match &filter {
                Some(f) => s.course.to_lowercase().contains(f) || s.name.to_lowercase().contains(f),
                None => true,
            })
            .map(|s| StudentAttendanceView {
                session_id: s.session_id,
                subject: s.name,
                course: s.course,
                teacher_email: s.teacher_email,
                date: s.date,
                time: s.time,
                status: "Present",
                marked_at: s.created_at,
                distance: s.distance,
                radius: s.radius,
            })
            .collect())
    }
}

fn duplicate_session(session_id: &str) -> AppError {
    AppError::Validation(format!("Session '{session_id}' already exists"))
}
