//! Attendance verification: resolves the scanned session, rejects repeat scans,
//! measures the student's distance and commits the record.

use crate::active_sessions::ActiveSessionRegistry;
use crate::error::AppError;
use crate::geo::{Coordinates, format_distance};
use crate::image_store::{ImageStore, ImageUpload};
use crate::locks::SessionLocks;
use crate::qr;
use crate::session_service::Caller;
use chrono::{DateTime, Utc};
use db::models::attendance_record::{self, NewAttendanceRecord};
use db::models::student_session::{self, NewStudentSession};
use db::models::{session, student, teacher};
use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use util::config;
use validator::Validate;

/// What happens to a scan from outside the session's radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeofencePolicy {
    /// Record it with `within_radius = false`.
    #[default]
    Flag,
    /// Refuse it and write nothing.
    Reject,
}

impl FromStr for GeofencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(Self::Flag),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown geofence policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    pub policy: GeofencePolicy,
    pub upload_timeout: Duration,
    pub demo_mode: bool,
    pub demo_qr_data: String,
}

impl AttendanceSettings {
    pub fn from_config() -> Self {
        let policy = config::geofence_policy().parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to the flag geofence policy");
            GeofencePolicy::Flag
        });

        Self {
            policy,
            upload_timeout: Duration::from_secs(config::upload_timeout_seconds()),
            demo_mode: config::demo_mode(),
            demo_qr_data: config::demo_qr_data(),
        }
    }
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            policy: GeofencePolicy::Flag,
            upload_timeout: Duration::from_secs(30),
            demo_mode: false,
            demo_qr_data: "demo-qr-data".into(),
        }
    }
}

/// One scan as submitted by a student.
#[derive(Debug, Clone, Default, Validate)]
pub struct AttendanceSubmission {
    #[validate(length(min = 1, message = "session_id is required"))]
    pub session_id: String,
    #[validate(length(min = 1, message = "teacher_email is required"))]
    pub teacher_email: String,
    pub regno: Option<String>,
    pub ip: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub enum AttendanceOutcome {
    Marked {
        record: attendance_record::Model,
        summary: student_session::Model,
    },
    /// The identity already has a record for this session. Carries the first one, untouched.
    AlreadyMarked(attendance_record::Model),
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CheckInRequest {
    #[serde(rename = "sessionId", default)]
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
    #[serde(rename = "qrData", default)]
    #[validate(length(min = 1, message = "qrData is required"))]
    pub qr_data: String,
}

/// Confirmation of a live check-in against the registry.
#[derive(Debug, Clone, Serialize)]
pub struct CheckIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub subject: String,
    pub date: String,
    pub time: String,
    pub status: &'static str,
    #[serde(rename = "markedAt")]
    pub marked_at: DateTime<Utc>,
    pub student: String,
}

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseConnection,
    registry: ActiveSessionRegistry,
    images: Arc<dyn ImageStore>,
    locks: SessionLocks,
    settings: AttendanceSettings,
}

impl AttendanceService {
    pub fn new(
        db: DatabaseConnection,
        registry: ActiveSessionRegistry,
        images: Arc<dyn ImageStore>,
        settings: AttendanceSettings,
    ) -> Self {
        Self {
            db,
            registry,
            images,
            locks: SessionLocks::new(),
            settings,
        }
    }

    /// Verifies and commits one scan.
    ///
    /// Scans for the same `(teacher_email, session_id)` run one at a time, so the
    /// duplicate check and the insert cannot interleave. The image is stored before
    /// anything is written; a failed or slow upload aborts the whole scan.
    pub async fn record_attendance(
        &self,
        caller: &Caller,
        submission: AttendanceSubmission,
        image: ImageUpload,
    ) -> Result<AttendanceOutcome, AppError> {
        submission.validate()?;
        let student_at: Coordinates = submission.location.parse()?;
        let regno = submission
            .regno
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned);

        let _guard = self
            .locks
            .acquire(&format!("{}/{}", submission.teacher_email, submission.session_id))
            .await;

        let teacher = teacher::Model::find_by_email(&self.db, &submission.teacher_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Teacher not found".into()))?;
        let session = session::Model::find_for_teacher(&self.db, teacher.id, &submission.session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        if let Some(existing) =
            attendance_record::Model::find_by_identity(&self.db, session.id, regno.as_deref(), Some(caller.email.as_str()))
                .await?
        {
            tracing::info!(
                session_id = %session.session_id,
                student = %caller.email,
                "Attendance already marked"
            );
            return Ok(AttendanceOutcome::AlreadyMarked(existing));
        }

        let student = student::Model::find_by_email(&self.db, &caller.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

        let (distance, within_radius) = self.evaluate_geofence(&session, &student_at)?;

        let timeout = self.settings.upload_timeout;
        let image_ref = tokio::time::timeout(timeout, self.images.upload(image))
            .await
            .map_err(|_| AppError::UploadTimeout(timeout.as_secs()))??;

        let new = NewAttendanceRecord {
            session_pk: session.id,
            regno,
            student_email: Some(caller.email.clone()),
            image: image_ref.clone(),
            date: submission.date,
            ip: submission.ip,
            location: submission.location.trim().to_owned(),
            distance,
            within_radius,
        };
        let committed = self.commit(&session, &teacher, &student, new).await;
        if !matches!(committed, Ok(AttendanceOutcome::Marked { .. })) {
            self.discard_image(&image_ref).await;
        }
        committed
    }

    /// Writes the record and the student's copy in one transaction. A concurrent insert
    /// that wins the unique index turns into [`AttendanceOutcome::AlreadyMarked`].
    async fn commit(
        &self,
        session: &session::Model,
        teacher: &teacher::Model,
        student: &student::Model,
        new: NewAttendanceRecord,
    ) -> Result<AttendanceOutcome, AppError> {
        let txn = self.db.begin().await?;
        let record = match attendance_record::Model::create(&txn, new.clone()).await {
            Ok(record) => record,
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await?;
                return self
                    .already_marked(session.id, new.regno.as_deref(), &student.email)
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        let summary = student_session::Model::create(
            &txn,
            NewStudentSession {
                student_id: student.id,
                session_id: session.session_id.clone(),
                teacher_email: teacher.email.clone(),
                name: session.name.clone(),
                course: session.course.clone(),
                date: session.date.clone(),
                time: session.time.clone(),
                duration: session.duration,
                distance: record.distance.clone(),
                radius: session.radius,
                image: record.image.clone(),
            },
        )
        .await?;
        txn.commit().await?;

        tracing::info!(
            session_id = %session.session_id,
            student = %student.email,
            distance = ?record.distance,
            within_radius = ?record.within_radius,
            "Attendance marked"
        );

        Ok(AttendanceOutcome::Marked { record, summary })
    }

    async fn discard_image(&self, reference: &str) {
        if let Err(e) = self.images.delete(reference).await {
            tracing::warn!(image = reference, error = %e, "Failed to remove unreferenced image");
        }
    }

    /// Distance to the session's registered position, formatted for storage, and whether
    /// it falls inside the radius. Sessions without a position are not geofenced.
    fn evaluate_geofence(
        &self,
        session: &session::Model,
        student_at: &Coordinates,
    ) -> Result<(Option<String>, Option<bool>), AppError> {
        if session.location.trim().is_empty() {
            return Ok((None, None));
        }

        let session_at: Coordinates = session.location.parse()?;
        let metres = session_at.distance_to(student_at);
        let inside = metres <= f64::from(session.radius);

        if !inside {
            tracing::warn!(
                session_id = %session.session_id,
                distance = metres,
                radius = session.radius,
                policy = ?self.settings.policy,
                "Scan outside geofence"
            );
            if self.settings.policy == GeofencePolicy::Reject {
                return Err(AppError::OutsideGeofence {
                    distance: metres,
                    radius: session.radius,
                });
            }
        }

        Ok((Some(format_distance(metres)), Some(inside)))
    }

    async fn already_marked(
        &self,
        session_pk: i64,
        regno: Option<&str>,
        email: &str,
    ) -> Result<AttendanceOutcome, AppError> {
        attendance_record::Model::find_by_identity(&self.db, session_pk, regno, Some(email))
            .await?
            .map(AttendanceOutcome::AlreadyMarked)
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
    }

    /// Live check-in from a scanned QR payload. Confirms presence against the registry
    /// without writing a record.
    pub async fn check_in(&self, caller: &Caller, request: CheckInRequest) -> Result<CheckIn, AppError> {
        request.validate()?;
        let now = self.registry.now();

        if self.settings.demo_mode && request.qr_data == self.settings.demo_qr_data {
            return Ok(CheckIn {
                session_id: request.session_id,
                subject: "Demo Session".into(),
                date: now.format("%Y-%m-%d").to_string(),
                time: now.format("%H:%M").to_string(),
                status: "Present",
                marked_at: now,
                student: caller.email.clone(),
            });
        }

        let invalid = || AppError::Validation("Invalid QR code, try again".into());
        let target = qr::parse_target(&request.qr_data).ok_or_else(invalid)?;
        if target.session_id != request.session_id {
            return Err(invalid());
        }

        let entry = self
            .registry
            .get_session_for(&target.session_id, &target.teacher_email)
            .await
            .ok_or_else(|| AppError::NotFound("Session not found or expired".into()))?;

        tracing::info!(session_id = %entry.session_id, student = %caller.email, "Checked in");

        Ok(CheckIn {
            session_id: entry.session_id,
            subject: entry.subject,
            date: entry.date,
            time: entry.time,
            status: "Present",
            marked_at: now,
            student: caller.email.clone(),
        })
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
