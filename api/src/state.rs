use chrono::Duration;
use sea_orm::DatabaseConnection;
use services::active_sessions::ActiveSessionRegistry;
use services::attendance_service::{AttendanceService, AttendanceSettings};
use services::image_store::{ImageStore, LocalImageStore};
use services::session_service::{SessionService, SessionSettings};
use std::sync::Arc;
use util::clock::Clock;
use util::config;

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    registry: ActiveSessionRegistry,
    sessions: SessionService,
    attendance: AttendanceService,
}

impl AppState {
    /// Builds the registry, image store and services from the global config.
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::minutes(config::active_session_ttl_minutes() as i64);
        let registry = ActiveSessionRegistry::with_ttl(clock, ttl);
        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::from_config());
        Self::from_parts(db, registry, images)
    }

    pub fn from_parts(
        db: DatabaseConnection,
        registry: ActiveSessionRegistry,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let sessions = SessionService::new(db.clone(), registry.clone(), SessionSettings::from_config());
        let attendance = AttendanceService::new(
            db,
            registry.clone(),
            images,
            AttendanceSettings::from_config(),
        );

        Self {
            registry,
            sessions,
            attendance,
        }
    }

    pub fn registry(&self) -> &ActiveSessionRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    pub fn attendance(&self) -> &AttendanceService {
        &self.attendance
    }
}
