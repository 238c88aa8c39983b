//! In-process registry of sessions students can currently discover.
//!
//! The registry is a projection of persisted sessions with a fixed lifetime. Losing it
//! (for instance on restart) loses live-session discoverability, never attendance data.
//!
//! Two mechanisms retire entries and may overlap freely:
//! - a one-shot task per entry that removes it once its lifetime elapses
//! - a periodic sweep ([`ActiveSessionRegistry::spawn_sweeper`]) dropping anything inactive or expired
//!
//! Reads never trust either mechanism and re-check liveness against the injected clock.

use chrono::{DateTime, Duration, Utc};
use db::models::session::SessionFields;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use util::clock::Clock;

/// Default lifetime of a registry entry.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// A live session as students see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSessionEntry {
    pub session_id: String,
    pub name: String,
    pub course: String,
    pub section: String,
    pub date: String,
    pub time: String,
    pub duration: i32,
    pub location: String,
    pub radius: i32,
    pub teacher_email: String,
    pub subject: String,
    pub instructor: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(skip)]
    generation: u64,
}

impl ActiveSessionEntry {
    /// Projects persisted session fields into a registry entry stamped at `created_at`.
    pub fn project(
        fields: &SessionFields,
        teacher_email: &str,
        instructor: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            session_id: fields.session_id.clone(),
            name: fields.name.clone(),
            course: fields.course.clone(),
            section: fields.section.clone(),
            date: fields.date.clone(),
            time: fields.time.clone(),
            duration: fields.duration,
            location: fields.location.clone(),
            radius: fields.radius,
            teacher_email: teacher_email.to_owned(),
            subject: fields.name.clone(),
            instructor: instructor.to_owned(),
            created_at,
            expires_at: created_at + ttl,
            is_active: true,
            generation: 0,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

struct Inner {
    entries: RwLock<Vec<ActiveSessionEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    next_generation: AtomicU64,
}

impl Inner {
    async fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.is_live(now));
        before - entries.len()
    }

    /// Removes exactly the entry a timer was scheduled for. A re-registration under the
    /// same `session_id` carries a newer generation and is left alone.
    async fn expire(&self, session_id: &str, generation: u64) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !(e.session_id == session_id && e.generation == generation));
        if entries.len() < before {
            tracing::info!(session_id, "Active session expired");
        }
    }
}

/// Shared handle to the registry. Clones refer to the same store.
#[derive(Clone)]
pub struct ActiveSessionRegistry {
    inner: Arc<Inner>,
}

impl ActiveSessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(Vec::new()),
                clock,
                ttl,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Registers a session as live for the configured lifetime and schedules its removal.
    pub async fn add_active_session(
        &self,
        fields: &SessionFields,
        teacher_email: &str,
        instructor: &str,
    ) -> ActiveSessionEntry {
        let mut entry =
            ActiveSessionEntry::project(fields, teacher_email, instructor, self.now(), self.inner.ttl);
        entry.generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        self.inner.entries.write().await.push(entry.clone());
        tracing::info!(
            session_id = %entry.session_id,
            subject = %entry.subject,
            expires_at = %entry.expires_at,
            "Active session added"
        );

        self.schedule_expiry(entry.session_id.clone(), entry.generation);
        entry
    }

    fn schedule_expiry(&self, session_id: String, generation: u64) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.ttl.to_std().unwrap_or_default();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(&session_id, generation).await;
            }
        });
    }

    /// Live entries in insertion order. Drops everything inactive or expired first.
    pub async fn get_active_sessions(&self) -> Vec<ActiveSessionEntry> {
        self.inner.prune().await;
        self.inner.entries.read().await.clone()
    }

    pub async fn get_session_by_id(&self, session_id: &str) -> Option<ActiveSessionEntry> {
        let now = self.now();
        self.inner
            .entries
            .read()
            .await
            .iter()
            .find(|e| e.session_id == session_id && e.is_live(now))
            .cloned()
    }

    /// Live entry for one teacher's session. Ids only need to be unique per teacher.
    pub async fn get_session_for(&self, session_id: &str, teacher_email: &str) -> Option<ActiveSessionEntry> {
        let now = self.now();
        self.inner
            .entries
            .read()
            .await
            .iter()
            .find(|e| e.session_id == session_id && e.teacher_email == teacher_email && e.is_live(now))
            .cloned()
    }

    /// Soft-deletes every entry with this id. Returns whether any entry was present,
    /// so repeating the call is harmless.
    pub async fn remove_active_session(&self, session_id: &str) -> bool {
        let mut entries = self.inner.entries.write().await;
        let mut found = false;
        for entry in entries.iter_mut().filter(|e| e.session_id == session_id) {
            entry.is_active = false;
            found = true;
        }
        if found {
            tracing::info!(session_id, "Active session removed");
        }
        found
    }

    pub async fn clear_all_active_sessions(&self) {
        self.inner.entries.write().await.clear();
        tracing::info!("All active sessions cleared");
    }

    pub async fn get_session_stats(&self) -> SessionStats {
        let now = self.now();
        let entries = self.inner.entries.read().await;
        let total = entries.len();
        let active = entries.iter().filter(|e| e.is_live(now)).count();
        SessionStats {
            total,
            active,
            expired: total - active,
        }
    }

    /// One sweep pass. Returns how many entries were dropped.
    pub async fn sweep(&self) -> usize {
        let removed = self.inner.prune().await;
        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Runs [`sweep`](Self::sweep) every `period` until the registry is dropped.
    pub fn spawn_sweeper(&self, period: std::time::Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let registry = ActiveSessionRegistry { inner };
                registry.sweep().await;
            }
        })
    }
}
