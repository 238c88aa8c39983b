//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Free functions at the bottom of this module (`config::host()`, `config::jwt_secret()`, ...)
//! are the intended read path for the rest of the workspace.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub client_url: String,
    pub image_storage_root: String,
    pub upload_timeout_seconds: u64,
    pub active_session_ttl_minutes: u64,
    pub active_session_sweep_seconds: u64,
    pub geofence_policy: String,
    pub demo_mode: bool,
    pub demo_token: String,
    pub demo_email: String,
    pub demo_qr_data: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default so the singleton can always be built. `JWT_SECRET`
    /// defaults to an empty string, which the server refuses at startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "geo-attend"),
            log_level: var_or("LOG_LEVEL", "api=info,services=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: var_or("LOG_TO_STDOUT", "false") == "true",
            database_path: var_or("DATABASE_PATH", "data/geo_attend.db"),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 5000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", 300),
            client_url: var_or("CLIENT_URL", "http://localhost:3000"),
            image_storage_root: var_or("IMAGE_STORAGE_ROOT", "data/attendance_images"),
            upload_timeout_seconds: parse_or("UPLOAD_TIMEOUT_SECONDS", 30),
            active_session_ttl_minutes: parse_or("ACTIVE_SESSION_TTL_MINUTES", 30),
            active_session_sweep_seconds: parse_or("ACTIVE_SESSION_SWEEP_SECONDS", 300),
            geofence_policy: var_or("GEOFENCE_POLICY", "flag"),
            demo_mode: var_or("DEMO_MODE", "false") == "true",
            demo_token: var_or("DEMO_TOKEN", "demo-token-for-development"),
            demo_email: var_or("DEMO_EMAIL", "demo@teacher.com"),
            demo_qr_data: var_or("DEMO_QR_DATA", "demo-qr-data"),
            cors_allowed_origins: var_or(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000,http://localhost:3001",
            )
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_client_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.client_url = value.into());
    }

    pub fn set_image_storage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.image_storage_root = value.into());
    }

    pub fn set_upload_timeout_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.upload_timeout_seconds = value);
    }

    pub fn set_geofence_policy(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.geofence_policy = value.into());
    }

    pub fn set_demo_mode(value: bool) {
        AppConfig::set_field(|cfg| cfg.demo_mode = value);
    }

    pub fn set_demo_token(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.demo_token = value.into());
    }

    pub fn set_demo_email(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.demo_email = value.into());
    }
}

// --- Read accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn client_url() -> String {
    AppConfig::global().client_url.clone()
}

pub fn image_storage_root() -> String {
    AppConfig::global().image_storage_root.clone()
}

pub fn upload_timeout_seconds() -> u64 {
    AppConfig::global().upload_timeout_seconds
}

pub fn active_session_ttl_minutes() -> u64 {
    AppConfig::global().active_session_ttl_minutes
}

pub fn active_session_sweep_seconds() -> u64 {
    AppConfig::global().active_session_sweep_seconds
}

pub fn geofence_policy() -> String {
    AppConfig::global().geofence_policy.clone()
}

pub fn demo_mode() -> bool {
    AppConfig::global().demo_mode
}

pub fn demo_token() -> String {
    AppConfig::global().demo_token.clone()
}

pub fn demo_email() -> String {
    AppConfig::global().demo_email.clone()
}

pub fn demo_qr_data() -> String {
    AppConfig::global().demo_qr_data.clone()
}

pub fn cors_allowed_origins() -> Vec<String> {
    AppConfig::global().cors_allowed_origins.clone()
}
