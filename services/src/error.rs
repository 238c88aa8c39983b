use sea_orm::DbErr;
use validator::ValidationErrors;

/// Every failure a core operation can surface. Nothing is retried internally;
/// callers get the message plus a stable [`AppError::kind`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Access Denied")]
    MissingCredentials,

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Location is {distance:.2} m from the session, outside the {radius} m radius")]
    OutsideGeofence { distance: f64, radius: i32 },

    #[error("Database error: {0}")]
    Storage(#[from] DbErr),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Image upload timed out after {0}s")]
    UploadTimeout(u64),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::MissingCredentials => "missing_credentials",
            AppError::Auth(_) => "auth",
            AppError::NotFound(_) => "not_found",
            AppError::OutsideGeofence { .. } => "outside_geofence",
            AppError::Storage(_) => "storage",
            AppError::Upload(_) => "upload",
            AppError::UploadTimeout(_) => "upload_timeout",
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

/// Joins the messages of every failed field, in field-name order.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut messages: Vec<String> = Vec::new();
    for (_, errs) in fields {
        for msg in errs.iter().filter_map(|e| e.message.as_ref()) {
            let msg = msg.to_string();
            if !messages.contains(&msg) {
                messages.push(msg);
            }
        }
    }
    messages.join("; ")
}
