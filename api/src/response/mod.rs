use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::AppError;

/// Standardized JSON envelope for every response.
///
/// The payload's fields sit next to `success` and `message` rather than under a
/// `data` key:
/// ```json
/// { "success": true, "message": "Session created successfully", "url": "...", "session": { ... } }
/// ```
///
/// Errors carry a machine-checkable `kind`:
/// ```json
/// { "success": false, "kind": "not_found", "message": "Teacher not found" }
/// ```
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
            data,
        }
    }
}

/// Payload for responses that carry nothing besides the envelope.
#[derive(Serialize, Default, Debug)]
pub struct Empty {}

/// HTTP face of [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredentials | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OutsideGeofence { .. } => StatusCode::FORBIDDEN,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::UploadTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Something went wrong, please try again".to_owned()
            }
            other => {
                if status.is_server_error() {
                    tracing::warn!(error = %other, kind = other.kind(), "Request failed");
                }
                other.to_string()
            }
        };

        let body = ApiResponse {
            success: false,
            message,
            kind: Some(self.0.kind()),
            data: Empty {},
        };
        (status, Json(body)).into_response()
    }
}
