pub mod active_sessions;
pub mod attendance_service;
pub mod error;
pub mod geo;
pub mod image_store;
pub mod locks;
pub mod qr;
pub mod session_service;

pub use error::AppError;
