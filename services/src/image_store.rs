//! Storage for attendance proof images.
//!
//! The core only needs a reference string back; where the bytes live is the store's business.

use crate::error::AppError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use util::config;

/// An image as received from the client.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the image and returns the reference to keep on the attendance record.
    async fn upload(&self, image: ImageUpload) -> Result<String, AppError>;

    /// Removes a previously uploaded image. Unknown references are not an error.
    async fn delete(&self, reference: &str) -> Result<(), AppError>;
}

/// Writes images under a local directory. References are paths relative to that root.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config() -> Self {
        Self::new(config::image_storage_root())
    }

    fn extension_for(image: &ImageUpload) -> String {
        let from_name = Path::new(&image.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()));

        from_name.unwrap_or_else(|| match image.content_type.as_deref() {
            Some("image/png") => "png".into(),
            Some("image/webp") => "webp".into(),
            Some("image/gif") => "gif".into(),
            _ => "jpg".into(),
        })
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, AppError> {
        if image.bytes.is_empty() {
            return Err(AppError::Upload("image is empty".into()));
        }

        let dir = self.root.join("attendance");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), Self::extension_for(&image));
        tokio::fs::write(dir.join(&name), &image.bytes)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        tracing::debug!(file = %name, bytes = image.bytes.len(), "Stored attendance image");
        Ok(format!("attendance/{name}"))
    }

    async fn delete(&self, reference: &str) -> Result<(), AppError> {
        let path = Path::new(reference);
        if path.is_absolute() || path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(AppError::Upload(format!("refusing to delete '{reference}'")));
        }

        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Upload(e.to_string())),
        }
    }
}
