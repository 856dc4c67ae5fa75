use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persists the upload and returns the public reference to it.
    async fn store(&self, upload: &FileUpload) -> ServiceResult<String>;

    /// Removes a previously stored file. Returns `false` when nothing was
    /// removed; never fails.
    async fn delete(&self, reference: &str) -> bool;
}

/// What one kind of upload may contain and where it lands.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub subdir: &'static str,
    pub name_prefix: &'static str,
    pub extensions: &'static [&'static str],
    pub content_types: &'static [&'static str],
    pub max_bytes: usize,
    pub rejection: &'static str,
}

impl UploadPolicy {
    pub fn event_images(max_bytes: usize) -> Self {
        Self {
            subdir: "events",
            name_prefix: "event",
            extensions: &["jpeg", "jpg", "png", "webp"],
            content_types: &["image/jpeg", "image/jpg", "image/png", "image/webp"],
            max_bytes,
            rejection: "Only JPEG, JPG, PNG, and WEBP files are allowed",
        }
    }

    pub fn resumes(max_bytes: usize) -> Self {
        Self {
            subdir: "resumes",
            name_prefix: "resume",
            extensions: &["pdf", "doc", "docx"],
            content_types: &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ],
            max_bytes,
            rejection: "Only PDF, DOC, and DOCX files are allowed",
        }
    }

    /// Returns the lower-cased extension when both the file name and the
    /// declared content type are acceptable.
    pub fn accepts(&self, upload: &FileUpload) -> Option<String> {
        let ext = Path::new(&upload.file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        if !self.extensions.contains(&ext.as_str()) {
            return None;
        }

        let content_type = upload.content_type.as_deref()?;
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.content_types
            .contains(&essence.as_str())
            .then_some(ext)
    }
}

/// Stores files on the local disk under `<root>/<subdir>` and hands out
/// `/uploads/<subdir>/<file>` references, matching what the static file route
/// serves.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    policy: UploadPolicy,
}

impl LocalFileStorage {
    pub const PUBLIC_PREFIX: &'static str = "/uploads/";

    pub fn new(root: impl Into<PathBuf>, policy: UploadPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let file_name = reference
            .strip_prefix(Self::PUBLIC_PREFIX)?
            .strip_prefix(self.policy.subdir)?
            .strip_prefix('/')?;
        let relative = Path::new(file_name);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {
                Some(self.root.join(self.policy.subdir).join(relative))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, upload: &FileUpload) -> ServiceResult<String> {
        let ext = self
            .policy
            .accepts(upload)
            .ok_or_else(|| ServiceError::validation(self.policy.rejection))?;

        if upload.bytes.is_empty() {
            return Err(ServiceError::validation("Uploaded file is empty"));
        }
        if upload.bytes.len() > self.policy.max_bytes {
            return Err(ServiceError::validation(format!(
                "File exceeds the {} byte limit",
                self.policy.max_bytes
            )));
        }

        let dir = self.root.join(self.policy.subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

        let file_name = format!(
            "{}-{}-{}.{}",
            self.policy.name_prefix,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            ext
        );
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        info!("Stored {} ({} bytes)", file_name, upload.bytes.len());

        Ok(format!("{}{}/{}", Self::PUBLIC_PREFIX, self.policy.subdir, file_name))
    }

    async fn delete(&self, reference: &str) -> bool {
        let Some(path) = self.resolve(reference) else {
            warn!("Refusing to delete file outside {} uploads: {}", self.policy.subdir, reference);
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted stored file {}", path.display());
                true
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Stored file already gone: {}", path.display());
                false
            }
            Err(err) => {
                warn!("Failed to delete stored file {}: {}", path.display(), err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file_name: &str, content_type: Option<&str>, bytes: &[u8]) -> FileUpload {
        FileUpload {
            file_name: file_name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_image_policy_checks_extension_and_content_type() {
        let policy = UploadPolicy::event_images(1024);

        assert_eq!(
            policy.accepts(&upload("banner.PNG", Some("image/png"), b"x")),
            Some("png".to_string())
        );
        assert_eq!(
            policy.accepts(&upload("photo.jpeg", Some("image/jpeg"), b"x")),
            Some("jpeg".to_string())
        );
        assert_eq!(policy.accepts(&upload("script.svg", Some("image/svg+xml"), b"x")), None);
        assert_eq!(policy.accepts(&upload("noext", Some("image/png"), b"x")), None);
        assert_eq!(policy.accepts(&upload("fake.png", Some("text/html"), b"x")), None);
        assert_eq!(policy.accepts(&upload("fake.png", None, b"x")), None);
    }

    #[test]
    fn test_resume_policy_accepts_word_documents() {
        let policy = UploadPolicy::resumes(1024);

        assert!(policy.accepts(&upload("cv.pdf", Some("application/pdf"), b"x")).is_some());
        assert!(policy.accepts(&upload("cv.doc", Some("application/msword"), b"x")).is_some());
        assert!(policy
            .accepts(&upload(
                "cv.docx",
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                b"x"
            ))
            .is_some());
        assert!(policy.accepts(&upload("cv.png", Some("image/png"), b"x")).is_none());
    }

    #[tokio::test]
    async fn test_store_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), UploadPolicy::event_images(1024));

        let reference = storage
            .store(&upload("poster.png", Some("image/png"), b"fake-png"))
            .await
            .unwrap();
        assert!(reference.starts_with("/uploads/events/event-"));
        assert!(reference.ends_with(".png"));

        let on_disk = storage.resolve(&reference).unwrap();
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"fake-png");

        assert!(storage.delete(&reference).await);
        assert!(!on_disk.exists());
        assert!(!storage.delete(&reference).await);
    }

    #[tokio::test]
    async fn test_store_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), UploadPolicy::event_images(4));

        let wrong_type = storage
            .store(&upload("resume.pdf", Some("application/pdf"), b"abc"))
            .await;
        assert!(matches!(wrong_type, Err(ServiceError::Validation(_))));

        let spoofed = storage
            .store(&upload("poster.jpg", Some("application/x-msdownload"), b"abc"))
            .await;
        assert!(matches!(spoofed, Err(ServiceError::Validation(_))));

        let too_big = storage
            .store(&upload("poster.jpg", Some("image/jpeg"), b"12345"))
            .await;
        assert!(matches!(too_big, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_stays_inside_its_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), UploadPolicy::resumes(1024));

        assert!(!storage.delete("/uploads/../Cargo.toml").await);
        assert!(!storage.delete("/uploads/resumes/../events/x.png").await);
        assert!(!storage.delete("/uploads/events/event-1.png").await);
        assert!(!storage.delete("/etc/passwd").await);
    }
}
