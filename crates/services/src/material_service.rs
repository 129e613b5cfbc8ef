use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{Material, MaterialDraft, MaterialError, MaterialId, MediaType, UserId};
use storage::repository::MaterialRepository;
use tracing::{info, warn};

use crate::Clock;
use crate::error::MaterialServiceError;
use crate::extraction::TextExtractor;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A file the user wants to turn into a material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub source_path: PathBuf,
    pub original_name: String,
    /// Declared MIME type; guessed from the file extension when absent.
    pub mime_type: Option<String>,
}

impl Upload {
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let source_path = path.into();
        let original_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_path,
            original_name,
            mime_type: None,
        }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    fn media_type(&self) -> Result<MediaType, MaterialError> {
        match &self.mime_type {
            Some(mime) => MediaType::parse(mime),
            None => Path::new(&self.original_name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(MediaType::from_extension)
                .ok_or_else(|| MaterialError::UnsupportedMediaType(self.original_name.clone())),
        }
    }
}

/// Stores uploads and extracts their text.
#[derive(Clone)]
pub struct MaterialService {
    clock: Clock,
    upload_dir: PathBuf,
    materials: Arc<dyn MaterialRepository>,
    extractor: Arc<dyn TextExtractor>,
}

impl MaterialService {
    #[must_use]
    pub fn new(
        clock: Clock,
        upload_dir: impl Into<PathBuf>,
        materials: Arc<dyn MaterialRepository>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            clock,
            upload_dir: upload_dir.into(),
            materials,
            extractor,
        }
    }

    /// Copy the upload into the upload directory, record it, then extract
    /// its text.
    ///
    /// Extraction failures do not fail the call: the material is returned
    /// with status `failed`. Any other failure leaves neither a stored file
    /// nor a material row behind.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Material` for an unsupported media type,
    /// `TooLarge` above [`MAX_UPLOAD_BYTES`], `Io` if the file cannot be
    /// copied, and `Storage` if persistence fails.
    pub async fn register(
        &self,
        user_id: UserId,
        upload: Upload,
    ) -> Result<Material, MaterialServiceError> {
        let media_type = upload.media_type()?;
        let size = tokio::fs::metadata(&upload.source_path).await?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(MaterialServiceError::TooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let id = MaterialId::new();
        let stored_name = id.to_string();
        let stored_path = self.upload_dir.join(&stored_name);
        let draft = MaterialDraft {
            user_id,
            name: stored_name,
            original_name: upload.original_name,
            file_path: stored_path.to_string_lossy().into_owned(),
            file_size: size,
            media_type,
        };
        let mut material = draft.validate(id, self.clock.now())?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        if let Err(e) = tokio::fs::copy(&upload.source_path, &stored_path).await {
            discard_upload(id, &stored_path).await;
            return Err(e.into());
        }
        if let Err(e) = self.materials.insert_material(&material).await {
            discard_upload(id, &stored_path).await;
            return Err(e.into());
        }

        match self.extractor.extract(&stored_path, media_type).await {
            Ok(text) => {
                info!(material = %id, chars = text.chars().count(), "extracted material text");
                material.mark_processed(text);
            }
            Err(e) => {
                warn!(material = %id, error = %e, "text extraction failed");
                material.mark_failed();
            }
        }
        if let Err(e) = self.materials.update_material(&material).await {
            if let Err(cleanup) = self.materials.delete_material(id).await {
                warn!(material = %id, error = %cleanup, "could not remove material row");
            }
            discard_upload(id, &stored_path).await;
            return Err(e.into());
        }

        Ok(material)
    }

    /// Materials owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::Storage` if repository access fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Material>, MaterialServiceError> {
        Ok(self.materials.list_materials(user_id).await?)
    }

    /// Fetch a material owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if it is missing or owned by
    /// someone else.
    pub async fn get(
        &self,
        user_id: UserId,
        id: MaterialId,
    ) -> Result<Material, MaterialServiceError> {
        self.materials
            .get_material(id)
            .await?
            .filter(|m| m.user_id() == user_id)
            .ok_or(MaterialServiceError::NotFound)
    }

    /// Delete a material and its stored file. Quizzes built from it remain.
    ///
    /// # Errors
    ///
    /// Returns `MaterialServiceError::NotFound` if it is missing or owned by
    /// someone else.
    pub async fn delete(&self, user_id: UserId, id: MaterialId) -> Result<(), MaterialServiceError> {
        let material = self.get(user_id, id).await?;
        if !self.materials.delete_material(id).await? {
            return Err(MaterialServiceError::NotFound);
        }
        if let Err(e) = tokio::fs::remove_file(material.file_path()).await {
            warn!(material = %id, error = %e, "could not remove stored upload");
        }
        Ok(())
    }
}

async fn discard_upload(id: MaterialId, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(material = %id, error = %e, "could not remove stored upload"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use quiz_core::model::MaterialStatus;
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    use super::*;
    use crate::extraction::FileTextExtractor;

    fn service(dir: &Path) -> MaterialService {
        MaterialService::new(
            Clock::fixed(fixed_now()),
            dir.join("uploads"),
            Arc::new(InMemoryRepository::new()),
            Arc::new(FileTextExtractor),
        )
    }

    fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn text_upload_is_processed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let me = UserId::new();
        let path = write_file(dir.path(), "cells.txt", "Cells divide by mitosis.");

        let material = svc.register(me, Upload::from_path(&path)).await.unwrap();
        assert_eq!(material.status(), MaterialStatus::Processed);
        assert_eq!(material.usable_text(), Some("Cells divide by mitosis."));
        assert_eq!(material.original_name(), "cells.txt");
        assert_eq!(material.file_size(), 24);
        assert!(Path::new(material.file_path()).exists());

        let listed = svc.list(me).await.unwrap();
        assert_eq!(listed, vec![material]);
    }

    #[tokio::test]
    async fn pdf_upload_is_stored_but_failed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let path = write_file(dir.path(), "scan.pdf", "%PDF-1.4");

        let material = svc
            .register(UserId::new(), Upload::from_path(&path))
            .await
            .unwrap();
        assert_eq!(material.status(), MaterialStatus::Failed);
        assert_eq!(material.usable_text(), None);
    }

    #[tokio::test]
    async fn rejects_unknown_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let path = write_file(dir.path(), "image.png", "png");

        let err = svc
            .register(UserId::new(), Upload::from_path(&path))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MaterialServiceError::Material(MaterialError::UnsupportedMediaType(_))
        ));

        let err = svc
            .register(
                UserId::new(),
                Upload::from_path(&path).with_mime_type("image/png"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MaterialServiceError::Material(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let path = dir.path().join("big.txt");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let err = svc
            .register(UserId::new(), Upload::from_path(&path))
            .await
            .unwrap_err();
        assert!(matches!(err, MaterialServiceError::TooLarge { .. }));
    }

    /// Delegates to memory but fails the chosen write.
    struct FailingWrites {
        inner: InMemoryRepository,
        fail_insert: bool,
        fail_update: bool,
    }

    #[async_trait::async_trait]
    impl MaterialRepository for FailingWrites {
        async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
            if self.fail_insert {
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.insert_material(material).await
        }

        async fn update_material(&self, material: &Material) -> Result<(), StorageError> {
            if self.fail_update {
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.update_material(material).await
        }

        async fn get_material(&self, id: MaterialId) -> Result<Option<Material>, StorageError> {
            self.inner.get_material(id).await
        }

        async fn list_materials(&self, user_id: UserId) -> Result<Vec<Material>, StorageError> {
            self.inner.list_materials(user_id).await
        }

        async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError> {
            self.inner.delete_material(id).await
        }
    }

    fn failing_service(dir: &Path, fail_insert: bool, fail_update: bool) -> MaterialService {
        MaterialService::new(
            Clock::fixed(fixed_now()),
            dir.join("uploads"),
            Arc::new(FailingWrites {
                inner: InMemoryRepository::new(),
                fail_insert,
                fail_update,
            }),
            Arc::new(FileTextExtractor),
        )
    }

    fn stored_files(dir: &Path) -> usize {
        std::fs::read_dir(dir.join("uploads")).map_or(0, |entries| entries.count())
    }

    #[tokio::test]
    async fn invalid_upload_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let path = write_file(dir.path(), "notes.txt", "notes");
        let upload = Upload {
            source_path: path,
            original_name: "   ".into(),
            mime_type: Some("text/plain".into()),
        };

        let err = svc.register(UserId::new(), upload).await.unwrap_err();
        assert!(matches!(
            err,
            MaterialServiceError::Material(MaterialError::EmptyName)
        ));
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_copied_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = failing_service(dir.path(), true, false);
        let path = write_file(dir.path(), "notes.txt", "notes");

        let err = svc
            .register(UserId::new(), Upload::from_path(&path))
            .await
            .unwrap_err();
        assert!(matches!(err, MaterialServiceError::Storage(_)));
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_status_update_discards_material() {
        let dir = tempfile::tempdir().unwrap();
        let svc = failing_service(dir.path(), false, true);
        let me = UserId::new();
        let path = write_file(dir.path(), "notes.txt", "notes");

        let err = svc.register(me, Upload::from_path(&path)).await.unwrap_err();
        assert!(matches!(err, MaterialServiceError::Storage(_)));
        assert_eq!(stored_files(dir.path()), 0);
        assert!(svc.list(me).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_see_or_delete() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let owner = UserId::new();
        let path = write_file(dir.path(), "notes.txt", "notes");
        let material = svc.register(owner, Upload::from_path(&path)).await.unwrap();

        let stranger = UserId::new();
        assert!(matches!(
            svc.get(stranger, material.id()).await,
            Err(MaterialServiceError::NotFound)
        ));
        assert!(matches!(
            svc.delete(stranger, material.id()).await,
            Err(MaterialServiceError::NotFound)
        ));

        svc.delete(owner, material.id()).await.unwrap();
        assert!(!Path::new(material.file_path()).exists());
        assert!(svc.list(owner).await.unwrap().is_empty());
    }
}
