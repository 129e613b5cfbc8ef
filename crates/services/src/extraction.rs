use std::path::Path;

use async_trait::async_trait;
use quiz_core::model::MediaType;

use crate::error::ExtractionError;

/// Turns a stored upload into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns `ExtractionError` if the file cannot be read or its media type
    /// has no extractor.
    async fn extract(&self, path: &Path, media_type: MediaType) -> Result<String, ExtractionError>;
}

/// Reads plain-text uploads from disk. PDF and DOCX are not supported.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path, media_type: MediaType) -> Result<String, ExtractionError> {
        match media_type {
            MediaType::PlainText => {
                let bytes = tokio::fs::read(path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            MediaType::Pdf | MediaType::Docx => Err(ExtractionError::UnsupportedMediaType(
                media_type.as_mime().to_string(),
            )),
        }
    }
}
