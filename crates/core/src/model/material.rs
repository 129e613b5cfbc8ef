use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{MaterialId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material name cannot be empty")]
    EmptyName,

    #[error("material file path cannot be empty")]
    EmptyPath,

    #[error("unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("invalid material status: {0}")]
    InvalidStatus(String),
}

//
// ─── MEDIA TYPE ────────────────────────────────────────────────────────────────
//

/// Declared media types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    PlainText,
    Pdf,
    Docx,
}

impl MediaType {
    /// Parse a declared MIME type, rejecting anything outside the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError::UnsupportedMediaType` for any other type.
    pub fn parse(mime: &str) -> Result<Self, MaterialError> {
        match mime.trim() {
            "text/plain" => Ok(Self::PlainText),
            "application/pdf" => Ok(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(Self::Docx)
            }
            other => Err(MaterialError::UnsupportedMediaType(other.to_string())),
        }
    }

    /// Best-effort guess from a file extension, used when no type is declared.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::PlainText => "text/plain",
            MediaType::Pdf => "application/pdf",
            MediaType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

impl Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_mime())
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    Processing,
    Processed,
    Failed,
}

impl MaterialStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Processing => "processing",
            MaterialStatus::Processed => "processed",
            MaterialStatus::Failed => "failed",
        }
    }
}

impl FromStr for MaterialStatus {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => Err(MaterialError::InvalidStatus(other.to_string())),
        }
    }
}

//
// ─── MATERIAL ──────────────────────────────────────────────────────────────────
//

/// Upload metadata before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialDraft {
    pub user_id: UserId,
    pub name: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub media_type: MediaType,
}

impl MaterialDraft {
    /// Validate the draft into a material awaiting extraction.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the name or path is blank.
    pub fn validate(
        self,
        id: MaterialId,
        created_at: DateTime<Utc>,
    ) -> Result<Material, MaterialError> {
        if self.name.trim().is_empty() || self.original_name.trim().is_empty() {
            return Err(MaterialError::EmptyName);
        }
        if self.file_path.trim().is_empty() {
            return Err(MaterialError::EmptyPath);
        }

        Ok(Material {
            id,
            user_id: self.user_id,
            name: self.name,
            original_name: self.original_name,
            file_path: self.file_path,
            file_size: self.file_size,
            media_type: self.media_type,
            status: MaterialStatus::Processing,
            extracted_text: None,
            created_at,
        })
    }
}

/// An uploaded document and, once processed, its extracted plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    id: MaterialId,
    user_id: UserId,
    name: String,
    original_name: String,
    file_path: String,
    file_size: u64,
    #[serde(rename = "mimeType")]
    media_type: MediaType,
    status: MaterialStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_text: Option<String>,
    created_at: DateTime<Utc>,
}

impl Material {
    /// Rehydrate a material from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if the stored metadata no longer validates.
    pub fn from_persisted(
        id: MaterialId,
        draft: MaterialDraft,
        status: MaterialStatus,
        extracted_text: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MaterialError> {
        let mut material = draft.validate(id, created_at)?;
        material.status = status;
        material.extracted_text = extracted_text;
        Ok(material)
    }

    pub fn mark_processed(&mut self, text: String) {
        self.status = MaterialStatus::Processed;
        self.extracted_text = Some(text);
    }

    pub fn mark_failed(&mut self) {
        self.status = MaterialStatus::Failed;
        self.extracted_text = None;
    }

    /// Extracted text, only when processing succeeded and produced something.
    #[must_use]
    pub fn usable_text(&self) -> Option<&str> {
        match self.status {
            MaterialStatus::Processed => self
                .extracted_text
                .as_deref()
                .filter(|t| !t.trim().is_empty()),
            MaterialStatus::Processing | MaterialStatus::Failed => None,
        }
    }

    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    #[must_use]
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    #[must_use]
    pub fn status(&self) -> MaterialStatus {
        self.status
    }

    #[must_use]
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Human-readable size, e.g. `1.5 KB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> MaterialDraft {
        MaterialDraft {
            user_id: UserId::new(),
            name: "upload-1".into(),
            original_name: "vocab.txt".into(),
            file_path: "uploads/upload-1".into(),
            file_size: 2048,
            media_type: MediaType::PlainText,
        }
    }

    #[test]
    fn new_material_is_processing_without_text() {
        let m = draft().validate(MaterialId::new(), fixed_now()).unwrap();
        assert_eq!(m.status(), MaterialStatus::Processing);
        assert!(m.usable_text().is_none());
    }

    #[test]
    fn processed_material_exposes_text() {
        let mut m = draft().validate(MaterialId::new(), fixed_now()).unwrap();
        m.mark_processed("assist, aid, help".into());
        assert_eq!(m.usable_text(), Some("assist, aid, help"));
    }

    #[test]
    fn blank_extracted_text_is_not_usable() {
        let mut m = draft().validate(MaterialId::new(), fixed_now()).unwrap();
        m.mark_processed("  \n ".into());
        assert_eq!(m.status(), MaterialStatus::Processed);
        assert!(m.usable_text().is_none());
    }

    #[test]
    fn failed_material_drops_text() {
        let mut m = draft().validate(MaterialId::new(), fixed_now()).unwrap();
        m.mark_failed();
        assert_eq!(m.status(), MaterialStatus::Failed);
        assert!(m.extracted_text().is_none());
    }

    #[test]
    fn media_type_allow_list() {
        assert_eq!(MediaType::parse("text/plain").unwrap(), MediaType::PlainText);
        assert_eq!(MediaType::parse("application/pdf").unwrap(), MediaType::Pdf);
        assert!(matches!(
            MediaType::parse("image/png"),
            Err(MaterialError::UnsupportedMediaType(_))
        ));
        assert_eq!(MediaType::from_extension("DOCX"), Some(MediaType::Docx));
        assert_eq!(MediaType::from_extension("exe"), None);
    }

    #[test]
    fn formats_sizes_like_the_upload_list() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn rejects_blank_name() {
        let mut d = draft();
        d.original_name = " ".into();
        assert_eq!(
            d.validate(MaterialId::new(), fixed_now()).unwrap_err(),
            MaterialError::EmptyName
        );
    }
}
