use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use brief_core::{ErrorKind, ServiceError};
use thiserror::Error;

pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;
pub const FILE_TOO_LARGE_TITLE: &str = "File too large";
pub const FILE_TOO_LARGE_DESCRIPTION: &str = "Please select a file smaller than 10MB.";

#[derive(Debug, Error)]
/// Enumerates supported `IngestError` values.
pub enum IngestError {
    #[error("File too large: {file_name} is {size} bytes (limit {limit}). Please select a file smaller than 10MB.")]
    TooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooLarge { .. } | Self::NotAFile(_) => ErrorKind::Validation,
            Self::Read { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
                _ => ErrorKind::Unknown,
            },
        }
    }
}

impl From<IngestError> for ServiceError {
    fn from(error: IngestError) -> Self {
        ServiceError::new(error.kind(), error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A document accepted for analysis, held in memory for the run.
pub struct IngestedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IngestedDocument {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lossy UTF-8 text view of the content.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

pub fn mime_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reads documents from disk, enforcing the size limit before any read.
pub struct DocumentIngestor {
    max_bytes: u64,
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self {
            max_bytes: MAX_DOCUMENT_BYTES,
        }
    }
}

impl DocumentIngestor {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn ingest(&self, path: &Path) -> Result<IngestedDocument, IngestError> {
        let read_error = |source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        if !metadata.is_file() {
            return Err(IngestError::NotAFile(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if metadata.len() > self.max_bytes {
            return Err(IngestError::TooLarge {
                file_name,
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let mime_type = mime_type_for(&file_name);
        if mime_type == "application/octet-stream" {
            tracing::warn!(
                file = file_name.as_str(),
                "unrecognised document type; expected .pdf, .docx or .txt"
            );
        }
        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        tracing::debug!(file = file_name.as_str(), bytes = bytes.len(), "document ingested");
        Ok(IngestedDocument::new(file_name, mime_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use brief_core::ErrorKind;
    use tempfile::tempdir;

    use super::{
        mime_type_for, DocumentIngestor, IngestError, IngestedDocument, MAX_DOCUMENT_BYTES,
    };

    #[test]
    fn unit_mime_types_follow_accepted_extensions() {
        assert_eq!(mime_type_for("complaint.PDF"), "application/pdf");
        assert_eq!(mime_type_for("notes.txt"), "text/plain");
        assert!(mime_type_for("reply.docx").contains("wordprocessingml"));
        assert_eq!(mime_type_for("archive.zip"), "application/octet-stream");
        assert_eq!(mime_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn unit_data_uri_and_text_views() {
        let document = IngestedDocument::new("a.txt", "text/plain", b"hello".to_vec());
        assert_eq!(document.data_uri(), "data:text/plain;base64,aGVsbG8=");
        assert_eq!(document.text(), "hello");
        assert_eq!(document.size(), 5);
    }

    #[tokio::test]
    async fn functional_ingests_file_within_limit() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Meeting notes").expect("write");

        let document = DocumentIngestor::default()
            .ingest(&path)
            .await
            .expect("ingest");
        assert_eq!(document.file_name, "notes.txt");
        assert_eq!(document.mime_type, "text/plain");
        assert_eq!(document.text(), "Meeting notes");
    }

    #[tokio::test]
    async fn regression_rejects_files_over_ten_mebibytes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("huge.pdf");
        let file = std::fs::File::create(&path).expect("create");
        file.set_len(MAX_DOCUMENT_BYTES + 1).expect("set len");

        let error = DocumentIngestor::default()
            .ingest(&path)
            .await
            .expect_err("oversized file must fail");
        assert!(matches!(
            error,
            IngestError::TooLarge {
                size,
                limit: MAX_DOCUMENT_BYTES,
                ..
            } if size == MAX_DOCUMENT_BYTES + 1
        ));
        assert!(error.to_string().starts_with("File too large"));
        assert!(error
            .to_string()
            .ends_with("Please select a file smaller than 10MB."));
    }

    #[tokio::test]
    async fn regression_exactly_ten_mebibytes_is_accepted() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("edge.txt");
        let file = std::fs::File::create(&path).expect("create");
        file.set_len(MAX_DOCUMENT_BYTES).expect("set len");

        let document = DocumentIngestor::default()
            .ingest(&path)
            .await
            .expect("limit is inclusive");
        assert_eq!(document.size(), MAX_DOCUMENT_BYTES);
    }

    #[tokio::test]
    async fn unit_missing_file_and_directory_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let missing = DocumentIngestor::default()
            .ingest(&dir.path().join("missing.txt"))
            .await
            .expect_err("missing file");
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let directory = DocumentIngestor::default()
            .ingest(dir.path())
            .await
            .expect_err("directory");
        assert!(matches!(directory, IngestError::NotAFile(_)));
    }
}
