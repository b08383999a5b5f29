//! Document intake and plain-text extraction.
//!
//! Accepted types: PDF, legacy Word binary and Word XML, at most 5 MB.
//! PDF text comes from `pdf-extract`, page by page. Word documents are
//! decoded as (lossy) UTF-8, matching what the browser front end did.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::client::ClientError;

pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_WORD_BINARY: &str = "application/msword";
pub const MIME_WORD_XML: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    WordBinary,
    WordXml,
}

impl DocumentKind {
    pub fn from_mime(content_type: &str) -> Option<Self> {
        // Ignore parameters such as "; charset=binary"
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime.to_ascii_lowercase().as_str() {
            MIME_PDF => Some(DocumentKind::Pdf),
            MIME_WORD_BINARY => Some(DocumentKind::WordBinary),
            MIME_WORD_XML => Some(DocumentKind::WordXml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "doc" => Some(DocumentKind::WordBinary),
            "docx" => Some(DocumentKind::WordXml),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => MIME_PDF,
            DocumentKind::WordBinary => MIME_WORD_BINARY,
            DocumentKind::WordXml => MIME_WORD_XML,
        }
    }
}

/// A selected resume document that passed intake checks.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Validates type and size the moment a file is selected.
    pub fn new(
        name: impl Into<String>,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<Self, ClientError> {
        let kind = DocumentKind::from_mime(content_type).ok_or_else(|| {
            ClientError::Extraction("Please upload a PDF or Word document".to_string())
        })?;
        Self::with_kind(name.into(), kind, bytes)
    }

    /// Reads a file from disk, inferring its type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            ClientError::Extraction("Please upload a PDF or Word document".to_string())
        })?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ClientError::Extraction(format!("{}: {e}", path.display())))?;
        if metadata.len() > MAX_FILE_BYTES as u64 {
            return Err(oversize());
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Extraction(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::with_kind(name, kind, Bytes::from(bytes))
    }

    fn with_kind(name: String, kind: DocumentKind, bytes: Bytes) -> Result<Self, ClientError> {
        if bytes.len() > MAX_FILE_BYTES {
            return Err(oversize());
        }
        Ok(Self { name, kind, bytes })
    }
}

fn oversize() -> ClientError {
    ClientError::Extraction("File size must be less than 5MB".to_string())
}

/// Turns an uploaded document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file: &UploadedFile) -> Result<String, ClientError>;
}

/// Default extractor backed by `pdf-extract`.
pub struct DocumentExtractor;

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String, ClientError> {
        if file.bytes.len() > MAX_FILE_BYTES {
            return Err(oversize());
        }

        let text = match file.kind {
            DocumentKind::Pdf => {
                let bytes = file.bytes.clone();
                // PDF parsing is CPU-bound and may panic on hostile input.
                tokio::task::spawn_blocking(move || pdf_text(&bytes))
                    .await
                    .map_err(|e| {
                        warn!("PDF extraction task failed: {e}");
                        ClientError::Extraction(format!("PDF extraction error: {e}"))
                    })??
            }
            DocumentKind::WordBinary | DocumentKind::WordXml => word_text(&file.bytes),
        };

        debug!(
            "Extracted {} chars from {} ({})",
            text.chars().count(),
            file.name,
            file.kind.mime()
        );
        Ok(text)
    }
}

fn pdf_text(bytes: &[u8]) -> Result<String, ClientError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ClientError::Extraction(format!("PDF extraction error: {e}")))?;
    Ok(join_pages(&pages))
}

/// Collapses whitespace inside each page to single spaces and joins
/// non-empty pages in order with a single space.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|page| page.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(DocumentKind::from_mime("application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::from_mime("application/msword"),
            Some(DocumentKind::WordBinary)
        );
        assert_eq!(DocumentKind::from_mime(MIME_WORD_XML), Some(DocumentKind::WordXml));
        assert_eq!(
            DocumentKind::from_mime("Application/PDF; charset=binary"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_mime("text/plain"), None);
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(DocumentKind::from_path(Path::new("cv.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("cv.doc")), Some(DocumentKind::WordBinary));
        assert_eq!(DocumentKind::from_path(Path::new("cv.docx")), Some(DocumentKind::WordXml));
        assert_eq!(DocumentKind::from_path(Path::new("cv.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("cv")), None);
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let err = UploadedFile::new("cv.txt", "text/plain", Bytes::from_static(b"hi")).unwrap_err();
        assert!(matches!(err, ClientError::Extraction(_)));
    }

    #[test]
    fn test_oversize_file_is_rejected() {
        let bytes = Bytes::from(vec![0u8; MAX_FILE_BYTES + 1]);
        let err = UploadedFile::new("cv.pdf", MIME_PDF, bytes).unwrap_err();
        assert!(err.to_string().contains("5MB"));
    }

    #[test]
    fn test_file_at_limit_is_accepted() {
        let bytes = Bytes::from(vec![b'a'; MAX_FILE_BYTES]);
        let file = UploadedFile::new("cv.doc", MIME_WORD_BINARY, bytes).unwrap();
        assert_eq!(file.kind, DocumentKind::WordBinary);
    }

    #[test]
    fn test_join_pages_keeps_order_and_collapses_whitespace() {
        let pages = ["Jane  Doe\nRust\tEngineer", "  ", "Experience:\n\n  Acme "];
        assert_eq!(join_pages(&pages), "Jane Doe Rust Engineer Experience: Acme");
    }

    #[test]
    fn test_join_pages_empty_document() {
        let pages: [&str; 0] = [];
        assert_eq!(join_pages(&pages), "");
    }

    #[tokio::test]
    async fn test_word_document_decodes_text() {
        let file = UploadedFile::new(
            "cv.doc",
            MIME_WORD_BINARY,
            Bytes::from_static(b"Jane Doe\x00\x01 Rust\nEngineer"),
        )
        .unwrap();
        let text = DocumentExtractor.extract(&file).await.unwrap();
        assert_eq!(text, "Jane Doe Rust\nEngineer");
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_extraction_error() {
        let file = UploadedFile::new("cv.pdf", MIME_PDF, Bytes::from_static(b"not a pdf")).unwrap();
        let err = DocumentExtractor.extract(&file).await.unwrap_err();
        assert!(matches!(err, ClientError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_from_path_reads_file_and_infers_kind() {
        let mut tmp = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        tmp.write_all(b"resume body").unwrap();

        let file = UploadedFile::from_path(tmp.path()).await.unwrap();

        assert_eq!(file.kind, DocumentKind::WordXml);
        assert_eq!(&file.bytes[..], b"resume body");
        assert!(file.name.ends_with(".docx"));
    }

    #[tokio::test]
    async fn test_from_path_rejects_unknown_extension() {
        let tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = UploadedFile::from_path(tmp.path()).await.unwrap_err();
        assert!(matches!(err, ClientError::Extraction(_)));
    }
}
