//! Turning uploaded documents into plain text.
//!
//! The kind is decided from the declared MIME type before any parsing
//! happens, so unsupported uploads never reach a parser.

mod docx;
mod pdf;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Classify by MIME type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            MIME_TEXT => Ok(Self::PlainText),
            MIME_PDF => Ok(Self::Pdf),
            MIME_DOCX => Ok(Self::Docx),
            _ => Err(ExtractError::UnsupportedType(mime.to_string())),
        }
    }

    /// Guess from a file extension. Markdown is treated as plain text.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") | Some("md") => Ok(Self::PlainText),
            Some("pdf") => Ok(Self::Pdf),
            Some("docx") => Ok(Self::Docx),
            _ => Err(ExtractError::UnsupportedType(path.display().to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::PlainText => MIME_TEXT,
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Extract plain text from `bytes`.
///
/// # Errors
///
/// Parser failures map to [`ExtractError::Pdf`] / [`ExtractError::Docx`];
/// a document with nothing but whitespace is [`ExtractError::Empty`].
pub async fn extract(kind: DocumentKind, bytes: Vec<u8>) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Pdf => pdf::extract_text(bytes).await?,
        DocumentKind::Docx => docx::extract_text(&bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    tracing::debug!(%kind, chars = text.len(), "Extracted document text");
    Ok(text)
}

/// Read a file from disk and extract its text, guessing the kind from its extension.
pub async fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_path(path)?;
    let bytes = tokio::fs::read(path).await?;
    extract(kind, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_classification() {
        assert_eq!(DocumentKind::from_mime("text/plain").unwrap(), DocumentKind::PlainText);
        assert_eq!(
            DocumentKind::from_mime("text/plain; charset=utf-8").unwrap(),
            DocumentKind::PlainText
        );
        assert_eq!(DocumentKind::from_mime("application/pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_mime(MIME_DOCX).unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn unsupported_mime_names_the_type() {
        let err = DocumentKind::from_mime("image/png").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(_)));
        assert_eq!(
            err.to_string(),
            "Unsupported file type: image/png. \
             Only .txt, .pdf, and .docx are currently recognized for processing."
        );
    }

    #[test]
    fn path_classification() {
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.md")).unwrap(),
            DocumentKind::PlainText
        );
        assert_eq!(DocumentKind::from_path(Path::new("a/b.PDF")).unwrap(), DocumentKind::Pdf);
        assert!(DocumentKind::from_path(Path::new("slides.pptx")).is_err());
        assert!(DocumentKind::from_path(Path::new("README")).is_err());
    }

    #[tokio::test]
    async fn plain_text_is_decoded_lossily() {
        let text = extract(DocumentKind::PlainText, b"cells \xF0\x28 divide".to_vec())
            .await
            .unwrap();
        assert!(text.starts_with("cells "));
        assert!(text.ends_with(" divide"));
    }

    #[tokio::test]
    async fn whitespace_only_is_empty() {
        let err = extract(DocumentKind::PlainText, b"  \n\t ".to_vec()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Empty));
    }

    #[tokio::test]
    async fn extract_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Mitochondria are the powerhouse of the cell.").unwrap();
        let text = extract_file(&path).await.unwrap();
        assert!(text.contains("Mitochondria"));
    }
}
