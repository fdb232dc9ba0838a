//! Spooling the multipart `document` field to a temporary file.

use std::path::Path;

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use studywise_core::{extract, DocumentKind};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;

/// Name of the form field carrying the file.
pub const DOCUMENT_FIELD: &str = "document";

/// An uploaded file on disk. The file is deleted when this is dropped.
pub struct Upload {
    file: NamedTempFile,
    mime: String,
}

impl Upload {
    /// Pull the `document` field out of the form, skipping any others.
    pub async fn receive(
        multipart: Result<Multipart, MultipartRejection>,
        dir: &Path,
    ) -> Result<Self, ApiError> {
        let mut multipart = multipart.map_err(|e| {
            tracing::debug!(error = %e, "Request was not a multipart form");
            ApiError::NoFile
        })?;

        while let Some(mut field) = multipart.next_field().await? {
            if field.name() != Some(DOCUMENT_FIELD) {
                continue;
            }

            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();

            let file = NamedTempFile::new_in(dir).map_err(store_failed)?;
            let mut out = tokio::fs::File::from_std(file.reopen().map_err(store_failed)?);

            let mut size = 0u64;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len() as u64;
                out.write_all(&chunk).await.map_err(store_failed)?;
            }
            out.flush().await.map_err(store_failed)?;

            tracing::info!(
                %file_name,
                %mime,
                size,
                path = %file.path().display(),
                "Received upload"
            );
            return Ok(Self { file, mime });
        }

        Err(ApiError::NoFile)
    }

    /// Classify by the declared MIME type, then extract.
    pub async fn text(&self) -> Result<String, ApiError> {
        let kind = DocumentKind::from_mime(&self.mime)?;
        let bytes = tokio::fs::read(self.file.path())
            .await
            .map_err(studywise_core::ExtractError::from)?;
        Ok(extract(kind, bytes).await?)
    }
}

impl Drop for Upload {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "Removing temporary upload");
    }
}

fn store_failed(e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("Failed to store upload: {e}"))
}
