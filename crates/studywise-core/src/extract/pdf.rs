use crate::error::ExtractError;

/// Parse on a blocking thread; the parser is CPU-bound and can panic on
/// malformed input, which surfaces here as a join error.
pub(super) async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Pdf(format!("parser aborted: {e}")))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}
