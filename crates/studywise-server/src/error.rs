use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use studywise_core::{DatabaseError, ExtractError, GenerativeError};
use thiserror::Error;

/// Error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler errors, mapped to a status code and an [`ErrorBody`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded.")]
    NoFile,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Generative(#[from] GenerativeError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::NoFile | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Extract(ExtractError::Io(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read uploaded file: {e}"),
            ),
            Self::Extract(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Generative(GenerativeError::MissingCredential) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error: Gemini API Key missing.".to_string(),
            ),
            Self::Generative(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process document and generate AI content: {e}"),
            ),
            Self::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Multipart(e) => (e.status(), e.body_text()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(%status, %error, "Request failed");
        } else {
            tracing::warn!(%status, %error, "Request rejected");
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_bad_requests() {
        let (status, msg) = ApiError::NoFile.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "No file uploaded.");

        let (status, _) = ApiError::from(ExtractError::Empty).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = ApiError::from(ExtractError::Docx("bad zip".into())).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let (status, msg) =
            ApiError::from(GenerativeError::MissingCredential).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Server configuration error: Gemini API Key missing.");
    }
}
