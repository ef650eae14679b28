use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::request::RequestError;
use crate::transcript::{CaptionError, TranscriptUnavailable};

/// Outward error categories of the `/transcript` endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no transcript available: {0}")]
    NoTranscript(String),
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TranscriptUnavailable> for ApiError {
    fn from(err: TranscriptUnavailable) -> Self {
        let detail = err.to_string();
        if err.0.is_transport() {
            return ApiError::Internal(detail);
        }
        match err.0 {
            CaptionError::VideoUnavailable(_) => ApiError::VideoUnavailable(detail),
            _ => ApiError::NoTranscript(detail),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::InvalidBody(_) | RequestError::InvalidTtl(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::InvalidInput(_) => (
                StatusCode::BAD_REQUEST,
                "Missing or invalid YouTube URL/video ID",
                "Please provide a valid YouTube URL or video ID".to_string(),
            ),
            ApiError::NoTranscript(_) => (
                StatusCode::NOT_FOUND,
                "No transcript available",
                "This video doesn't have a transcript available or subtitles are disabled"
                    .to_string(),
            ),
            ApiError::VideoUnavailable(_) => (
                StatusCode::NOT_FOUND,
                "Video unavailable",
                "The video is private, deleted, or doesn't exist".to_string(),
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", message)
            }
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": error,
                "message": message,
            })),
        )
            .into_response()
    }
}
