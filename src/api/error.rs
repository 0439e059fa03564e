use crate::services::file_lister::ListError;
use crate::services::storage::StorageError;
use crate::services::upload_handler::UploadError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Listing failed: {0}")]
    List(#[from] ListError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upload(UploadError::Parse { status, message }) => (status, message),
            AppError::Upload(UploadError::Storage(e)) => match e {
                StorageError::InvalidFilename(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                StorageError::Read(e) => (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload body: {}", e),
                ),
                e @ StorageError::Write { .. } => {
                    tracing::error!("Storage error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
            },
            AppError::List(e) => {
                tracing::error!("List error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to list uploaded files".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_write_error_is_internal() {
        let err = AppError::from(UploadError::Storage(StorageError::Write {
            path: PathBuf::from("/downloads/a.txt"),
            source: io::Error::new(io::ErrorKind::StorageFull, "disk full"),
        }));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_error_keeps_parser_status() {
        let err = AppError::from(UploadError::Parse {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_list_error_is_not_an_empty_list() {
        let err = AppError::from(ListError {
            path: PathBuf::from("/missing"),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
