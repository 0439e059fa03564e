use crate::AppState;
use crate::api::error::AppError;
use crate::models::{FileRecord, UploadResponse};
use crate::services::file_lister::get_files_status;
use crate::services::upload_handler::UploadHandler;
use axum::{
    Json,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "socketId")]
    pub socket_id: Option<String>,
}

/// Every request lands on exactly one of these, chosen by method alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    List,
    Upload,
    Preflight,
    Unknown,
}

impl Route {
    pub fn from_method(method: &Method) -> Self {
        let method = method.as_str();
        if method.eq_ignore_ascii_case("GET") {
            Route::List
        } else if method.eq_ignore_ascii_case("POST") {
            Route::Upload
        } else if method.eq_ignore_ascii_case("OPTIONS") {
            Route::Preflight
        } else {
            Route::Unknown
        }
    }
}

pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    match Route::from_method(request.method()) {
        Route::List => list_files(&state).await.into_response(),
        Route::Upload => upload_files(&state, request).await.into_response(),
        Route::Preflight => StatusCode::NO_CONTENT.into_response(),
        Route::Unknown => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn list_files(state: &AppState) -> Result<Json<Vec<FileRecord>>, AppError> {
    let files = get_files_status(&state.config.downloads_dir).await?;
    Ok(Json(files))
}

pub async fn upload_files(
    state: &AppState,
    request: Request,
) -> Result<Json<UploadResponse>, AppError> {
    let subscriber_id = Query::<UploadQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.socket_id);

    if subscriber_id.is_none() {
        tracing::debug!("Upload without socketId, progress will not be published");
    }

    let handler = UploadHandler::new(
        state.storage.clone(),
        state.notifier.clone(),
        state.config.message_time_delay,
        subscriber_id,
    );

    let (parts, body) = request.into_parts();
    let summary = handler
        .register_events(parts, || tracing::info!("🏁 All upload fields processed"))
        .pipe(body)
        .await?;

    tracing::info!(
        "📦 Upload finished: {} file(s), {} bytes",
        summary.files.len(),
        summary.total_bytes
    );

    Ok(Json(UploadResponse::success()))
}
