pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::notifier::BroadcastNotifier;
use crate::services::storage::{LocalStorageService, StorageService};
use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn, routing::get};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub notifier: Arc<BroadcastNotifier>,
    pub config: UploadConfig,
}

impl AppState {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            storage: Arc::new(LocalStorageService::new(config.downloads_dir.clone())),
            notifier: Arc::new(BroadcastNotifier::default()),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            get(api::handlers::events::subscribe_events)
                .head(api::handlers::files::dispatch)
                .fallback(api::handlers::files::dispatch),
        )
        .fallback(api::handlers::files::dispatch)
        .layer(from_fn(api::middleware::cors::allow_any_origin))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .with_state(state)
}
