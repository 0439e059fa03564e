use crate::models::{StoredFile, UploadSummary};
use crate::services::notifier::ProgressNotifier;
use crate::services::progress::{ProgressStream, UploadSession};
use crate::services::storage::{StorageError, StorageService};
use crate::services::throttle::ThrottleGate;
use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{StatusCode, request::Parts};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::io;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::io::StreamReader;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("malformed multipart request: {message}")]
    Parse { status: StatusCode, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    fn from_multipart(err: &MultipartError) -> Self {
        UploadError::Parse {
            status: err.status(),
            message: err.body_text(),
        }
    }

    /// Read failures caused by the multipart parser are parse errors, not sink errors.
    fn from_storage(err: StorageError) -> Self {
        let parse = match &err {
            StorageError::Read(e) => e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>())
                .map(Self::from_multipart),
            _ => None,
        };
        parse.unwrap_or(UploadError::Storage(err))
    }
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        Self::from_multipart(&err)
    }
}

impl From<MultipartRejection> for UploadError {
    fn from(rejection: MultipartRejection) -> Self {
        UploadError::Parse {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Drives one upload request: multipart fields flow through a
/// [`ProgressStream`] into the storage sink, one field at a time.
///
/// Lifecycle: idle until [`UploadPipeline::pipe`] starts receiving, each
/// file field is drained into the sink before the next is read, and the
/// completion callback fires only after the last field is flushed. Any
/// parser or sink error aborts the request without calling it.
pub struct UploadHandler {
    storage: Arc<dyn StorageService>,
    notifier: Arc<dyn ProgressNotifier>,
    gate: ThrottleGate,
    subscriber_id: Option<String>,
}

impl UploadHandler {
    pub fn new(
        storage: Arc<dyn StorageService>,
        notifier: Arc<dyn ProgressNotifier>,
        message_time_delay: Duration,
        subscriber_id: Option<String>,
    ) -> Self {
        Self {
            storage,
            notifier,
            gate: ThrottleGate::new(message_time_delay),
            subscriber_id,
        }
    }

    pub fn can_execute(&self, last_execution: Instant) -> bool {
        self.gate.can_emit(last_execution)
    }

    pub fn new_session(&self) -> UploadSession {
        UploadSession::new(self.subscriber_id.clone(), self.gate)
    }

    /// Binds the request head and the completion callback. The returned
    /// pipeline parses whatever body is piped into it.
    pub fn register_events<F>(&self, parts: Parts, on_finish: F) -> UploadPipeline<'_, F>
    where
        F: FnOnce() + Send,
    {
        UploadPipeline {
            handler: self,
            parts,
            on_finish,
        }
    }

    /// Streams one file field to disk, reporting progress along the way.
    /// Resolves once the sink has flushed the whole file.
    pub async fn on_file<S, E>(
        &self,
        session: &mut UploadSession,
        field_name: &str,
        file: S,
        filename: &str,
    ) -> Result<StoredFile, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        tracing::info!("📁 Receiving {} (field {})", filename, field_name);
        session.begin_file();

        let file = pin!(file);
        let progress = ProgressStream::new(file, filename, session, self.notifier.as_ref());
        let reader = StreamReader::new(progress.map_err(io::Error::other));

        let stored = self
            .storage
            .store_stream(filename, Box::new(reader))
            .await
            .map_err(UploadError::from_storage)?;

        tracing::info!(
            "✅ Stored {} ({} bytes) at {}",
            stored.filename,
            stored.size,
            stored.path.display()
        );
        Ok(stored)
    }

    async fn receive_fields(
        &self,
        multipart: &mut Multipart,
        session: &mut UploadSession,
    ) -> Result<Vec<StoredFile>, UploadError> {
        let mut stored = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            let Some(filename) = field.file_name().map(str::to_string) else {
                tracing::debug!("Skipping non-file field {}", field_name);
                continue;
            };

            stored.push(self.on_file(session, &field_name, field, &filename).await?);
        }

        Ok(stored)
    }
}

pub struct UploadPipeline<'h, F> {
    handler: &'h UploadHandler,
    parts: Parts,
    on_finish: F,
}

impl<F> UploadPipeline<'_, F>
where
    F: FnOnce() + Send,
{
    pub async fn pipe(self, body: Body) -> Result<UploadSummary, UploadError> {
        let request = Request::from_parts(self.parts, body);
        let mut multipart = Multipart::from_request(request, &()).await?;
        let mut session = self.handler.new_session();

        match self.handler.receive_fields(&mut multipart, &mut session).await {
            Ok(files) => {
                (self.on_finish)();
                Ok(UploadSummary {
                    files,
                    total_bytes: session.total_bytes(),
                })
            }
            Err(e) => {
                // Consume the rest of the body so the client sees our response instead of a reset
                tracing::warn!("Upload failed: {}. Consuming remaining stream...", e);
                while let Ok(Some(mut field)) = multipart.next_field().await {
                    while let Ok(Some(_)) = field.chunk().await {}
                }
                Err(e)
            }
        }
    }
}
