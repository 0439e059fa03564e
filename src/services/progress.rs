use crate::models::{ON_UPLOAD_EVENT, ProgressEvent};
use crate::services::notifier::ProgressNotifier;
use crate::services::throttle::ThrottleGate;
use bytes::Bytes;
use futures::{Stream, ready};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::Instant;

/// Per-request progress state. Only [`ProgressStream`] mutates it.
#[derive(Debug)]
pub struct UploadSession {
    subscriber_id: Option<String>,
    gate: ThrottleGate,
    last_emit: Instant,
    bytes_processed: u64,
    total_bytes: u64,
}

impl UploadSession {
    pub fn new(subscriber_id: Option<String>, gate: ThrottleGate) -> Self {
        Self {
            subscriber_id,
            gate,
            last_emit: Instant::now(),
            bytes_processed: 0,
            total_bytes: 0,
        }
    }

    /// Resets the per-file counter; the throttle window carries over.
    pub fn begin_file(&mut self) {
        self.bytes_processed = 0;
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Pass-through stage that counts bytes and publishes throttled progress.
///
/// Chunks are forwarded untouched, one at a time, only when the consumer
/// polls, so a slow sink slows the producer down instead of buffering.
pub struct ProgressStream<'a, S> {
    inner: S,
    filename: String,
    session: &'a mut UploadSession,
    notifier: &'a dyn ProgressNotifier,
}

impl<'a, S> ProgressStream<'a, S> {
    pub fn new(
        inner: S,
        filename: impl Into<String>,
        session: &'a mut UploadSession,
        notifier: &'a dyn ProgressNotifier,
    ) -> Self {
        Self {
            inner,
            filename: filename.into(),
            session,
            notifier,
        }
    }

    fn observe(&mut self, len: usize) {
        let session = &mut *self.session;
        session.bytes_processed += len as u64;
        session.total_bytes += len as u64;

        if !session.gate.can_emit(session.last_emit) {
            return;
        }
        let Some(subscriber_id) = session.subscriber_id.as_deref() else {
            return;
        };

        let event = ProgressEvent {
            processed_already: session.bytes_processed,
            filename: self.filename.clone(),
        };
        if let Err(e) = self.notifier.publish(subscriber_id, ON_UPLOAD_EVENT, &event) {
            tracing::debug!(
                "Progress for {} not delivered to {}: {}",
                self.filename,
                subscriber_id,
                e
            );
        }
        session.last_emit = Instant::now();
    }
}

impl<S, E> Stream for ProgressStream<'_, S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));
        if let Some(Ok(chunk)) = &item {
            this.observe(chunk.len());
        }
        Poll::Ready(item)
    }
}
