use crate::models::ProgressEvent;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no subscriber is listening")]
    NoListeners,

    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Side channel progress events are published to.
///
/// Publishing is fire-and-forget: implementations must not block and
/// callers treat every error as non-fatal.
pub trait ProgressNotifier: Send + Sync {
    fn publish(
        &self,
        subscriber_id: &str,
        event_name: &str,
        payload: &ProgressEvent,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subscriber_id: String,
    pub event_name: String,
    pub payload: ProgressEvent,
}

/// In-process fan-out over a tokio broadcast channel.
///
/// Every receiver sees every notification; consumers filter on
/// `subscriber_id`. Slow receivers lag and drop old events instead of
/// stalling uploads.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ProgressNotifier for BroadcastNotifier {
    fn publish(
        &self,
        subscriber_id: &str,
        event_name: &str,
        payload: &ProgressEvent,
    ) -> Result<(), NotifyError> {
        self.sender
            .send(Notification {
                subscriber_id: subscriber_id.to_string(),
                event_name: event_name.to_string(),
                payload: payload.clone(),
            })
            .map(|_| ())
            .map_err(|_| NotifyError::NoListeners)
    }
}
