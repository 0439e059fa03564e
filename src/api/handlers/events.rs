use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(rename = "socketId")]
    pub socket_id: Option<String>,
}

/// Server-sent progress events for one subscriber id.
pub async fn subscribe_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let socket_id = query
        .socket_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("socketId is required".to_string()))?;

    tracing::info!("🔌 Subscriber {} connected", socket_id);
    let mut rx = state.notifier.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(notification) if notification.subscriber_id == socket_id => {
                    match Event::default()
                        .event(&notification.event_name)
                        .json_data(&notification.payload)
                    {
                        Ok(event) => yield Ok::<_, Infallible>(event),
                        Err(e) => tracing::warn!("Dropping unserializable event: {}", e),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber {} lagged, {} events dropped", socket_id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
