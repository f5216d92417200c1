//! Live event stream
//!
//! Server-sent events fed by the snapshot feed. Clients re-fetch the view
//! on each `snapshot` event instead of diffing payloads; the stream only
//! signals that something changed.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::services::FeedEvent;
use crate::AppState;

/// GET /api/v1/events
pub async fn subscribe(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|msg| async move {
        // A lagged receiver drops ticks; the client catches up on the next
        // event.
        let event = msg.ok()?;
        let name = match &event {
            FeedEvent::Snapshot { .. } => "snapshot",
            FeedEvent::PollFailed { .. } => "poll_failed",
        };
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(name).data(data)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
