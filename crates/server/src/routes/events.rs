//! SSE stream of catalog change events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// GET /api/events — emits one `catalog` event per committed catalog change.
pub async fn sse_events(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|event| {
        event
            .ok()
            .and_then(|event| Event::default().event("catalog").json_data(&event).ok())
            .map(Ok::<Event, Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
