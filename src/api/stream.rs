//! Server-Sent Events feed of tick snapshots for rendering surfaces.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

use crate::controller::AppState;

pub async fn stream_snapshots(
    State(st): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = st.controller.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        let event = match receiver.recv().await {
            Ok(snapshot) => Event::default()
                .event("snapshot")
                .id(snapshot.tick.to_string())
                .json_data(&snapshot)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            // Slow client; tell it how many snapshots it missed and carry on.
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "snapshot stream lagged");
                Event::default().event("lagged").data(skipped.to_string())
            }
            Err(RecvError::Closed) => return None,
        };
        Some((Ok(event), receiver))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
