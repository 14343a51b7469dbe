//! SSE broadcaster for real-time client updates

use axum::{
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use swiftread_common::Signals;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

/// SSE event name carrying a signal bundle
const SIGNALS_EVENT: &str = "signals";

/// Manages client connections and distributes signal bundles in
/// submission order.
#[derive(Clone)]
pub struct SignalBroadcaster {
    tx: broadcast::Sender<Signals>,
}

impl SignalBroadcaster {
    /// Create a new broadcaster buffering up to `capacity` bundles
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast a signal bundle, ignoring if no clients are connected
    pub fn broadcast_lossy(&self, signals: Signals) {
        let _ = self.tx.send(signals);
    }

    /// Current number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe to the raw bundle stream (used by tests and diagnostics)
    pub fn subscribe(&self) -> broadcast::Receiver<Signals> {
        self.tx.subscribe()
    }

    /// Create an SSE stream for a new client connection
    pub fn subscribe_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx);

        stream.filter_map(|result| async move {
            match result {
                Ok(signals) => {
                    let event = Event::default()
                        .event(SIGNALS_EVENT)
                        .json_data(&signals)
                        .ok();
                    event.map(Ok)
                }
                Err(e) => {
                    // Lagged receiver; log and continue
                    warn!("SSE client error: {:?}", e);
                    None
                }
            }
        })
    }

    /// Axum SSE response for GET /events
    pub fn handle_sse_connection(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!("new SSE client connected, total clients: {}", self.client_count() + 1);

        Sse::new(self.subscribe_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscriber() {
        let broadcaster = SignalBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.client_count(), 1);

        broadcaster.broadcast_lossy(Signals::new().set("wpm", 300u64));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.get("wpm"), Some(&serde_json::Value::from(300u64)));
    }

    #[test]
    fn broadcast_without_clients_is_lossy() {
        let broadcaster = SignalBroadcaster::new(16);
        assert_eq!(broadcaster.client_count(), 0);
        broadcaster.broadcast_lossy(Signals::new().set("running", false));
    }
}
