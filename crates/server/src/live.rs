// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live session streaming for participant and operator UIs.
//!
//! Every committed transition is published to a broadcast channel; each
//! WebSocket connection subscribes to it and forwards only the events of
//! the session it was opened for.
//!
//! # Architecture
//!
//! - Events are informational only and never authoritative
//! - No commands are executed over WebSocket connections
//! - A connection starts with a `session_updated` snapshot so clients do
//!   not need a separate fetch
//! - Slow clients may miss events; the next `session_updated` carries the
//!   full state again

use axum::{
    extract::{
        Path, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use shift_bid_api::{EventSink, SessionEvent, SessionSummary};
use shift_bid_domain::SessionId;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::{AppState, HttpError};

/// Maximum number of events to buffer in the broadcast channel.
/// If clients cannot keep up, older events will be dropped.
const EVENT_BUFFER_SIZE: usize = 256;

/// Fans session events out to connected clients.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<SessionEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Subscribes to every future event.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LiveEventBroadcaster {
    /// Never blocks; with no subscribers the event is dropped.
    fn publish(&self, event: SessionEvent) {
        let session_id: u64 = event.session_id();
        match self.tx.send(event) {
            Ok(receivers) => debug!(session_id, receivers, "Broadcast session event"),
            Err(_) => debug!(session_id, "No receivers for session event"),
        }
    }
}

/// Handles WebSocket upgrade requests for one session's event stream.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `app_state` - Application state holding the service and broadcaster
/// * `id` - The session to follow
///
/// # Errors
///
/// Returns 404 if the session does not exist.
pub async fn live_session_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, HttpError> {
    let id: SessionId = SessionId::new(id);
    // Subscribe before the snapshot so nothing falls between the two
    let rx: broadcast::Receiver<SessionEvent> = app_state.broadcaster.subscribe();
    let snapshot: SessionSummary = app_state.service.get_summary(id).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, id, snapshot, rx)))
}

/// Streams one session's events until the client goes away.
async fn handle_socket(
    socket: WebSocket,
    id: SessionId,
    snapshot: SessionSummary,
    mut rx: broadcast::Receiver<SessionEvent>,
) {
    info!(session_id = %id, "Client connected to live session stream");

    let (mut sender, mut receiver) = socket.split();

    let initial: SessionEvent = SessionEvent::SessionUpdated {
        session_id: id.value(),
        summary: Box::new(snapshot),
    };
    if let Ok(json) = serde_json::to_string(&initial)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!(session_id = %id, "Failed to send initial snapshot");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.session_id() == id.value() => {
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(?e, "Failed to serialize session event"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %id, skipped, "Live client lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!(session_id = %id, "Client disconnected from live session stream");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn window_opened(session_id: u64) -> SessionEvent {
        SessionEvent::BidWindowOpened {
            session_id,
            participant: String::from("P0"),
            window_end: String::from("2026-03-02T08:30:00Z"),
        }
    }

    #[test]
    fn test_publish_without_receivers() {
        let broadcaster: LiveEventBroadcaster = LiveEventBroadcaster::new();

        broadcaster.publish(window_opened(1));

        assert_eq!(broadcaster.tx.receiver_count(), 0);
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let broadcaster: LiveEventBroadcaster = LiveEventBroadcaster::new();
        let mut rx1: broadcast::Receiver<SessionEvent> = broadcaster.subscribe();
        let mut rx2: broadcast::Receiver<SessionEvent> = broadcaster.subscribe();

        broadcaster.publish(window_opened(7));

        assert_eq!(rx1.try_recv().unwrap(), window_opened(7));
        assert_eq!(rx2.try_recv().unwrap().session_id(), 7);
    }

    #[test]
    fn test_event_wire_format() {
        let json: String = serde_json::to_string(&SessionEvent::MovedToBack {
            session_id: 3,
            participant: String::from("P4"),
            attempts: 2,
        })
        .unwrap();

        assert_eq!(
            json,
            r#"{"type":"moved_to_back","session_id":3,"participant":"P4","attempts":2}"#
        );
    }
}
